use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use caaos_runtime::prelude::*;

use crate::{error::SupervisorError, ids::InstanceIds};

/// How long a killed task may take to report its exit before it is deleted anyway.
///
/// Longer than the runtime's own SIGTERM grace so a graceful stop is never cut short.
const STOP_TIMEOUT: Duration = Duration::from_secs(15);

/// Runs one workload to completion.
#[async_trait]
pub trait Supervise: Send + Sync {
    /// Returns the workload's exit code; a non-zero code is a normal outcome.
    async fn run(
        &self,
        ctx: &CancellationToken,
        reference: &str,
        argv: Vec<String>,
    ) -> Result<u32, SupervisorError>;
}

/// Drives a single container through pull, create, start, wait and cleanup.
///
/// Whatever gets created is released on every exit path: the task is deleted once it exists,
/// and the container together with its snapshot once the container exists. Cleanup failures
/// are logged only, the run's outcome is already decided by then.
pub struct ContainerSupervisor<R> {
    runtime: R,
    ids: InstanceIds,
}

impl<R: ContainerRuntime> ContainerSupervisor<R> {
    pub fn new(runtime: R) -> Self {
        Self {
            runtime,
            ids: InstanceIds::new(),
        }
    }
}

#[async_trait]
impl<R: ContainerRuntime> Supervise for ContainerSupervisor<R> {
    #[instrument(level = "info", skip(self, ctx, argv), fields(id = tracing::field::Empty))]
    async fn run(
        &self,
        ctx: &CancellationToken,
        reference: &str,
        argv: Vec<String>,
    ) -> Result<u32, SupervisorError> {
        info!("pulling image");
        let image = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Err(SupervisorError::Cancelled),
            res = self.runtime.pull(reference) => res.map_err(SupervisorError::Pull)?,
        };

        let id = self.ids.next_id();
        tracing::Span::current().record("id", id.as_str());
        let spec = ContainerSpec::workload(argv);

        info!(args = ?spec.args, "creating container");
        let container = self
            .runtime
            .create_container(&id, &image, &spec)
            .await
            .map_err(SupervisorError::Create)?;

        let outcome = drive_container(ctx, &container).await;

        debug!(container = container.id(), "deleting container");
        if let Err(e) = container.delete(ContainerCleanup::default()).await {
            warn!(error = %e, "container cleanup failed");
        }
        outcome
    }
}

async fn drive_container<C: Container>(
    ctx: &CancellationToken,
    container: &C,
) -> Result<u32, SupervisorError> {
    debug!("creating task");
    let mut task = container
        .new_task()
        .await
        .map_err(SupervisorError::Task)?;

    let outcome = drive_task(ctx, &mut task).await;

    debug!("deleting task");
    if let Err(e) = task.delete().await {
        warn!(error = %e, "task cleanup failed");
    }
    outcome
}

async fn drive_task<T: Task>(ctx: &CancellationToken, task: &mut T) -> Result<u32, SupervisorError> {
    // Subscribe first: a workload may exit before start() returns.
    let waiter = task.wait().await.map_err(SupervisorError::Wait)?;

    info!("starting task");
    task.start().await.map_err(SupervisorError::Start)?;

    info!(pid = ?task.pid(), "waiting for task exit");
    let exit = waiter.recv();
    tokio::pin!(exit);
    tokio::select! {
        res = &mut exit => {
            let exit = res.map_err(SupervisorError::Wait)?;
            info!(code = exit.code, exited_at = ?exit.exited_at, "task exited");
            Ok(exit.code)
        }
        _ = ctx.cancelled() => {
            warn!("run cancelled; stopping task");
            if let Err(e) = task.kill().await {
                warn!(error = %e, "kill failed");
            }
            // Deleting a live task kills it outright; let the graceful stop finish first.
            match tokio::time::timeout(STOP_TIMEOUT, exit).await {
                Ok(Ok(exit)) => info!(code = exit.code, "task stopped"),
                Ok(Err(e)) => warn!(error = %e, "lost task exit status"),
                Err(_) => warn!(timeout = ?STOP_TIMEOUT, "task did not stop in time"),
            }
            Err(SupervisorError::Cancelled)
        }
    }
}
