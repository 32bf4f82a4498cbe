use std::{
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
    time::Duration,
};

use async_trait::async_trait;
use tokio::process::Child;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use caaos_model::TaskExit;

use crate::{
    api::{ExitNotifier, ExitWaiter, Task},
    ctr::CtrRuntime,
    error::RuntimeError,
    util::{exit_code, kill_graceful},
};

/// Time a killed task gets to honour SIGTERM before the client is killed outright.
const KILL_GRACE: Duration = Duration::from_secs(10);

/// How often a starting client is checked for the pid file.
const PID_POLL: Duration = Duration::from_millis(20);

/// Task of a `ctr`-managed container.
///
/// `ctr tasks start` creates, starts, waits for and removes the containerd task in one go. The
/// client writes the task pid once containerd has created the task; a client that exits before
/// that failed to start the task, anything later is the workload's own exit.
pub struct CtrTask {
    runtime: CtrRuntime,
    container_id: String,
    notifier: Option<ExitNotifier>,
    stop: CancellationToken,
    pid: Option<u32>,
}

impl CtrTask {
    pub(crate) fn new(runtime: CtrRuntime, container_id: String) -> Self {
        Self {
            runtime,
            container_id,
            notifier: None,
            stop: CancellationToken::new(),
            pid: None,
        }
    }

    fn pid_file(&self) -> PathBuf {
        self.runtime
            .cfg
            .state_dir
            .join(format!("{}.pid", self.container_id))
    }
}

fn report(notifier: Option<ExitNotifier>, id: &str, status: std::io::Result<ExitStatus>) {
    let exit = status
        .map(|s| TaskExit::new(exit_code(s)))
        .map_err(RuntimeError::from);
    match notifier {
        Some(n) => n.notify(exit),
        None => trace!(container = %id, "task exited with nobody waiting"),
    }
}

async fn read_pid(path: &Path) -> Option<u32> {
    tokio::fs::read_to_string(path).await.ok()?.trim().parse().ok()
}

/// Poll until the client reports the task pid or exits first.
async fn await_created(
    child: &mut Child,
    pid_file: &Path,
) -> std::io::Result<Result<u32, ExitStatus>> {
    loop {
        tokio::select! {
            status = child.wait() => {
                let status = status?;
                // The pid may have been written just before a fast workload exited.
                return Ok(read_pid(pid_file).await.ok_or(status));
            }
            _ = tokio::time::sleep(PID_POLL) => {
                if let Some(pid) = read_pid(pid_file).await {
                    return Ok(Ok(pid));
                }
            }
        }
    }
}

#[async_trait]
impl Task for CtrTask {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    async fn wait(&mut self) -> Result<ExitWaiter, RuntimeError> {
        let (notifier, waiter) = ExitWaiter::channel();
        self.notifier = Some(notifier);
        Ok(waiter)
    }

    async fn start(&mut self) -> Result<(), RuntimeError> {
        let pid_file = self.pid_file();
        tokio::fs::create_dir_all(&self.runtime.cfg.state_dir).await?;
        if tokio::fs::remove_file(&pid_file).await.is_ok() {
            debug!(path = %pid_file.display(), "removed stale pid file");
        }

        let mut cmd = self.runtime.command();
        cmd.args(["tasks", "start", "--pid-file"])
            .arg(&pid_file)
            .arg(&self.container_id)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let mut child = cmd.spawn()?;
        trace!(container = %self.container_id, client = ?child.id(), "task client spawned");

        let created = await_created(&mut child, &pid_file).await;
        let _ = tokio::fs::remove_file(&pid_file).await;
        match created? {
            Ok(pid) => self.pid = Some(pid),
            Err(status) => {
                return Err(RuntimeError::Command {
                    op: "task start",
                    code: status.code(),
                    stderr: "client exited before the task was created".into(),
                });
            }
        }

        // A fast workload may already be gone; its status is final.
        if let Some(status) = child.try_wait()? {
            report(self.notifier.take(), &self.container_id, Ok(status));
            return Ok(());
        }

        let notifier = self.notifier.take();
        let stop = self.stop.clone();
        let id = self.container_id.clone();
        tokio::spawn(async move {
            let status = tokio::select! {
                status = child.wait() => status,
                _ = stop.cancelled() => {
                    debug!(container = %id, "stopping task");
                    if let Err(e) = kill_graceful(&mut child, KILL_GRACE).await {
                        warn!(container = %id, error = %e, "kill failed");
                    }
                    child.wait().await
                }
            };
            report(notifier, &id, status);
        });
        Ok(())
    }

    async fn kill(&mut self) -> Result<(), RuntimeError> {
        if self.pid.is_none() {
            return Err(RuntimeError::TaskNotStarted);
        }
        self.stop.cancel();
        Ok(())
    }

    async fn delete(&mut self) -> Result<(), RuntimeError> {
        let res = self
            .runtime
            .run(
                "task delete",
                &["tasks", "delete", "--force", self.container_id.as_str()],
            )
            .await;
        match res {
            Ok(_) => Ok(()),
            // The start client removes the task itself once it has exited.
            Err(RuntimeError::Command { stderr, .. }) if stderr.contains("not found") => {
                trace!(container = %self.container_id, "task already removed");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
