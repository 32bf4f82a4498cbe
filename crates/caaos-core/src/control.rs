//! The daemon's main loop: watch metadata, run the requested container, repeat or power off.
//!
//! ```text
//! WaitingForConfig ──record──▶ Evaluating ──argv──▶ Running ──▶ WaitingForConfig
//!        ▲  │ error / cancelled / empty        │ bad args           │ stop-on-exit
//!        └──┘                                  ▼                    ▼
//!                                      WaitingForConfig        ShuttingDown
//! ```
//!
//! Everything runs sequentially on the caller's task: at most one watch and one container
//! run are ever in flight. The change token lives here for the whole process lifetime.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use caaos_model::{Attributes, Etag};
use caaos_watch::ConfigSource;

use crate::{error::SupervisorError, host::HostPower, supervisor::Supervise};

/// Pauses applied after failures before polling again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Backoff {
    /// After a failed metadata fetch.
    watch_error: Duration,
    /// After a failed container run; longer, so a broken workload cannot spin.
    run_error: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            watch_error: Duration::from_secs(1),
            run_error: Duration::from_secs(5),
        }
    }
}

/// Why [`ControlLoop::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// The shared token was cancelled while watching or running.
    Cancelled,
    /// Power-off was requested; the loop parked until cancellation.
    PoweredOff,
}

#[derive(Debug)]
enum State {
    WaitingForConfig,
    Evaluating(Attributes),
    Running { attrs: Attributes, argv: Vec<String> },
    ShuttingDown(Attributes),
}

enum Step {
    Next(State),
    Halt(Halt),
}

pub struct ControlLoop<S, V, H> {
    source: S,
    supervisor: V,
    power: H,
    backoff: Backoff,
    etag: Etag,
}

impl<S, V, H> ControlLoop<S, V, H>
where
    S: ConfigSource,
    V: Supervise,
    H: HostPower,
{
    pub fn new(source: S, supervisor: V, power: H) -> Self {
        Self {
            source,
            supervisor,
            power,
            backoff: Backoff::default(),
            etag: Etag::default(),
        }
    }

    /// Token of the last answered metadata poll.
    pub fn etag(&self) -> &Etag {
        &self.etag
    }

    /// Drive the loop until `ctx` is cancelled.
    ///
    /// After a power-off request no further metadata is watched; the loop waits for the
    /// host to go down, which surfaces here as cancellation.
    pub async fn run(&mut self, ctx: &CancellationToken) -> Halt {
        let mut state = State::WaitingForConfig;
        loop {
            if ctx.is_cancelled() && !matches!(state, State::ShuttingDown(_)) {
                info!("control loop cancelled");
                return Halt::Cancelled;
            }
            state = match self.step(ctx, state).await {
                Step::Next(next) => next,
                Step::Halt(halt) => return halt,
            };
        }
    }

    async fn step(&mut self, ctx: &CancellationToken, state: State) -> Step {
        match state {
            State::WaitingForConfig => self.wait_for_config(ctx).await,
            State::Evaluating(attrs) => Self::evaluate(attrs),
            State::Running { attrs, argv } => self.run_workload(ctx, attrs, argv).await,
            State::ShuttingDown(attrs) => self.shut_down(ctx, attrs).await,
        }
    }

    async fn wait_for_config(&mut self, ctx: &CancellationToken) -> Step {
        info!(etag = %self.etag, "waiting for metadata");
        match self.source.watch(ctx, &mut self.etag).await {
            Ok(Some(attrs)) if !attrs.has_workload() => {
                info!("no container set, waiting");
                Step::Next(State::WaitingForConfig)
            }
            Ok(Some(attrs)) => Step::Next(State::Evaluating(attrs)),
            Ok(None) => Step::Next(State::WaitingForConfig),
            Err(e) => {
                warn!(error = %e, "fetching metadata failed");
                pause(ctx, self.backoff.watch_error).await;
                Step::Next(State::WaitingForConfig)
            }
        }
    }

    fn evaluate(attrs: Attributes) -> Step {
        match attrs.argv() {
            Ok(argv) => Step::Next(State::Running { attrs, argv }),
            Err(e) => {
                warn!(error = %e, container = %attrs.container_id, "skipping run");
                Step::Next(State::WaitingForConfig)
            }
        }
    }

    async fn run_workload(
        &mut self,
        ctx: &CancellationToken,
        attrs: Attributes,
        argv: Vec<String>,
    ) -> Step {
        debug!(container = %attrs.container_id, ?argv, "running workload");
        match self.supervisor.run(ctx, &attrs.container_id, argv).await {
            Ok(code) => info!(container = %attrs.container_id, code, "workload exited"),
            Err(SupervisorError::Cancelled) => return Step::Halt(Halt::Cancelled),
            Err(e) => {
                error!(container = %attrs.container_id, error = %e, "workload run failed");
                pause(ctx, self.backoff.run_error).await;
            }
        }

        if attrs.stop_on_exit {
            return Step::Next(State::ShuttingDown(attrs));
        }
        info!(container = %attrs.container_id, "finished running, waiting for next command");
        Step::Next(State::WaitingForConfig)
    }

    async fn shut_down(&mut self, ctx: &CancellationToken, attrs: Attributes) -> Step {
        info!(container = %attrs.container_id, "finished running, shutting down");
        if let Err(e) = self.power.power_off().await {
            error!(error = %e, "power off failed");
        }
        // Never loop again; the host is expected to take the process down with it.
        ctx.cancelled().await;
        Step::Halt(Halt::PoweredOff)
    }
}

async fn pause(ctx: &CancellationToken, delay: Duration) {
    tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        _ = ctx.cancelled() => {}
    }
}
