use thiserror::Error;

use caaos_runtime::RuntimeError;

/// Why a supervised run ended without a workload exit code.
///
/// Each variant names the lifecycle stage that failed.
#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("pull image: {0}")]
    Pull(RuntimeError),

    #[error("create container: {0}")]
    Create(RuntimeError),

    #[error("create task: {0}")]
    Task(RuntimeError),

    #[error("wait for task: {0}")]
    Wait(RuntimeError),

    #[error("start task: {0}")]
    Start(RuntimeError),

    #[error("run cancelled")]
    Cancelled,
}

#[derive(Error, Debug)]
pub enum HostError {
    #[error("power off failed: {0}")]
    PowerOff(#[from] std::io::Error),

    #[error("power off task aborted: {0}")]
    Join(String),

    #[error("power off is not supported on this platform")]
    Unsupported,
}
