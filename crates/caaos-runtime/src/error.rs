use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("cannot run runtime client: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("{op} failed (exit code {code:?}): {stderr}")]
    Command {
        op: &'static str,
        code: Option<i32>,
        stderr: String,
    },

    #[error("task was not started")]
    TaskNotStarted,

    #[error("exit status channel closed before the task reported")]
    WaiterDropped,
}
