use std::time::SystemTime;

/// Terminal status of a container task.
///
/// A non-zero `code` is a normal outcome, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskExit {
    pub code: u32,
    pub exited_at: SystemTime,
}

impl TaskExit {
    pub fn new(code: u32) -> Self {
        Self {
            code,
            exited_at: SystemTime::now(),
        }
    }
}
