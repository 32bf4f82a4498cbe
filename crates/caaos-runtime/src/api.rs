use async_trait::async_trait;
use tokio::sync::oneshot;

use caaos_model::TaskExit;

use crate::{
    error::RuntimeError,
    spec::{ContainerCleanup, ContainerSpec},
};

/// Entry point of a container engine.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    type Image: Send + Sync;
    type Container: Container;

    /// Fetch `reference` and unpack it so it can back a snapshot.
    async fn pull(&self, reference: &str) -> Result<Self::Image, RuntimeError>;

    /// Create container `id` with a fresh writable snapshot of `image`.
    async fn create_container(
        &self,
        id: &str,
        image: &Self::Image,
        spec: &ContainerSpec,
    ) -> Result<Self::Container, RuntimeError>;
}

#[async_trait]
pub trait Container: Send + Sync {
    type Task: Task;

    fn id(&self) -> &str;

    /// Create the container's task, stopped, with stdin/stdout/stderr inherited from the daemon.
    async fn new_task(&self) -> Result<Self::Task, RuntimeError>;

    /// Remove the container; with `cleanup.snapshot` its snapshot goes too.
    async fn delete(&self, cleanup: ContainerCleanup) -> Result<(), RuntimeError>;
}

/// A process bound to a container, created stopped.
#[async_trait]
pub trait Task: Send + Sync {
    fn pid(&self) -> Option<u32>;

    /// Subscribe to the terminal status. Call before [`Task::start`] so a fast exit is not missed.
    async fn wait(&mut self) -> Result<ExitWaiter, RuntimeError>;

    async fn start(&mut self) -> Result<(), RuntimeError>;

    /// Ask the task to stop; the status still arrives through the waiter.
    async fn kill(&mut self) -> Result<(), RuntimeError>;

    async fn delete(&mut self) -> Result<(), RuntimeError>;
}

/// Sending half of a task's exit status; fires exactly once.
pub struct ExitNotifier(oneshot::Sender<Result<TaskExit, RuntimeError>>);

impl ExitNotifier {
    pub fn notify(self, status: Result<TaskExit, RuntimeError>) {
        // Receiver gone means nobody is waiting any more.
        let _ = self.0.send(status);
    }
}

/// Receiving half of a task's exit status.
pub struct ExitWaiter(oneshot::Receiver<Result<TaskExit, RuntimeError>>);

impl ExitWaiter {
    pub fn channel() -> (ExitNotifier, ExitWaiter) {
        let (tx, rx) = oneshot::channel();
        (ExitNotifier(tx), ExitWaiter(rx))
    }

    pub async fn recv(self) -> Result<TaskExit, RuntimeError> {
        self.0.await.map_err(|_| RuntimeError::WaiterDropped)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn waiter_receives_status() {
        let (notifier, waiter) = ExitWaiter::channel();
        notifier.notify(Ok(TaskExit::new(3)));
        assert_eq!(waiter.recv().await.unwrap().code, 3);
    }

    #[tokio::test]
    async fn dropped_notifier_is_reported() {
        let (notifier, waiter) = ExitWaiter::channel();
        drop(notifier);
        assert!(matches!(waiter.recv().await, Err(RuntimeError::WaiterDropped)));
    }
}
