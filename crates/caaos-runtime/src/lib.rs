//! Container runtime capability consumed by the supervisor.
//!
//! The traits in [`api`] model the handful of engine operations one supervised run needs.
//! [`ctr`] implements them on top of containerd's `ctr` client.

mod error;
pub use error::RuntimeError;

pub mod api;
pub use api::{Container, ContainerRuntime, ExitNotifier, ExitWaiter, Task};

mod spec;
pub use spec::{ContainerCleanup, ContainerSpec};

#[cfg(feature = "ctr")]
mod util;

#[cfg(feature = "ctr")]
pub mod ctr;
#[cfg(feature = "ctr")]
pub use ctr::{CtrConfig, CtrRuntime};

pub mod prelude {
    pub use crate::api::{Container, ContainerRuntime, Task};
    pub use crate::error::RuntimeError;
    pub use crate::spec::{ContainerCleanup, ContainerSpec};
}
