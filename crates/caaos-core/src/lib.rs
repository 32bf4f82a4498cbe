pub mod error;
pub use error::{HostError, SupervisorError};

mod ids;
pub use ids::InstanceIds;

pub mod host;
pub use host::{HostPower, LinuxPower};

pub mod supervisor;
pub use supervisor::{ContainerSupervisor, Supervise};

pub mod control;
pub use control::{ControlLoop, Halt};
