/// Runtime specification of the single workload container.
///
/// The image's own configuration (env, working dir, user, entrypoint) is always the base.
/// Only the process arguments vary between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Share the host network namespace, its `/etc/hosts` and its `/etc/resolv.conf`.
    pub host_network: bool,
    /// Run with all capabilities and host devices.
    pub privileged: bool,
    /// Replaces the image's default process args when set.
    pub args: Option<Vec<String>>,
}

impl ContainerSpec {
    /// Host-integrated workload spec; an empty `argv` keeps the image defaults.
    pub fn workload(argv: Vec<String>) -> Self {
        Self {
            host_network: true,
            privileged: true,
            args: (!argv.is_empty()).then_some(argv),
        }
    }
}

/// What to release together with a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerCleanup {
    pub snapshot: bool,
}

impl Default for ContainerCleanup {
    fn default() -> Self {
        Self { snapshot: true }
    }
}
