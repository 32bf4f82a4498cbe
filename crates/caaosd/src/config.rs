use std::{env, path::PathBuf};

use caaos_observe::{LoggerConfig, LoggerError};
use caaos_runtime::{CtrConfig, ctr::DEFAULT_ADDRESS};

/// Environment variable overriding the containerd socket.
pub const ENV_CONTAINERD_ADDRESS: &str = "CAAOS_CONTAINERD_ADDRESS";

/// Everything the daemon reads at startup. Environment only; there are no flags or files.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub logger: LoggerConfig,
    pub runtime: CtrConfig,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self, LoggerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LoggerError> {
        let logger = LoggerConfig::from_lookup(&lookup)?;
        let address = lookup(ENV_CONTAINERD_ADDRESS)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

        Ok(Self {
            logger,
            runtime: CtrConfig {
                address: PathBuf::from(address),
                ..Default::default()
            },
        })
    }
}
