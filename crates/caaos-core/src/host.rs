//! Host power control used when a workload asks for the machine to stop after it exits.

use async_trait::async_trait;

use crate::error::HostError;

#[async_trait]
pub trait HostPower: Send + Sync {
    /// Flush filesystems and power the machine off.
    ///
    /// On success the kernel is already going down; callers should not expect to do more work.
    async fn power_off(&self) -> Result<(), HostError>;
}

/// `sync(2)` followed by `reboot(2)` with `LINUX_REBOOT_CMD_POWER_OFF`. Needs `CAP_SYS_BOOT`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxPower;

#[async_trait]
impl HostPower for LinuxPower {
    async fn power_off(&self) -> Result<(), HostError> {
        tokio::task::spawn_blocking(sync_and_power_off)
            .await
            .map_err(|e| HostError::Join(e.to_string()))?
    }
}

#[cfg(target_os = "linux")]
fn sync_and_power_off() -> Result<(), HostError> {
    // SAFETY: neither call touches memory owned by this process.
    unsafe {
        libc::sync();
        if libc::reboot(libc::LINUX_REBOOT_CMD_POWER_OFF) != 0 {
            return Err(HostError::PowerOff(std::io::Error::last_os_error()));
        }
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn sync_and_power_off() -> Result<(), HostError> {
    Err(HostError::Unsupported)
}
