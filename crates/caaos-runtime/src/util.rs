use std::time::Duration;

use tokio::process::Child;
use tracing::debug;

/// SIGTERM the child, give it `grace` to exit, then SIGKILL.
#[cfg(target_family = "unix")]
pub async fn kill_graceful(child: &mut Child, grace: Duration) -> std::io::Result<()> {
    if let Some(id) = child.id() {
        // SAFETY: plain signal delivery to a pid we spawned and have not reaped yet.
        unsafe {
            libc::kill(id as libc::pid_t, libc::SIGTERM);
        }
        if tokio::time::timeout(grace, child.wait()).await.is_ok() {
            return Ok(());
        }
        debug!(pid = id, "child ignored SIGTERM; killing");
    }
    child.kill().await
}

#[cfg(not(target_family = "unix"))]
pub async fn kill_graceful(child: &mut Child, _grace: Duration) -> std::io::Result<()> {
    child.kill().await
}

/// Map a client exit status onto a workload exit code; death by signal becomes `128 + signo`.
pub fn exit_code(status: std::process::ExitStatus) -> u32 {
    if let Some(code) = status.code() {
        return code as u32;
    }
    #[cfg(target_family = "unix")]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig as u32;
        }
    }
    u32::MAX
}
