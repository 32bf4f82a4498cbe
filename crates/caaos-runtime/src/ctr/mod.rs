//! Backend driving containerd through its `ctr` client.
//!
//! Every runtime operation is one short-lived `ctr` invocation against the configured socket
//! and namespace, except a started task, whose `ctr tasks start` process lives as long as the
//! workload and reports its exit code.

use std::{ffi::OsStr, path::PathBuf, process::Stdio, sync::Arc};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, instrument, trace};

use crate::{
    api::{Container, ContainerRuntime},
    error::RuntimeError,
    spec::{ContainerCleanup, ContainerSpec},
};

mod task;
pub use task::CtrTask;

pub const DEFAULT_ADDRESS: &str = "/run/containerd/containerd.sock";
pub const DEFAULT_NAMESPACE: &str = "caaos";
pub const DEFAULT_STATE_DIR: &str = "/run/caaos";

#[derive(Debug, Clone)]
pub struct CtrConfig {
    /// `ctr` executable, looked up in `PATH` when relative.
    pub binary: PathBuf,
    /// containerd control socket.
    pub address: PathBuf,
    pub namespace: String,
    /// Snapshotter for unpack and container rootfs; containerd's default when `None`.
    pub snapshotter: Option<String>,
    /// Scratch directory for task pid files.
    pub state_dir: PathBuf,
}

impl Default for CtrConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ctr"),
            address: PathBuf::from(DEFAULT_ADDRESS),
            namespace: DEFAULT_NAMESPACE.to_string(),
            snapshotter: None,
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CtrRuntime {
    cfg: Arc<CtrConfig>,
}

impl CtrRuntime {
    /// Build a runtime and make sure containerd answers on the configured socket.
    #[instrument(level = "debug", skip_all, fields(address = %cfg.address.display()))]
    pub async fn connect(cfg: CtrConfig) -> Result<Self, RuntimeError> {
        let runtime = Self { cfg: Arc::new(cfg) };
        let version = runtime.run("version", &["version"]).await?;
        trace!(%version, "ctr version");
        debug!(namespace = %runtime.cfg.namespace, "containerd reachable");
        Ok(runtime)
    }

    pub(crate) fn command(&self) -> Command {
        let mut cmd = Command::new(&self.cfg.binary);
        cmd.arg("--address")
            .arg(&self.cfg.address)
            .arg("--namespace")
            .arg(&self.cfg.namespace);
        cmd
    }

    /// Run one `ctr` subcommand to completion and return its stdout.
    pub(crate) async fn run<S: AsRef<OsStr>>(
        &self,
        op: &'static str,
        args: &[S],
    ) -> Result<String, RuntimeError> {
        let mut cmd = self.command();
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        trace!(op, "spawn ctr");
        let out = cmd.output().await?;
        if !out.status.success() {
            return Err(RuntimeError::Command {
                op,
                code: out.status.code(),
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&out.stdout).into_owned())
    }

    fn pull_args(&self, reference: &str) -> Vec<String> {
        let mut args = vec!["images".to_string(), "pull".to_string()];
        if let Some(snapshotter) = &self.cfg.snapshotter {
            args.push("--snapshotter".into());
            args.push(snapshotter.clone());
        }
        args.push(reference.to_string());
        args
    }

    fn create_args(&self, id: &str, image: &CtrImage, spec: &ContainerSpec) -> Vec<String> {
        let mut args = vec!["containers".to_string(), "create".to_string()];
        if let Some(snapshotter) = &self.cfg.snapshotter {
            args.push("--snapshotter".into());
            args.push(snapshotter.clone());
        }
        // --net-host also bind-mounts the host's /etc/hosts and /etc/resolv.conf.
        if spec.host_network {
            args.push("--net-host".into());
        }
        if spec.privileged {
            args.push("--privileged".into());
        }
        args.push(image.reference.clone());
        args.push(id.to_string());
        if let Some(process_args) = &spec.args {
            args.extend(process_args.iter().cloned());
        }
        args
    }
}

/// An image known to be pulled and unpacked in the runtime's namespace.
#[derive(Debug, Clone)]
pub struct CtrImage {
    reference: String,
}

#[async_trait]
impl ContainerRuntime for CtrRuntime {
    type Image = CtrImage;
    type Container = CtrContainer;

    #[instrument(level = "debug", skip(self))]
    async fn pull(&self, reference: &str) -> Result<CtrImage, RuntimeError> {
        self.run("image pull", &self.pull_args(reference)).await?;
        Ok(CtrImage {
            reference: reference.to_string(),
        })
    }

    #[instrument(level = "debug", skip(self, image, spec), fields(image = %image.reference))]
    async fn create_container(
        &self,
        id: &str,
        image: &CtrImage,
        spec: &ContainerSpec,
    ) -> Result<CtrContainer, RuntimeError> {
        self.run("container create", &self.create_args(id, image, spec))
            .await?;
        Ok(CtrContainer {
            runtime: self.clone(),
            id: id.to_string(),
        })
    }
}

pub struct CtrContainer {
    runtime: CtrRuntime,
    id: String,
}

#[async_trait]
impl Container for CtrContainer {
    type Task = CtrTask;

    fn id(&self) -> &str {
        &self.id
    }

    async fn new_task(&self) -> Result<CtrTask, RuntimeError> {
        Ok(CtrTask::new(self.runtime.clone(), self.id.clone()))
    }

    async fn delete(&self, cleanup: ContainerCleanup) -> Result<(), RuntimeError> {
        let mut args = vec!["containers", "delete"];
        if !cleanup.snapshot {
            args.push("--keep-snapshot");
        }
        args.push(&self.id);
        self.runtime.run("container delete", &args).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests;
