mod config;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use caaos_core::{ContainerSupervisor, ControlLoop, Halt, LinuxPower};
use caaos_observe::logger_init;
use caaos_runtime::CtrRuntime;
use caaos_watch::{ConfigWatcher, HttpTransport, WatchConfig};

use crate::config::DaemonConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1) Config + logger
    let cfg = DaemonConfig::from_env().context("read configuration")?;
    logger_init(&cfg.logger).context("initialize logger")?;
    info!(version = env!("CARGO_PKG_VERSION"), "caaos starting");

    // 2) Container runtime
    let runtime = match CtrRuntime::connect(cfg.runtime.clone()).await {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(address = %cfg.runtime.address.display(), error = %e, "containerd unreachable");
            return Err(e).context("connect to containerd");
        }
    };
    info!(address = %cfg.runtime.address.display(), "connected to containerd");

    // 3) Signals
    let ctx = CancellationToken::new();
    tokio::spawn(cancel_on_signal(ctx.clone()));

    // 4) Control loop
    let watcher = ConfigWatcher::new(HttpTransport::new(WatchConfig::default())?);
    let supervisor = ContainerSupervisor::new(runtime);
    let mut control = ControlLoop::new(watcher, supervisor, LinuxPower);

    let halt = control.run(&ctx).await;
    let etag = control.etag();
    match halt {
        Halt::Cancelled => info!(%etag, "stopped"),
        Halt::PoweredOff => info!(%etag, "stopped after power off"),
    }
    Ok(())
}

async fn cancel_on_signal(ctx: CancellationToken) {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!("received SIGINT"),
        _ = terminate => info!("received SIGTERM"),
    }
    ctx.cancel();
}
