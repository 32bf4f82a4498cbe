use time::{UtcOffset, format_description::well_known::Rfc3339};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::OffsetTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::logger::{config::LoggerConfig, error::LoggerError, format::LoggerFormat};

/// HTTP client internals are chatty on every long-poll; keep them at warn unless asked for.
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest"];

type Output = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Install the global subscriber: one output layer for `cfg.format`, filtered by `cfg.level`.
pub(crate) fn install(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    let filter = level_filter(&cfg.level)?;
    let output: Output = match cfg.format {
        LoggerFormat::Text => fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(cfg.use_color)
            .with_target(cfg.with_targets)
            .with_file(true)
            .with_line_number(true)
            .with_timer(local_rfc3339())
            .with_filter(filter)
            .boxed(),
        LoggerFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .with_current_span(true)
            .with_target(cfg.with_targets)
            .with_timer(local_rfc3339())
            .with_filter(filter)
            .boxed(),
        LoggerFormat::Journald => journald()?.with_filter(filter).boxed(),
    };

    tracing_subscriber::registry()
        .with(output)
        .try_init()
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("global default") {
                LoggerError::AlreadyInitialized
            } else {
                LoggerError::InitializationFailed(msg)
            }
        })
}

fn level_filter(level: &str) -> Result<EnvFilter, LoggerError> {
    let mut filter =
        EnvFilter::try_new(level).map_err(|_| LoggerError::InvalidLogLevel(level.to_string()))?;
    // An explicit directive for the same target in `level` wins.
    for target in QUIET_TARGETS.iter().filter(|t| !level.contains(*t)) {
        if let Ok(directive) = format!("{target}=warn").parse() {
            filter = filter.add_directive(directive);
        }
    }
    Ok(filter)
}

fn local_rfc3339() -> OffsetTime<Rfc3339> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetTime::new(offset, Rfc3339)
}

#[cfg(all(target_os = "linux", feature = "journald"))]
fn journald() -> Result<tracing_journald::Layer, LoggerError> {
    tracing_journald::layer()
        .map(|layer| layer.with_syslog_identifier("caaos".to_string()))
        .map_err(|e| LoggerError::InitializationFailed(format!("journald: {e}")))
}

#[cfg(not(all(target_os = "linux", feature = "journald")))]
fn journald() -> Result<fmt::Layer<Registry>, LoggerError> {
    Err(LoggerError::JournaldNotSupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_accepts_level_and_directives() {
        assert!(level_filter("info").is_ok());
        assert!(level_filter("warn,caaos_core=debug").is_ok());
        assert!(level_filter("debug,reqwest=trace").is_ok());
    }

    #[test]
    fn filter_rejects_garbage() {
        assert!(matches!(
            level_filter("caaos_core=notalevel"),
            Err(LoggerError::InvalidLogLevel(_))
        ));
    }
}
