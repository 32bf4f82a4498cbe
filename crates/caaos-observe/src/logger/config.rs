use std::{env, io::IsTerminal};

use crate::logger::{error::LoggerError, format::LoggerFormat};

/// Environment variable holding the log filter (`info`, `caaos_core=debug`, ...).
pub const ENV_LOG_LEVEL: &str = "CAAOS_LOG_LEVEL";
/// Environment variable selecting the output format.
pub const ENV_LOG_FORMAT: &str = "CAAOS_LOG_FORMAT";

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// `EnvFilter` directives.
    pub level: String,
    pub format: LoggerFormat,
    /// Print the emitting module path with each record.
    pub with_targets: bool,
    /// ANSI colours for text output.
    pub use_color: bool,
}

impl LoggerConfig {
    /// Defaults overridden by `CAAOS_LOG_LEVEL` / `CAAOS_LOG_FORMAT` when set.
    pub fn from_env() -> Result<Self, LoggerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// [`LoggerConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LoggerError> {
        let mut cfg = Self::default();
        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.trim().is_empty()) {
            cfg.level = level.trim().to_string();
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT).filter(|v| !v.trim().is_empty()) {
            cfg.format = format.parse()?;
        }
        Ok(cfg)
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LoggerFormat::default(),
            with_targets: true,
            use_color: std::io::stdout().is_terminal(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let cfg = LoggerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.level, "info");
        assert_eq!(cfg.format, LoggerFormat::Text);
    }

    #[test]
    fn env_overrides_level_and_format() {
        let cfg = LoggerConfig::from_lookup(lookup(&[
            (ENV_LOG_LEVEL, "debug"),
            (ENV_LOG_FORMAT, "json"),
        ]))
        .unwrap();
        assert_eq!(cfg.level, "debug");
        assert_eq!(cfg.format, LoggerFormat::Json);
    }

    #[test]
    fn bad_format_is_rejected() {
        let err = LoggerConfig::from_lookup(lookup(&[(ENV_LOG_FORMAT, "yaml")])).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidFormat(_)));
    }
}
