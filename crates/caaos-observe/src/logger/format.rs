use std::{fmt, str::FromStr};

use crate::logger::error::LoggerError;

/// Where and how log records are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoggerFormat {
    /// Human-readable lines on stdout.
    #[default]
    Text,
    /// One JSON object per line on stdout.
    Json,
    /// Native journal entries; Linux builds with the `journald` feature only.
    Journald,
}

impl LoggerFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Journald => "journald",
        }
    }

    const fn available(self) -> bool {
        match self {
            Self::Journald => cfg!(all(target_os = "linux", feature = "journald")),
            Self::Text | Self::Json => true,
        }
    }
}

impl fmt::Display for LoggerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoggerFormat {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = match s.trim().to_ascii_lowercase().as_str() {
            "text" => Self::Text,
            "json" => Self::Json,
            "journald" | "journal" => Self::Journald,
            _ => return Err(LoggerError::InvalidFormat(s.to_string())),
        };
        if !format.available() {
            return Err(LoggerError::JournaldNotSupported);
        }
        Ok(format)
    }
}
