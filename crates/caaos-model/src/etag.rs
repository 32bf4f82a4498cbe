use std::fmt;

/// Token used when the metadata server does not send one.
pub const DEFAULT_ETAG: &str = "NONE";

/// Change token of the last observed metadata state.
///
/// The control loop owns a single value for the whole process lifetime and threads it through every watch call.
/// It starts at [`DEFAULT_ETAG`] and is replaced after each completed poll.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Etag(String);

impl Etag {
    /// Build a token from an optional response header; absent or blank maps to the sentinel.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Self(v.to_string()),
            _ => Self::default(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_ETAG
    }
}

impl Default for Etag {
    fn default() -> Self {
        Self(DEFAULT_ETAG.to_string())
    }
}

impl From<&str> for Etag {
    fn from(value: &str) -> Self {
        Self::from_header(Some(value))
    }
}

impl fmt::Display for Etag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
