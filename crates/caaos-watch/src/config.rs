use std::time::Duration;

/// Attribute directory of the instance metadata server.
pub const METADATA_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/attributes/";

/// Long-poll settings for the metadata attribute directory.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Directory to watch recursively.
    pub url: String,
    /// How long the server may hold a request before answering unchanged (`timeout_sec`).
    pub wait_timeout_sec: u64,
    /// Overall client-side deadline for one request; must exceed the server-side wait.
    pub request_timeout: Duration,
    /// Header the metadata server requires on every request.
    pub flavor_header: (&'static str, &'static str),
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            url: METADATA_URL.to_string(),
            wait_timeout_sec: 120,
            request_timeout: Duration::from_secs(130),
            flavor_header: ("Metadata-Flavor", "Google"),
        }
    }
}
