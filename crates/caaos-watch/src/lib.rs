mod config;
pub use config::WatchConfig;

mod errors;
pub use errors::WatchError;

mod transport;
pub use transport::{HttpTransport, MetadataResponse, MetadataTransport};

mod watcher;
pub use watcher::{ConfigSource, ConfigWatcher};
