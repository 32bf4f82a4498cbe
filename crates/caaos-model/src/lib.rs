mod attributes;
pub use attributes::Attributes;

mod etag;
pub use etag::{DEFAULT_ETAG, Etag};

mod exit;
pub use exit::TaskExit;

mod error;
pub use error::ModelError;
