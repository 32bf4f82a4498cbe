use thiserror::Error;

use caaos_model::ModelError;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("metadata request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("metadata server answered with status {0}")]
    Status(u16),

    #[error("invalid metadata url: {0}")]
    Url(String),

    #[error("{0}")]
    Decode(#[from] ModelError),
}
