use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("invalid attributes payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("cannot split container arguments: {0:?}")]
    Args(String),
}
