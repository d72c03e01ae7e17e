use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("store codec: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("store backend: {0}")]
    Backend(String),
}
