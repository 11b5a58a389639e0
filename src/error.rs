use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("tag radio unavailable: {0}")]
    Unavailable(String),

    #[error("scan session error: {0}")]
    Session(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}
