#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid format: {0}")]
    InvalidFormat(#[from] serde_json::Error),

    #[error("invalid rows: {0}")]
    InvalidRows(serde_json::Error),

    #[error("unknown flow group: {key}")]
    UnknownGroup { key: String },

    #[error("unknown path in flow group {key}")]
    UnknownPath { key: String },
}

pub type Result<T> = std::result::Result<T, Error>;
