//! Knowledge store error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Knowledge service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Invalid service URL: {0}")]
    InvalidUrl(String),

    #[error("Fixture I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid fixture: {0}")]
    Fixture(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
