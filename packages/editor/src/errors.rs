//! Error types for the editor

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Failed to decode update: {0}")]
    Decode(String),

    #[error("Failed to apply update: {0}")]
    Apply(String),

    #[error("Invalid base64 update: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Tab not found: {0}")]
    TabNotFound(String),

    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),

    #[error("Persistence error: {0}")]
    Persistence(String),
}
