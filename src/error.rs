// src/error.rs
//! Public error type for the entire crate

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Crypto operation failed: {0}")]
    Crypto(aes_gcm::Error),

    #[error("Database error: {0}")]
    Sql(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid address: {0:?}")]
    InvalidAddress(String),

    #[error("Access denied for {0}")]
    AccessDenied(String),

    #[error("Only the owner ({owner}) may change access, not {caller}")]
    NotOwner { owner: String, caller: String },

    #[error("Owner key for {0} is signature-derived; a signature is required")]
    MissingSignature(String),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Unsupported envelope version: {0}")]
    UnsupportedVersion(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("File already shared by this owner: {0}")]
    AlreadyShared(String),
}

impl From<aes_gcm::Error> for CoreError {
    fn from(err: aes_gcm::Error) -> Self {
        CoreError::Crypto(err)
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
