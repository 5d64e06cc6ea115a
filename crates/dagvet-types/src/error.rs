use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid CID: {0}")]
    InvalidCid(String),

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("unsupported JSON value: {0}")]
    UnsupportedJson(String),
}
