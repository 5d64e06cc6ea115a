use dagvet_codec::{CidError, DecodeError, EncodeError};
use dagvet_types::Cid;

/// Errors from block store and resolver operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Resolution needed a block the store does not hold.
    #[error("block not found: {0}")]
    BlockNotFound(Cid),

    /// A path segment has no counterpart in the value being walked.
    #[error("path segment {segment:?} not found under {cid}")]
    PathNotFound { cid: Cid, segment: String },

    /// More link hops than the resolver allows.
    #[error("resolution exceeded {limit} link hops")]
    ResolutionDepthExceeded { limit: usize },

    /// Block bytes do not hash to the key they were offered under.
    #[error("CID mismatch: expected {expected}, computed {computed}")]
    CidMismatch { expected: Cid, computed: Cid },

    /// A stored block is not valid DAG-CBOR.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("CID error: {0}")]
    Cid(#[from] CidError),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
