use std::convert::Infallible;

use thiserror::Error;

/// A value that cannot be represented in canonical DAG-CBOR.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("non-finite float {0} cannot be encoded")]
    NonFiniteFloat(f64),

    #[error("integer {0} is outside the CBOR range")]
    IntegerOutOfRange(i128),

    #[error("nesting deeper than {0} levels")]
    NestingTooDeep(usize),

    #[error("cbor encode: {0}")]
    Cbor(#[from] minicbor::encode::Error<Infallible>),
}

/// Bytes that are not a well-formed DAG-CBOR value.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unexpected end of input")]
    Truncated,

    #[error("trailing bytes after value at offset {0}")]
    TrailingBytes(usize),

    #[error("indefinite-length items are not allowed")]
    IndefiniteLength,

    #[error("map keys must be strings, found {0}")]
    NonStringKey(String),

    #[error("duplicate map key: {0}")]
    DuplicateKey(String),

    #[error("unsupported tag {0}")]
    UnsupportedTag(u64),

    #[error("unsupported item: {0}")]
    UnsupportedItem(String),

    #[error("invalid link: {0}")]
    InvalidLink(String),

    #[error("nesting deeper than {0} levels")]
    NestingTooDeep(usize),

    #[error("bytes are not canonically encoded")]
    NonCanonical,

    #[error("re-encode failed: {0}")]
    Reencode(#[from] EncodeError),

    #[error("cbor decode: {0}")]
    Cbor(minicbor::decode::Error),
}

impl From<minicbor::decode::Error> for DecodeError {
    fn from(err: minicbor::decode::Error) -> Self {
        if err.is_end_of_input() {
            Self::Truncated
        } else {
            Self::Cbor(err)
        }
    }
}

/// Failure to derive a content identifier.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CidError {
    #[error("unsupported multihash code 0x{0:x}")]
    UnsupportedHash(u64),

    #[error("invalid CID parameters: {0}")]
    InvalidParameters(String),
}

pub type EncodeResult<T> = Result<T, EncodeError>;
pub type DecodeResult<T> = Result<T, DecodeError>;
