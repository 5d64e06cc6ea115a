//! Canonical codec for dagvet.
//!
//! Provides deterministic DAG-CBOR encoding of [`dagvet_types::Value`] and
//! the content identifiers derived from the encoded bytes. Everything that
//! crosses the host boundary, and every block in the store, goes through
//! this crate.
//!
//! Hashing wraps `sha2`; CIDs are the `cid` crate's. No custom cryptography.

pub mod cbor;
pub mod error;
pub mod identifier;

pub use cbor::{decode, decode_canonical, encode, CID_TAG, MAX_NESTING_DEPTH};
pub use error::{CidError, DecodeError, DecodeResult, EncodeError, EncodeResult};
pub use identifier::{encode_block, identifier_of, verify, CidBuilder, HashAlgorithm};

pub use cid::Version as CidVersion;
