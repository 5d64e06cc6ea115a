//! Foundation types for dagvet.
//!
//! This crate provides the data model shared by every other dagvet crate:
//! the decoded form of a block, the raw block bytes, and the paths used to
//! walk from one block into another.
//!
//! # Key Types
//!
//! - [`Value`] -- decoded IPLD data model value (scalars, lists, maps, links)
//! - [`Block`] -- immutable canonical bytes of one encoded value
//! - [`Path`] -- ordered path segments parsed from a slash-delimited string
//! - [`Cid`] -- content identifier (re-exported from the `cid` crate)

pub mod block;
pub mod error;
pub mod json;
pub mod object;
pub mod path;
pub mod value;

pub use block::Block;
pub use error::TypeError;
pub use object::{cid_from_bytes, parse_cid, Cid, CidDisplay, DAG_CBOR, DAG_PB, RAW, SHA2_256};
pub use path::Path;
pub use value::{Value, ValueKind};
