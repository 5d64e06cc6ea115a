//! In-memory content-addressed block storage for dagvet.
//!
//! Blocks are canonical DAG-CBOR bytes keyed by their CID. The store is a
//! plain key-value map; the [`Resolver`] is what gives it structure, walking a
//! [`Path`](dagvet_types::Path) through maps and lists and crossing into other
//! blocks at links.
//!
//! # Storage Backends
//!
//! All backends implement the [`BlockStore`] trait:
//!
//! - [`MemoryBlockStore`] -- `HashMap`-based store, one per agent
//!
//! # Rules
//!
//! 1. `get` never fails; absence is `None`.
//! 2. `put_verified` recomputes the CID and stores nothing on mismatch.
//! 3. `put_trusted` stores unconditionally and overwrites.
//! 4. Blocks are never removed.
//! 5. Resolution is bounded by a hop counter, so cycles terminate.

pub mod error;
pub mod memory;
pub mod resolve;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryBlockStore;
pub use resolve::{Resolution, Resolver, DEFAULT_MAX_DEPTH};
pub use traits::BlockStore;
