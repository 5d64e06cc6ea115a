use std::fmt;

pub use cid::Cid;

use crate::error::TypeError;

/// Multicodec code for DAG-CBOR encoded blocks.
pub const DAG_CBOR: u64 = 0x71;
/// Multicodec code for DAG-PB blocks (only valid codec for CIDv0).
pub const DAG_PB: u64 = 0x70;
/// Multicodec code for raw byte blocks.
pub const RAW: u64 = 0x55;
/// Multihash code for SHA2-256.
pub const SHA2_256: u64 = 0x12;

/// Parse a CID from its textual (multibase) form.
pub fn parse_cid(s: &str) -> Result<Cid, TypeError> {
    Cid::try_from(s).map_err(|e| TypeError::InvalidCid(e.to_string()))
}

/// Parse a CID from its binary form.
pub fn cid_from_bytes(bytes: &[u8]) -> Result<Cid, TypeError> {
    Cid::try_from(bytes).map_err(|e| TypeError::InvalidCid(e.to_string()))
}

/// Short, log-friendly rendering of a CID: the last 8 characters of its
/// multibase form.
///
/// The leading characters of a base32 CIDv1 are the same for every
/// dag-cbor/sha2-256 identifier, so the tail is the distinguishing part.
pub struct CidDisplay<'a>(pub &'a Cid);

impl fmt::Display for CidDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = self.0.to_string();
        let start = full.len().saturating_sub(8);
        write!(f, "…{}", &full[start..])
    }
}
