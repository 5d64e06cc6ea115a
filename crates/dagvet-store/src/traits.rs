use dagvet_codec::{encode_block, CidBuilder};
use dagvet_types::{Block, Cid, Value};

use crate::error::{StoreError, StoreResult};

/// Content-addressed block store.
///
/// Implementations hold canonical DAG-CBOR blocks keyed by CID:
/// - `get` never fails; a missing key is `None`.
/// - Re-storing an existing key overwrites it.
/// - Nothing is ever removed.
/// - The store never interprets block contents; decoding is the resolver's job.
pub trait BlockStore: Send + Sync {
    /// Look up a block by CID.
    fn get(&self, cid: &Cid) -> Option<Block>;

    /// Store a block under `cid` without checking that the bytes hash to it.
    fn put_trusted(&mut self, cid: Cid, block: Block);

    /// Number of blocks held.
    fn len(&self) -> usize;

    /// All keys, sorted.
    fn cids(&self) -> Vec<Cid>;

    fn contains(&self, cid: &Cid) -> bool {
        self.get(cid).is_some()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a block after recomputing its CID with `cid`'s own version,
    /// codec and hash function.
    ///
    /// On mismatch nothing is stored.
    fn put_verified(&mut self, cid: Cid, block: Block) -> StoreResult<()> {
        let computed = CidBuilder::for_cid(&cid)?.identify(block.as_bytes())?;
        if computed != cid {
            return Err(StoreError::CidMismatch {
                expected: cid,
                computed,
            });
        }
        self.put_trusted(cid, block);
        Ok(())
    }

    /// Encode `value`, derive its CID, store it and return the CID.
    fn put_value(&mut self, value: &Value) -> StoreResult<Cid> {
        let (cid, block) = encode_block(value)?;
        self.put_trusted(cid, block);
        Ok(cid)
    }
}
