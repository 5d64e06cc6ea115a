use std::collections::HashMap;

use dagvet_types::{Block, Cid, Path};
use tracing::debug;

use crate::error::StoreResult;
use crate::resolve::{Resolution, Resolver};
use crate::traits::BlockStore;

/// HashMap-backed block store.
///
/// Owned by a single agent, so there is no interior locking: writes take
/// `&mut self`.
#[derive(Clone, Default)]
pub struct MemoryBlockStore {
    blocks: HashMap<Cid, Block>,
}

impl MemoryBlockStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes across all stored blocks.
    pub fn total_bytes(&self) -> usize {
        self.blocks.values().map(Block::len).sum()
    }

    /// Move every block of `other` into this store, overwriting on key
    /// collision.
    pub fn merge(&mut self, other: MemoryBlockStore) {
        self.blocks.extend(other.blocks);
    }

    /// Resolve `path` from `root` with the default hop limit.
    pub async fn resolve(&self, root: Cid, path: &Path) -> StoreResult<Resolution> {
        Resolver::new(self).resolve(root, path).await
    }
}

impl BlockStore for MemoryBlockStore {
    fn get(&self, cid: &Cid) -> Option<Block> {
        self.blocks.get(cid).cloned()
    }

    fn put_trusted(&mut self, cid: Cid, block: Block) {
        debug!(cid = %cid, bytes = block.len(), "storing block");
        self.blocks.insert(cid, block);
    }

    fn len(&self) -> usize {
        self.blocks.len()
    }

    fn cids(&self) -> Vec<Cid> {
        let mut cids: Vec<Cid> = self.blocks.keys().copied().collect();
        cids.sort();
        cids
    }

    fn contains(&self, cid: &Cid) -> bool {
        self.blocks.contains_key(cid)
    }
}

impl std::fmt::Debug for MemoryBlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBlockStore")
            .field("block_count", &self.blocks.len())
            .field("total_bytes", &self.total_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use dagvet_codec::{encode, identifier_of};
    use dagvet_types::Value;

    fn bar_block() -> (Cid, Block) {
        let bytes = encode(&Value::map([("bar", Value::from(1i64))])).unwrap();
        (identifier_of(&bytes), Block::from(bytes))
    }

    // -----------------------------------------------------------------------
    // Storage
    // -----------------------------------------------------------------------

    #[test]
    fn new_store_is_empty() {
        let store = MemoryBlockStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert!(store.cids().is_empty());
    }

    #[test]
    fn put_then_get() {
        let mut store = MemoryBlockStore::new();
        let (cid, block) = bar_block();
        store.put_trusted(cid, block.clone());

        assert_eq!(store.get(&cid), Some(block));
        assert!(store.contains(&cid));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn get_missing_is_none() {
        let store = MemoryBlockStore::new();
        let (cid, _) = bar_block();
        assert_eq!(store.get(&cid), None);
        assert!(!store.contains(&cid));
    }

    #[test]
    fn put_is_idempotent() {
        let mut store = MemoryBlockStore::new();
        let (cid, block) = bar_block();
        store.put_trusted(cid, block.clone());
        store.put_trusted(cid, block.clone());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&cid), Some(block));
    }

    #[test]
    fn trusted_put_overwrites() {
        let mut store = MemoryBlockStore::new();
        let (cid, _) = bar_block();
        store.put_trusted(cid, Block::from(vec![0xf6]));
        store.put_trusted(cid, Block::from(vec![0xf5]));
        assert_eq!(store.get(&cid).unwrap().as_bytes(), &[0xf5]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn trusted_put_accepts_unrelated_key() {
        let mut store = MemoryBlockStore::new();
        let (cid, _) = bar_block();
        store.put_trusted(cid, Block::from(b"not the content".as_slice()));
        assert!(store.contains(&cid));
    }

    // -----------------------------------------------------------------------
    // Verification
    // -----------------------------------------------------------------------

    #[test]
    fn verified_put_accepts_matching_block() {
        let mut store = MemoryBlockStore::new();
        let (cid, block) = bar_block();
        store.put_verified(cid, block).unwrap();
        assert!(store.contains(&cid));
    }

    #[test]
    fn verified_put_rejects_mismatch() {
        let mut store = MemoryBlockStore::new();
        let (cid, _) = bar_block();
        let wrong = Block::from(encode(&Value::from("other")).unwrap());

        let err = store.put_verified(cid, wrong).unwrap_err();
        assert!(matches!(err, StoreError::CidMismatch { expected, .. } if expected == cid));
        assert!(store.is_empty());
    }

    #[test]
    fn put_value_returns_identifier() {
        let mut store = MemoryBlockStore::new();
        let value = Value::map([("bar", Value::from(1i64))]);
        let cid = store.put_value(&value).unwrap();
        let (expected, block) = bar_block();
        assert_eq!(cid, expected);
        assert_eq!(store.get(&cid), Some(block));
    }

    #[test]
    fn put_value_rejects_unencodable() {
        let mut store = MemoryBlockStore::new();
        let err = store.put_value(&Value::Float(f64::NAN)).unwrap_err();
        assert!(matches!(err, StoreError::Encode(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn merge_moves_all_blocks() {
        let mut staging = MemoryBlockStore::new();
        let a = staging.put_value(&Value::from("a")).unwrap();
        let b = staging.put_value(&Value::from("b")).unwrap();

        let mut store = MemoryBlockStore::new();
        store.put_value(&Value::from("a")).unwrap();
        store.merge(staging);
        assert_eq!(store.cids().len(), 2);
        assert!(store.contains(&a) && store.contains(&b));
    }

    #[test]
    fn cids_are_sorted() {
        let mut store = MemoryBlockStore::new();
        for i in 0..10i64 {
            store.put_value(&Value::from(i)).unwrap();
        }
        let cids = store.cids();
        assert_eq!(cids.len(), 10);
        assert!(cids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn debug_reports_counts() {
        let mut store = MemoryBlockStore::new();
        store.put_value(&Value::from("x")).unwrap();
        let dbg = format!("{store:?}");
        assert!(dbg.contains("block_count: 1"));
    }
}
