use dagvet_codec::decode;
use dagvet_types::{Cid, CidDisplay, Path, Value};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::BlockStore;

/// Default bound on link hops during one resolution.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Outcome of walking a path.
///
/// `value` is the value reached. A link sitting exactly at the end of the path
/// is returned as the link itself.
///
/// [`Resolver::resolve`] either consumes the whole path or fails, so on success
/// `remainder` is always empty and [`Resolution::is_terminal`] always holds.
/// Exhausting the hop budget is reported as
/// [`StoreError::ResolutionDepthExceeded`], never as a partial resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub value: Value,
    pub remainder: Path,
}

impl Resolution {
    /// True when nothing is left to walk: no segments remain, or the value
    /// reached is not a link that could be followed.
    pub fn is_terminal(&self) -> bool {
        self.remainder.is_empty() || !self.value.is_link()
    }
}

/// Walks slash-delimited paths through linked blocks.
///
/// Each time the walk crosses a link into another block counts as one hop;
/// more than `max_depth` hops fails with
/// [`StoreError::ResolutionDepthExceeded`], which is what bounds cyclic
/// block graphs.
pub struct Resolver<'a> {
    store: &'a dyn BlockStore,
    max_depth: usize,
}

impl<'a> Resolver<'a> {
    /// Resolver over `store` with [`DEFAULT_MAX_DEPTH`].
    pub fn new(store: &'a dyn BlockStore) -> Self {
        Self {
            store,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Replace the hop limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The hop limit in effect.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Resolve `path` starting at the block named by `root`.
    pub async fn resolve(&self, root: Cid, path: &Path) -> StoreResult<Resolution> {
        let segments = path.segments();
        let mut cid = root;
        let mut pos = 0;
        let mut hops = 0;

        'blocks: loop {
            let block = self
                .store
                .get(&cid)
                .ok_or(StoreError::BlockNotFound(cid))?;
            let root_value = decode(block.as_bytes())?;
            debug!(cid = %CidDisplay(&cid), consumed = pos, "resolving in block");

            let mut current = &root_value;
            loop {
                if pos == segments.len() {
                    return Ok(Resolution {
                        value: current.clone(),
                        remainder: Path::root(),
                    });
                }

                if let Value::Link(next) = current {
                    if hops >= self.max_depth {
                        return Err(StoreError::ResolutionDepthExceeded {
                            limit: self.max_depth,
                        });
                    }
                    hops += 1;
                    debug!(from = %CidDisplay(&cid), to = %CidDisplay(next), hops, "following link");
                    cid = *next;
                    continue 'blocks;
                }

                let segment = &segments[pos];
                current = current.get(segment).ok_or_else(|| StoreError::PathNotFound {
                    cid,
                    segment: segment.clone(),
                })?;
                pos += 1;
            }
        }
    }
}

impl std::fmt::Debug for Resolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("blocks", &self.store.len())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBlockStore;
    use dagvet_codec::{encode, identifier_of};
    use dagvet_types::Block;

    fn store_with(values: &[Value]) -> (MemoryBlockStore, Vec<Cid>) {
        let mut store = MemoryBlockStore::new();
        let cids = values.iter().map(|v| store.put_value(v).unwrap()).collect();
        (store, cids)
    }

    #[tokio::test]
    async fn resolves_key_in_single_block() {
        let (store, cids) = store_with(&[Value::map([("bar", Value::from(1i64))])]);
        let res = store.resolve(cids[0], &Path::parse("bar")).await.unwrap();
        assert_eq!(res.value, Value::Integer(1));
        assert!(res.remainder.is_empty());
        assert!(res.is_terminal());
    }

    #[tokio::test]
    async fn follows_link_into_next_block() {
        let mut store = MemoryBlockStore::new();
        let a = store.put_value(&Value::map([("bar", Value::from(1i64))])).unwrap();
        let b = store.put_value(&Value::map([("foo", Value::Link(a))])).unwrap();

        let res = store.resolve(b, &Path::parse("foo/bar")).await.unwrap();
        assert_eq!(res.value, Value::Integer(1));
        assert!(res.remainder.is_empty());
    }

    #[tokio::test]
    async fn link_at_end_of_path_is_not_followed() {
        let mut store = MemoryBlockStore::new();
        let a = store.put_value(&Value::from("leaf")).unwrap();
        let b = store.put_value(&Value::map([("foo", Value::Link(a))])).unwrap();

        let res = store.resolve(b, &Path::parse("/foo/")).await.unwrap();
        assert_eq!(res.value, Value::Link(a));
    }

    #[tokio::test]
    async fn empty_path_returns_root_value() {
        let value = Value::map([("x", Value::from(true))]);
        let (store, cids) = store_with(&[value.clone()]);
        let res = store.resolve(cids[0], &Path::root()).await.unwrap();
        assert_eq!(res.value, value);
    }

    #[tokio::test]
    async fn walks_lists_and_nested_maps() {
        let (store, cids) = store_with(&[Value::map([(
            "tree",
            Value::map([(
                "items",
                Value::from(vec![Value::from("a"), Value::map([("ok", Value::from(true))])]),
            )]),
        )])]);
        let res = store
            .resolve(cids[0], &Path::parse("tree/items/1/ok"))
            .await
            .unwrap();
        assert_eq!(res.value, Value::Bool(true));
    }

    #[tokio::test]
    async fn chain_of_blocks() {
        let mut store = MemoryBlockStore::new();
        let bottom = store
            .put_value(&Value::map([("v", Value::from("bottom"))]))
            .unwrap();
        let mut cid = bottom;
        for _ in 0..10 {
            cid = store.put_value(&Value::map([("down", Value::Link(cid))])).unwrap();
        }

        let path = Path::from_segments(std::iter::repeat("down").take(10).chain(["v"]));
        let res = store.resolve(cid, &path).await.unwrap();
        assert_eq!(res.value, Value::from("bottom"));
        assert!(res.remainder.is_empty());
        assert!(res.is_terminal());

        // Stopping on the last "down" yields the link to the bottom block.
        let path = Path::from_segments(std::iter::repeat("down").take(10));
        let res = store.resolve(cid, &path).await.unwrap();
        assert_eq!(res.value, Value::Link(bottom));
        assert!(res.remainder.is_empty());
    }

    #[tokio::test]
    async fn successful_walk_consumes_whole_path() {
        let mut store = MemoryBlockStore::new();
        let a = store.put_value(&Value::map([("bar", Value::from(1i64))])).unwrap();
        let b = store.put_value(&Value::map([("foo", Value::Link(a))])).unwrap();
        let c = store.put_value(&Value::map([("up", Value::Link(b))])).unwrap();

        for path in ["", "up", "up/foo", "up/foo/bar"] {
            let res = store.resolve(c, &Path::parse(path)).await.unwrap();
            assert!(res.remainder.is_empty(), "remainder left for {path:?}");
            assert!(res.is_terminal(), "non-terminal result for {path:?}");
        }
    }

    // -----------------------------------------------------------------------
    // Failures
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn missing_root_block() {
        let store = MemoryBlockStore::new();
        let cid = identifier_of(b"absent");
        let err = store.resolve(cid, &Path::parse("x")).await.unwrap_err();
        assert!(matches!(err, StoreError::BlockNotFound(c) if c == cid));
    }

    #[tokio::test]
    async fn missing_linked_block() {
        let mut store = MemoryBlockStore::new();
        let absent = identifier_of(b"absent");
        let b = store.put_value(&Value::map([("foo", Value::Link(absent))])).unwrap();
        let err = store.resolve(b, &Path::parse("foo/bar")).await.unwrap_err();
        assert!(matches!(err, StoreError::BlockNotFound(c) if c == absent));
    }

    #[tokio::test]
    async fn missing_key() {
        let (store, cids) = store_with(&[Value::map([("bar", Value::from(1i64))])]);
        let err = store.resolve(cids[0], &Path::parse("baz")).await.unwrap_err();
        match err {
            StoreError::PathNotFound { cid, segment } => {
                assert_eq!(cid, cids[0]);
                assert_eq!(segment, "baz");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn indexing_a_scalar() {
        let (store, cids) = store_with(&[Value::map([("bar", Value::from(1i64))])]);
        let err = store.resolve(cids[0], &Path::parse("bar/0")).await.unwrap_err();
        assert!(matches!(err, StoreError::PathNotFound { .. }));
    }

    #[tokio::test]
    async fn list_index_out_of_range() {
        let (store, cids) = store_with(&[Value::from(vec![Value::Null])]);
        let err = store.resolve(cids[0], &Path::parse("3")).await.unwrap_err();
        assert!(matches!(err, StoreError::PathNotFound { .. }));
    }

    #[tokio::test]
    async fn undecodable_block() {
        let mut store = MemoryBlockStore::new();
        let cid = identifier_of(b"junk");
        store.put_trusted(cid, Block::from(vec![0xa1, 0x63]));
        let err = store.resolve(cid, &Path::parse("x")).await.unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[tokio::test]
    async fn self_link_hits_depth_limit() {
        let mut store = MemoryBlockStore::new();
        let cid = identifier_of(b"cycle");
        let bytes = encode(&Value::map([("next", Value::Link(cid))])).unwrap();
        store.put_trusted(cid, Block::from(bytes));

        let path = Path::from_segments(std::iter::repeat("next").take(50));
        let err = Resolver::new(&store)
            .with_max_depth(8)
            .resolve(cid, &path)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ResolutionDepthExceeded { limit: 8 }));
    }

    #[tokio::test]
    async fn depth_limit_counts_hops_exactly() {
        let mut store = MemoryBlockStore::new();
        let mut cid = store.put_value(&Value::from(7i64)).unwrap();
        for _ in 0..3 {
            cid = store.put_value(&Value::map([("n", Value::Link(cid))])).unwrap();
        }
        // Three "n" segments, then one more hop to reach the integer block.
        let path = Path::parse("n/n/n/x");
        let resolver = Resolver::new(&store).with_max_depth(2);
        assert!(matches!(
            resolver.resolve(cid, &path).await,
            Err(StoreError::ResolutionDepthExceeded { limit: 2 })
        ));

        let resolver = Resolver::new(&store).with_max_depth(3);
        assert!(matches!(
            resolver.resolve(cid, &path).await,
            Err(StoreError::PathNotFound { .. })
        ));
    }
}
