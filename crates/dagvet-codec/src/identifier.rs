use cid::multihash::Multihash;
use cid::Version;
use dagvet_types::{Block, Cid, Value, DAG_CBOR, SHA2_256};
use sha2::{Digest, Sha256};

use crate::cbor;
use crate::error::{CidError, EncodeResult};

/// Hash functions usable for CID derivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha2_256,
}

impl HashAlgorithm {
    /// Multihash code of this algorithm.
    pub const fn code(&self) -> u64 {
        match self {
            Self::Sha2_256 => SHA2_256,
        }
    }

    /// Look up a multihash code; only sha2-256 is supported.
    pub fn from_code(code: u64) -> Result<Self, CidError> {
        match code {
            SHA2_256 => Ok(Self::Sha2_256),
            other => Err(CidError::UnsupportedHash(other)),
        }
    }

    fn multihash(&self, data: &[u8]) -> Multihash<64> {
        match self {
            Self::Sha2_256 => {
                let digest = Sha256::digest(data);
                Multihash::wrap(SHA2_256, &digest)
                    .expect("a 32-byte digest fits a 64-byte multihash")
            }
        }
    }
}

/// Derives content identifiers from canonical bytes.
///
/// A builder fixes the CID version, the content codec and the hash
/// function. Identical bytes under identical parameters always yield the same
/// CID; there is no other state involved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CidBuilder {
    version: Version,
    codec: u64,
    hash: HashAlgorithm,
}

impl CidBuilder {
    /// CIDv1, dag-cbor, sha2-256: the parameters used on the wire.
    pub const DAG_CBOR: Self = Self {
        version: Version::V1,
        codec: DAG_CBOR,
        hash: HashAlgorithm::Sha2_256,
    };

    /// Builder for arbitrary CID parameters.
    pub const fn new(version: Version, codec: u64, hash: HashAlgorithm) -> Self {
        Self {
            version,
            codec,
            hash,
        }
    }

    /// The builder that would have produced `cid`.
    pub fn for_cid(cid: &Cid) -> Result<Self, CidError> {
        Ok(Self {
            version: cid.version(),
            codec: cid.codec(),
            hash: HashAlgorithm::from_code(cid.hash().code())?,
        })
    }

    /// Compute the CID of `data` under this builder's parameters.
    pub fn identify(&self, data: &[u8]) -> Result<Cid, CidError> {
        let mh = self.hash.multihash(data);
        Cid::new(self.version, self.codec, mh)
            .map_err(|e| CidError::InvalidParameters(e.to_string()))
    }

    /// CID version produced by [`CidBuilder::identify`].
    pub fn version(&self) -> Version {
        self.version
    }

    /// Multicodec code stamped on produced CIDs.
    pub fn codec(&self) -> u64 {
        self.codec
    }

    /// Hash function applied to block bytes.
    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }
}

impl Default for CidBuilder {
    fn default() -> Self {
        Self::DAG_CBOR
    }
}

/// CID of canonical DAG-CBOR bytes (v1, dag-cbor, sha2-256).
pub fn identifier_of(data: &[u8]) -> Cid {
    Cid::new_v1(DAG_CBOR, HashAlgorithm::Sha2_256.multihash(data))
}

/// Check that `data` hashes to `expected`, using `expected`'s own
/// version, codec and hash function.
pub fn verify(data: &[u8], expected: &Cid) -> Result<bool, CidError> {
    let computed = CidBuilder::for_cid(expected)?.identify(data)?;
    Ok(computed == *expected)
}

/// Encode a value and derive its CID in one step.
pub fn encode_block(value: &Value) -> EncodeResult<(Cid, Block)> {
    let bytes = cbor::encode(value)?;
    let cid = identifier_of(&bytes);
    Ok((cid, Block::from(bytes)))
}
