use std::fmt;

use bytes::Bytes;

/// Immutable canonical bytes of one encoded value.
///
/// A block does not carry its own CID; the store keys it. Cloning is cheap
/// (reference-counted).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Block(Bytes);

impl Block {
    /// Wrap bytes as a block. No validation is performed.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self(data.into())
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Give up the underlying buffer.
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Copy the bytes out.
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({} bytes)", self.0.len())
    }
}

impl AsRef<[u8]> for Block {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Block {
    fn from(data: Vec<u8>) -> Self {
        Self(Bytes::from(data))
    }
}

impl From<&[u8]> for Block {
    fn from(data: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(data))
    }
}

impl From<Bytes> for Block {
    fn from(data: Bytes) -> Self {
        Self(data)
    }
}
