//! Canonical DAG-CBOR encoding of [`Value`].
//!
//! The encoder is deterministic: structurally equal values always produce
//! identical bytes, which is what makes a block's hash usable as its identity.
//!
//! Canonical form:
//! - integer and length heads use the shortest encoding
//! - only definite-length strings, arrays and maps
//! - map keys are strings, sorted by encoded length and then bytewise
//! - floats are always 64-bit; NaN and infinities are rejected
//! - links are tag 42 over a byte string `0x00 || cid-bytes`
//!
//! The decoder is stricter than CBOR about shape (no tags other than 42, no
//! `undefined`, no duplicate keys) but accepts non-minimal heads and short
//! floats. Use [`decode_canonical`] to also reject non-canonical bytes.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use dagvet_types::{Cid, Value};
use minicbor::data::{Int, Tag, Type};
use minicbor::{Decoder, Encoder};

use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};

/// CBOR tag for IPLD links.
pub const CID_TAG: u64 = 42;

/// Deepest container nesting accepted by the encoder and decoder.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Encode a value to canonical DAG-CBOR.
pub fn encode(value: &Value) -> EncodeResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf);
    encode_value(&mut enc, value, 0)?;
    Ok(buf)
}

/// Decode one DAG-CBOR value. The whole input must be consumed.
pub fn decode(bytes: &[u8]) -> DecodeResult<Value> {
    let mut dec = Decoder::new(bytes);
    let value = decode_value(&mut dec, 0)?;
    if dec.position() != bytes.len() {
        return Err(DecodeError::TrailingBytes(dec.position()));
    }
    Ok(value)
}

/// Decode and additionally require that `bytes` is the canonical encoding of
/// the decoded value.
pub fn decode_canonical(bytes: &[u8]) -> DecodeResult<Value> {
    let value = decode(bytes)?;
    if encode(&value)? != bytes {
        return Err(DecodeError::NonCanonical);
    }
    Ok(value)
}

/// Length-first, then bytewise. Strings sort by their UTF-8 bytes, which is
/// the same as comparing the encoded keys since the heads are equal.
fn canonical_key_order(a: &str, b: &str) -> Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| a.as_bytes().cmp(b.as_bytes()))
}

fn encode_value(
    enc: &mut Encoder<&mut Vec<u8>>,
    value: &Value,
    depth: usize,
) -> EncodeResult<()> {
    if depth > MAX_NESTING_DEPTH {
        return Err(EncodeError::NestingTooDeep(MAX_NESTING_DEPTH));
    }
    match value {
        Value::Null => {
            enc.null()?;
        }
        Value::Bool(b) => {
            enc.bool(*b)?;
        }
        Value::Integer(i) => {
            let int = Int::try_from(*i).map_err(|_| EncodeError::IntegerOutOfRange(*i))?;
            enc.int(int)?;
        }
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(EncodeError::NonFiniteFloat(*f));
            }
            enc.f64(*f)?;
        }
        Value::String(s) => {
            enc.str(s)?;
        }
        Value::Bytes(b) => {
            enc.bytes(b)?;
        }
        Value::List(items) => {
            enc.array(items.len() as u64)?;
            for item in items {
                encode_value(enc, item, depth + 1)?;
            }
        }
        Value::Map(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|(a, _), (b, _)| canonical_key_order(a, b));
            enc.map(entries.len() as u64)?;
            for (key, item) in entries {
                enc.str(key)?;
                encode_value(enc, item, depth + 1)?;
            }
        }
        Value::Link(cid) => {
            encode_link(enc, cid)?;
        }
    }
    Ok(())
}

fn encode_link(enc: &mut Encoder<&mut Vec<u8>>, cid: &Cid) -> EncodeResult<()> {
    let cid_bytes = cid.to_bytes();
    let mut raw = Vec::with_capacity(cid_bytes.len() + 1);
    // Multibase identity prefix.
    raw.push(0x00);
    raw.extend_from_slice(&cid_bytes);
    enc.tag(Tag::new(CID_TAG))?;
    enc.bytes(&raw)?;
    Ok(())
}

fn decode_value(dec: &mut Decoder<'_>, depth: usize) -> DecodeResult<Value> {
    if depth > MAX_NESTING_DEPTH {
        return Err(DecodeError::NestingTooDeep(MAX_NESTING_DEPTH));
    }
    match dec.datatype()? {
        Type::Null => {
            dec.null()?;
            Ok(Value::Null)
        }
        Type::Bool => Ok(Value::Bool(dec.bool()?)),
        Type::U8
        | Type::U16
        | Type::U32
        | Type::U64
        | Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::Int => Ok(Value::Integer(i128::from(dec.int()?))),
        Type::F16 => Ok(Value::Float(f64::from(dec.f16()?))),
        Type::F32 => Ok(Value::Float(f64::from(dec.f32()?))),
        Type::F64 => Ok(Value::Float(dec.f64()?)),
        Type::String => Ok(Value::String(dec.str()?.to_string())),
        Type::Bytes => Ok(Value::Bytes(dec.bytes()?.to_vec())),
        Type::Array => {
            let len = dec.array()?.ok_or(DecodeError::IndefiniteLength)?;
            // The length is untrusted; let the vector grow past a small cap.
            let mut items = Vec::with_capacity(len.min(1024) as usize);
            for _ in 0..len {
                items.push(decode_value(dec, depth + 1)?);
            }
            Ok(Value::List(items))
        }
        Type::Map => {
            let len = dec.map()?.ok_or(DecodeError::IndefiniteLength)?;
            let mut map = BTreeMap::new();
            for _ in 0..len {
                let key = match dec.datatype()? {
                    Type::String => dec.str()?.to_string(),
                    Type::StringIndef => return Err(DecodeError::IndefiniteLength),
                    other => return Err(DecodeError::NonStringKey(format!("{other:?}"))),
                };
                let item = decode_value(dec, depth + 1)?;
                if map.contains_key(&key) {
                    return Err(DecodeError::DuplicateKey(key));
                }
                map.insert(key, item);
            }
            Ok(Value::Map(map))
        }
        Type::Tag => {
            let tag = dec.tag()?;
            if tag.as_u64() != CID_TAG {
                return Err(DecodeError::UnsupportedTag(tag.as_u64()));
            }
            decode_link(dec).map(Value::Link)
        }
        Type::BytesIndef | Type::StringIndef | Type::ArrayIndef | Type::MapIndef => {
            Err(DecodeError::IndefiniteLength)
        }
        other => Err(DecodeError::UnsupportedItem(format!("{other:?}"))),
    }
}

fn decode_link(dec: &mut Decoder<'_>) -> DecodeResult<Cid> {
    let raw = match dec.datatype()? {
        Type::Bytes => dec.bytes()?,
        other => {
            return Err(DecodeError::InvalidLink(format!(
                "tag 42 must wrap a byte string, found {other:?}"
            )))
        }
    };
    let Some((&0x00, cid_bytes)) = raw.split_first() else {
        return Err(DecodeError::InvalidLink(
            "missing multibase identity prefix".into(),
        ));
    };
    let cid = Cid::try_from(cid_bytes).map_err(|e| DecodeError::InvalidLink(e.to_string()))?;
    if cid.to_bytes().len() != cid_bytes.len() {
        return Err(DecodeError::InvalidLink("trailing bytes after CID".into()));
    }
    Ok(cid)
}
