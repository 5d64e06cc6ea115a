use std::collections::BTreeMap;

use bytes::Bytes;
use dagvet_codec::{decode, encode};
use dagvet_types::Value;

use crate::error::{ProtocolError, ProtocolResult};

/// Largest encoded envelope accepted by default.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024 * 1024;

const TYPE_KEY: &str = "type";
const PAYLOAD_KEY: &str = "payload";

/// The outer frame of every host message: a type tag and an opaque payload.
///
/// Encoded as the DAG-CBOR map `{type: string, payload: bytes}`, where the
/// payload bytes are themselves a DAG-CBOR value. Decoding an envelope only
/// touches the outer map, so a dispatcher can route on `type_tag` before
/// paying for the payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub type_tag: String,
    pub payload: Bytes,
}

impl Envelope {
    /// Frame already-encoded `payload` bytes under `type_tag`.
    pub fn new(type_tag: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            type_tag: type_tag.into(),
            payload: payload.into(),
        }
    }

    /// Encode `payload` and frame it under `type_tag`.
    pub fn from_value(type_tag: impl Into<String>, payload: &Value) -> ProtocolResult<Self> {
        Ok(Self::new(type_tag, encode(payload)?))
    }

    /// Canonical DAG-CBOR bytes of the outer map; fails over [`MAX_MESSAGE_SIZE`].
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        let mut map = BTreeMap::new();
        map.insert(TYPE_KEY.to_string(), Value::String(self.type_tag.clone()));
        map.insert(PAYLOAD_KEY.to_string(), Value::Bytes(self.payload.to_vec()));
        let buf = encode(&Value::Map(map))?;
        if buf.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::MessageTooLarge {
                size: buf.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        Ok(buf)
    }

    /// Decode the outer frame, rejecting input above [`MAX_MESSAGE_SIZE`].
    pub fn decode(data: &[u8]) -> ProtocolResult<Self> {
        Self::decode_with_limit(data, MAX_MESSAGE_SIZE)
    }

    /// Decode the outer frame, rejecting input above `max` bytes before any
    /// parsing happens.
    pub fn decode_with_limit(data: &[u8], max: usize) -> ProtocolResult<Self> {
        if data.len() > max {
            return Err(ProtocolError::MessageTooLarge {
                size: data.len(),
                max,
            });
        }

        let mut map = match decode(data)? {
            Value::Map(map) => map,
            other => {
                return Err(ProtocolError::MalformedEnvelope(format!(
                    "expected a map, found {}",
                    other.kind()
                )))
            }
        };

        let type_tag = match map.remove(TYPE_KEY) {
            Some(Value::String(s)) => s,
            Some(other) => {
                return Err(ProtocolError::MalformedEnvelope(format!(
                    "`type` must be a string, found {}",
                    other.kind()
                )))
            }
            None => return Err(ProtocolError::MalformedEnvelope("missing `type`".into())),
        };
        let payload = match map.remove(PAYLOAD_KEY) {
            Some(Value::Bytes(b)) => Bytes::from(b),
            Some(other) => {
                return Err(ProtocolError::MalformedEnvelope(format!(
                    "`payload` must be bytes, found {}",
                    other.kind()
                )))
            }
            None => {
                return Err(ProtocolError::MalformedEnvelope("missing `payload`".into()))
            }
        };
        if let Some(extra) = map.keys().next() {
            return Err(ProtocolError::MalformedEnvelope(format!(
                "unexpected key `{extra}`"
            )));
        }

        Ok(Self { type_tag, payload })
    }

    /// Decode the payload bytes.
    pub fn payload_value(&self) -> ProtocolResult<Value> {
        Ok(decode(&self.payload)?)
    }
}

/// Encode `payload`, then frame it as `{type, payload}`.
pub fn wrap(type_tag: &str, payload: &Value) -> ProtocolResult<Vec<u8>> {
    Envelope::from_value(type_tag, payload)?.encode()
}

/// Inverse of [`wrap`]: decode the frame and then its payload.
pub fn unwrap(data: &[u8]) -> ProtocolResult<(String, Value)> {
    let envelope = Envelope::decode(data)?;
    let value = envelope.payload_value()?;
    Ok((envelope.type_tag, value))
}
