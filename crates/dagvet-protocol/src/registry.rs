use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;
use dagvet_types::Value;
use tracing::debug;

use crate::envelope::{Envelope, MAX_MESSAGE_SIZE};
use crate::error::ProtocolResult;
use crate::message::{Finished, GetNode, GetNodeResponse, MessageBody, Start};

/// Every message an agent can receive.
///
/// Tags with no registered decoder land in `Unrecognized` with their payload
/// left undecoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Message {
    Start(Start),
    Finished(Finished),
    GetNode(GetNode),
    GetNodeResponse(GetNodeResponse),
    Unrecognized { type_tag: String, payload: Bytes },
}

impl Message {
    /// Tag carried on the wire.
    pub fn type_tag(&self) -> &str {
        match self {
            Self::Start(_) => Start::TYPE_TAG,
            Self::Finished(_) => Finished::TYPE_TAG,
            Self::GetNode(_) => GetNode::TYPE_TAG,
            Self::GetNodeResponse(_) => GetNodeResponse::TYPE_TAG,
            Self::Unrecognized { type_tag, .. } => type_tag.as_str(),
        }
    }

    /// Variant name for logs.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Start(_) => "Start",
            Self::Finished(_) => "Finished",
            Self::GetNode(_) => "GetNode",
            Self::GetNodeResponse(_) => "GetNodeResponse",
            Self::Unrecognized { .. } => "Unrecognized",
        }
    }

    /// Re-frame the message as an envelope.
    pub fn to_envelope(&self) -> ProtocolResult<Envelope> {
        match self {
            Self::Start(m) => m.to_envelope(),
            Self::Finished(m) => m.to_envelope(),
            Self::GetNode(m) => m.to_envelope(),
            Self::GetNodeResponse(m) => m.to_envelope(),
            Self::Unrecognized { type_tag, payload } => {
                Ok(Envelope::new(type_tag.clone(), payload.clone()))
            }
        }
    }

    /// Encode straight to wire bytes.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        self.to_envelope()?.encode()
    }
}

/// Turns a decoded payload into a [`Message`].
pub type Decoder = fn(&Value) -> ProtocolResult<Message>;

/// Maps type tags to payload decoders.
#[derive(Clone)]
pub struct MessageRegistry {
    decoders: HashMap<String, Decoder>,
    max_message_bytes: usize,
}

impl MessageRegistry {
    /// A registry that knows no tags: everything decodes as `Unrecognized`.
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
            max_message_bytes: MAX_MESSAGE_SIZE,
        }
    }

    /// The four built-in message types.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(Start::TYPE_TAG, |v| Start::from_value(v).map(Message::Start));
        registry.register(Finished::TYPE_TAG, |v| {
            Finished::from_value(v).map(Message::Finished)
        });
        registry.register(GetNode::TYPE_TAG, |v| GetNode::from_value(v).map(Message::GetNode));
        registry.register(GetNodeResponse::TYPE_TAG, |v| {
            GetNodeResponse::from_value(v).map(Message::GetNodeResponse)
        });
        registry
    }

    /// Replace the inbound size limit.
    pub fn with_max_message_bytes(mut self, max: usize) -> Self {
        self.max_message_bytes = max;
        self
    }

    pub fn max_message_bytes(&self) -> usize {
        self.max_message_bytes
    }

    /// Register (or replace) the decoder for `type_tag`.
    pub fn register(&mut self, type_tag: impl Into<String>, decoder: Decoder) {
        self.decoders.insert(type_tag.into(), decoder);
    }

    /// True when a decoder is registered for `type_tag`.
    pub fn is_registered(&self, type_tag: &str) -> bool {
        self.decoders.contains_key(type_tag)
    }

    /// Decode envelope bytes into a message.
    pub fn decode(&self, data: &[u8]) -> ProtocolResult<Message> {
        let envelope = Envelope::decode_with_limit(data, self.max_message_bytes)?;
        self.decode_envelope(envelope)
    }

    /// Decode the payload of an already-framed envelope.
    pub fn decode_envelope(&self, envelope: Envelope) -> ProtocolResult<Message> {
        match self.decoders.get(&envelope.type_tag) {
            Some(decoder) => {
                debug!(type_tag = %envelope.type_tag, bytes = envelope.payload.len(), "decoding payload");
                decoder(&envelope.payload_value()?)
            }
            None => Ok(Message::Unrecognized {
                type_tag: envelope.type_tag,
                payload: envelope.payload,
            }),
        }
    }
}

impl Default for MessageRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for MessageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.decoders.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("MessageRegistry")
            .field("tags", &tags)
            .field("max_message_bytes", &self.max_message_bytes)
            .finish()
    }
}
