use std::collections::BTreeMap;
use std::fmt;

use dagvet_types::{parse_cid, Block, Cid, Value};

use crate::envelope::Envelope;
use crate::error::{ProtocolError, ProtocolResult};

/// Wire type tags.
pub mod tags {
    pub const START: &str = "start";
    pub const FINISHED: &str = "finished";
    pub const GET_NODE: &str = "getnode";
    pub const GET_NODE_RESPONSE: &str = "getnoderesponse";
}

/// A typed message payload with a fixed wire tag.
pub trait MessageBody: Sized {
    const TYPE_TAG: &'static str;

    fn to_value(&self) -> Value;

    fn from_value(value: &Value) -> ProtocolResult<Self>;

    fn to_envelope(&self) -> ProtocolResult<Envelope> {
        Envelope::from_value(Self::TYPE_TAG, &self.to_value())
    }

    /// Encode as a complete envelope.
    fn encode(&self) -> ProtocolResult<Vec<u8>> {
        self.to_envelope()?.encode()
    }

    fn from_envelope(envelope: &Envelope) -> ProtocolResult<Self> {
        if envelope.type_tag != Self::TYPE_TAG {
            return Err(ProtocolError::UnexpectedType {
                expected: Self::TYPE_TAG.to_string(),
                found: envelope.type_tag.clone(),
            });
        }
        Self::from_value(&envelope.payload_value()?)
    }
}

// ---------------------------------------------------------------------------
// Payload field helpers
// ---------------------------------------------------------------------------

fn payload_map<'a>(tag: &str, value: &'a Value) -> ProtocolResult<&'a BTreeMap<String, Value>> {
    value.as_map().ok_or_else(|| {
        ProtocolError::invalid(tag, format!("payload must be a map, found {}", value.kind()))
    })
}

fn link_field(tag: &str, map: &BTreeMap<String, Value>, key: &str) -> ProtocolResult<Cid> {
    match map.get(key) {
        Some(Value::Link(cid)) => Ok(*cid),
        Some(other) => Err(ProtocolError::invalid(
            tag,
            format!("`{key}` must be a link, found {}", other.kind()),
        )),
        None => Err(ProtocolError::invalid(tag, format!("missing `{key}`"))),
    }
}

fn block_of(tag: &str, what: &str, value: &Value) -> ProtocolResult<Block> {
    value
        .as_bytes()
        .map(Block::from)
        .ok_or_else(|| ProtocolError::invalid(tag, format!("{what} must be bytes, found {}", value.kind())))
}

// ---------------------------------------------------------------------------
// start
// ---------------------------------------------------------------------------

/// The blocks carried by a `start` message.
///
/// Two wire forms exist. A list of byte strings leaves the receiver to derive
/// each key. A map from CID text to bytes asserts the keys, which the receiver
/// may verify.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeBundle {
    Sequence(Vec<Block>),
    Keyed(Vec<(Cid, Block)>),
}

impl NodeBundle {
    /// Number of blocks carried.
    pub fn len(&self) -> usize {
        match self {
            Self::Sequence(blocks) => blocks.len(),
            Self::Keyed(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Sequence(blocks) => {
                Value::List(blocks.iter().map(|b| Value::Bytes(b.to_vec())).collect())
            }
            Self::Keyed(pairs) => Value::Map(
                pairs
                    .iter()
                    .map(|(cid, b)| (cid.to_string(), Value::Bytes(b.to_vec())))
                    .collect(),
            ),
        }
    }

    fn from_value(value: &Value) -> ProtocolResult<Self> {
        let tag = tags::START;
        match value {
            Value::List(items) => items
                .iter()
                .map(|item| block_of(tag, "node", item))
                .collect::<ProtocolResult<Vec<_>>>()
                .map(Self::Sequence),
            Value::Map(map) => map
                .iter()
                .map(|(key, item)| {
                    let cid = parse_cid(key)
                        .map_err(|e| ProtocolError::invalid(tag, format!("node key: {e}")))?;
                    Ok((cid, block_of(tag, "node", item)?))
                })
                .collect::<ProtocolResult<Vec<_>>>()
                .map(Self::Keyed),
            other => Err(ProtocolError::invalid(
                tag,
                format!("`nodes` must be a list or map, found {}", other.kind()),
            )),
        }
    }
}

impl Default for NodeBundle {
    fn default() -> Self {
        Self::Sequence(Vec::new())
    }
}

/// Host → agent: the tip to validate and the blocks reachable from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Start {
    pub tip: Cid,
    pub nodes: NodeBundle,
}

impl Start {
    /// Start message for `tip` carrying `nodes`.
    pub fn new(tip: Cid, nodes: NodeBundle) -> Self {
        Self { tip, nodes }
    }
}

impl MessageBody for Start {
    const TYPE_TAG: &'static str = tags::START;

    fn to_value(&self) -> Value {
        Value::map([("tip", Value::Link(self.tip)), ("nodes", self.nodes.to_value())])
    }

    fn from_value(value: &Value) -> ProtocolResult<Self> {
        let map = payload_map(Self::TYPE_TAG, value)?;
        let tip = link_field(Self::TYPE_TAG, map, "tip")?;
        let nodes = match map.get("nodes") {
            Some(nodes) => NodeBundle::from_value(nodes)?,
            None => NodeBundle::default(),
        };
        Ok(Self { tip, nodes })
    }
}

// ---------------------------------------------------------------------------
// finished
// ---------------------------------------------------------------------------

/// Outcome carried by a `finished` message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Verdict {
    Ok,
    Invalid,
    /// Any other result string, carried through untouched.
    Other(String),
}

impl Verdict {
    /// Wire form of the verdict.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ok => "ok",
            Self::Invalid => "invalid",
            Self::Other(s) => s.as_str(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl From<&str> for Verdict {
    fn from(s: &str) -> Self {
        match s {
            "ok" => Self::Ok,
            "invalid" => Self::Invalid,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Agent → host: the validation result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finished {
    pub result: Verdict,
}

impl Finished {
    pub fn ok() -> Self {
        Self { result: Verdict::Ok }
    }

    pub fn invalid() -> Self {
        Self {
            result: Verdict::Invalid,
        }
    }
}

impl MessageBody for Finished {
    const TYPE_TAG: &'static str = tags::FINISHED;

    fn to_value(&self) -> Value {
        Value::map([("result", Value::from(self.result.as_str()))])
    }

    fn from_value(value: &Value) -> ProtocolResult<Self> {
        let map = payload_map(Self::TYPE_TAG, value)?;
        match map.get("result") {
            Some(Value::String(s)) => Ok(Self {
                result: Verdict::from(s.as_str()),
            }),
            Some(other) => Err(ProtocolError::invalid(
                Self::TYPE_TAG,
                format!("`result` must be a string, found {}", other.kind()),
            )),
            None => Err(ProtocolError::invalid(Self::TYPE_TAG, "missing `result`")),
        }
    }
}

// ---------------------------------------------------------------------------
// getnode / getnoderesponse
// ---------------------------------------------------------------------------

/// Request for a single block by CID.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetNode {
    pub cid: Cid,
}

impl MessageBody for GetNode {
    const TYPE_TAG: &'static str = tags::GET_NODE;

    fn to_value(&self) -> Value {
        Value::map([("cid", Value::Link(self.cid))])
    }

    fn from_value(value: &Value) -> ProtocolResult<Self> {
        let map = payload_map(Self::TYPE_TAG, value)?;
        Ok(Self {
            cid: link_field(Self::TYPE_TAG, map, "cid")?,
        })
    }
}

/// Answer to [`GetNode`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetNodeResponse {
    pub cid: Cid,
    pub node: Block,
}

impl MessageBody for GetNodeResponse {
    const TYPE_TAG: &'static str = tags::GET_NODE_RESPONSE;

    fn to_value(&self) -> Value {
        Value::map([
            ("cid", Value::Link(self.cid)),
            ("node", Value::Bytes(self.node.to_vec())),
        ])
    }

    fn from_value(value: &Value) -> ProtocolResult<Self> {
        let map = payload_map(Self::TYPE_TAG, value)?;
        let cid = link_field(Self::TYPE_TAG, map, "cid")?;
        let node = match map.get("node") {
            Some(node) => block_of(Self::TYPE_TAG, "`node`", node)?,
            None => return Err(ProtocolError::invalid(Self::TYPE_TAG, "missing `node`")),
        };
        Ok(Self { cid, node })
    }
}
