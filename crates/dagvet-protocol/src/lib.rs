//! Host message protocol for dagvet.
//!
//! Every message between an agent and its host is an [`Envelope`]: a
//! DAG-CBOR map `{type, payload}` whose payload is a second, independently
//! encoded DAG-CBOR value. Typed bodies implement [`MessageBody`]; the
//! [`MessageRegistry`] routes incoming envelopes to them by tag.

pub mod envelope;
pub mod error;
pub mod message;
pub mod registry;

pub use envelope::{unwrap, wrap, Envelope, MAX_MESSAGE_SIZE};
pub use error::{ProtocolError, ProtocolResult};
pub use message::{
    tags, Finished, GetNode, GetNodeResponse, MessageBody, NodeBundle, Start, Verdict,
};
pub use registry::{Decoder, Message, MessageRegistry};
