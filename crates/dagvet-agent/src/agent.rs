use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use dagvet_codec::identifier_of;
use dagvet_protocol::{
    tags, Envelope, GetNode, GetNodeResponse, Message, MessageBody, MessageRegistry, NodeBundle,
    Start, Verdict,
};
use dagvet_store::{BlockStore, MemoryBlockStore};
use dagvet_types::{Block, Cid, CidDisplay, Value};
use tracing::{debug, info, warn};

use crate::channel::HostChannel;
use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult};
use crate::observer::{ObserverToken, Outbox, StartContext, StartObserver, StartedEvent};

/// Lifecycle of an agent. The tip is set once and never changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentState {
    Uninitialized,
    Started { tip: Cid },
    Finished { tip: Cid, result: Verdict },
}

impl AgentState {
    /// The accepted tip, once a start has been handled.
    pub fn tip(&self) -> Option<Cid> {
        match self {
            Self::Uninitialized => None,
            Self::Started { tip } | Self::Finished { tip, .. } => Some(*tip),
        }
    }

    /// True once a start has been accepted.
    pub fn is_started(&self) -> bool {
        !matches!(self, Self::Uninitialized)
    }

    /// The verdict sent to the host, if any.
    pub fn result(&self) -> Option<&Verdict> {
        match self {
            Self::Finished { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// What handling one inbound message did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// `start` accepted: blocks stored, observers notified.
    Started { tip: Cid, nodes: usize },
    /// `getnoderesponse` block stored.
    Stored { cid: Cid },
    /// `getnode` answered with the block.
    Answered { cid: Cid },
    /// `getnode` for a block the store does not hold.
    Missing { cid: Cid },
    /// Message with no effect on an agent (inbound `finished`, unknown tags).
    Ignored { type_tag: String },
}

/// A problem the agent noticed but did not report to the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// Tag of the message being handled, when it could be read.
    pub type_tag: Option<String>,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.type_tag {
            Some(tag) => write!(f, "[{tag}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// The validation agent.
///
/// Owns a block store that is filled from the host's `start` message, and
/// hands control to registered [`StartObserver`]s once the tip is known.
/// One message is handled at a time, in delivery order.
pub struct Agent {
    config: AgentConfig,
    channel: Box<dyn HostChannel>,
    registry: MessageRegistry,
    store: MemoryBlockStore,
    state: AgentState,
    observers: Vec<(ObserverToken, Arc<dyn StartObserver>)>,
    next_token: u64,
    diagnostics: VecDeque<Diagnostic>,
}

impl Agent {
    /// Agent with an empty store, writing outbound frames to `channel`.
    pub fn new(config: AgentConfig, channel: Box<dyn HostChannel>) -> Self {
        let registry = MessageRegistry::standard().with_max_message_bytes(config.max_message_bytes);
        Self {
            config,
            channel,
            registry,
            store: MemoryBlockStore::new(),
            state: AgentState::Uninitialized,
            observers: Vec::new(),
            next_token: 0,
            diagnostics: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    /// Shorthand for `self.state().tip()`.
    pub fn tip(&self) -> Option<Cid> {
        self.state.tip()
    }

    pub fn store(&self) -> &MemoryBlockStore {
        &self.store
    }

    /// Problems recorded by [`Agent::receive`], oldest first.
    pub fn diagnostics(&self) -> &VecDeque<Diagnostic> {
        &self.diagnostics
    }

    /// Drain the diagnostic log.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain(..).collect()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    /// Entry point for host deliveries. Never fails: anything that goes
    /// wrong becomes a [`Diagnostic`] and the agent stays usable.
    pub async fn receive(&mut self, data: &[u8]) {
        match self.handle(data).await {
            Ok(Dispatch::Ignored { type_tag }) => {
                self.record(Some(type_tag), "message ignored".to_string());
            }
            Ok(dispatch) => debug!(?dispatch, "message handled"),
            Err(err) => {
                let type_tag = Envelope::decode_with_limit(data, self.config.max_message_bytes)
                    .ok()
                    .map(|env| env.type_tag);
                self.record(type_tag, err.to_string());
            }
        }
    }

    /// Decode and act on one envelope.
    pub async fn handle(&mut self, data: &[u8]) -> AgentResult<Dispatch> {
        let message = self.registry.decode(data)?;
        debug!(type_tag = message.type_tag(), bytes = data.len(), "received message");

        match message {
            Message::Start(start) => self.start(start).await,
            Message::GetNodeResponse(response) => {
                let cid = response.cid;
                self.store_node(cid, response.node)?;
                Ok(Dispatch::Stored { cid })
            }
            Message::GetNode(request) => self.answer(request),
            Message::Finished(_) => Ok(Dispatch::Ignored {
                type_tag: tags::FINISHED.to_string(),
            }),
            Message::Unrecognized { type_tag, .. } => Ok(Dispatch::Ignored { type_tag }),
        }
    }

    async fn start(&mut self, start: Start) -> AgentResult<Dispatch> {
        if let Some(tip) = self.state.tip() {
            return Err(AgentError::AlreadyStarted { tip });
        }

        let nodes = start.nodes.len();
        let staged = self.stage(start.nodes)?;
        self.store.merge(staged);
        self.state = AgentState::Started { tip: start.tip };
        info!(tip = %start.tip, nodes, "agent started");

        let observers = self.observers.iter().map(|(_, o)| Arc::clone(o)).collect();
        self.notify(observers, false).await;

        Ok(Dispatch::Started {
            tip: start.tip,
            nodes,
        })
    }

    /// Build the blocks of a `start` in a scratch store so that one bad node
    /// leaves the real store untouched.
    fn stage(&self, nodes: NodeBundle) -> AgentResult<MemoryBlockStore> {
        let mut staging = MemoryBlockStore::new();
        match nodes {
            NodeBundle::Sequence(blocks) => {
                for block in blocks {
                    staging.put_trusted(identifier_of(block.as_bytes()), block);
                }
            }
            NodeBundle::Keyed(pairs) => {
                for (cid, block) in pairs {
                    if self.config.verify_blocks {
                        staging.put_verified(cid, block)?;
                    } else {
                        staging.put_trusted(cid, block);
                    }
                }
            }
        }
        Ok(staging)
    }

    fn store_node(&mut self, cid: Cid, node: Block) -> AgentResult<()> {
        if self.config.verify_blocks {
            self.store.put_verified(cid, node)?;
        } else {
            self.store.put_trusted(cid, node);
        }
        Ok(())
    }

    fn answer(&mut self, request: GetNode) -> AgentResult<Dispatch> {
        let cid = request.cid;
        match self.store.get(&cid) {
            Some(node) => {
                self.send_message(&GetNodeResponse { cid, node })?;
                Ok(Dispatch::Answered { cid })
            }
            None => {
                debug!(cid = %CidDisplay(&cid), "requested node not held");
                Ok(Dispatch::Missing { cid })
            }
        }
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    /// Wrap `payload` under `type_tag` and write it to the host.
    ///
    /// Sending `finished` while started moves the agent to
    /// [`AgentState::Finished`]. Later sends are still delivered.
    pub fn send(&mut self, type_tag: &str, payload: &Value) -> AgentResult<()> {
        Outbox {
            channel: &*self.channel,
            state: &mut self.state,
        }
        .send(type_tag, payload)
    }

    /// Encode `message` under its own type tag and send it.
    pub fn send_message<M: MessageBody>(&mut self, message: &M) -> AgentResult<()> {
        self.send(M::TYPE_TAG, &message.to_value())
    }

    // -----------------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------------

    /// Register an observer. If the agent has already started, the start is
    /// replayed to this observer alone before returning.
    pub async fn subscribe(&mut self, observer: Arc<dyn StartObserver>) -> ObserverToken {
        let token = ObserverToken(self.next_token);
        self.next_token += 1;
        self.observers.push((token, Arc::clone(&observer)));

        if self.state.is_started() {
            self.notify(vec![observer], true).await;
        }
        token
    }

    /// Remove an observer. Returns `false` for an unknown token.
    pub fn unsubscribe(&mut self, token: ObserverToken) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(t, _)| *t != token);
        self.observers.len() != before
    }

    async fn notify(&mut self, observers: Vec<Arc<dyn StartObserver>>, replay: bool) {
        let Some(tip) = self.state.tip() else {
            return;
        };

        let mut failures = Vec::new();
        {
            let mut ctx = StartContext {
                event: StartedEvent { tip, replay },
                store: &self.store,
                max_depth: self.config.max_resolution_depth,
                outbox: Outbox {
                    channel: &*self.channel,
                    state: &mut self.state,
                },
            };
            for observer in &observers {
                if let Err(err) = observer.on_start(&mut ctx).await {
                    failures.push(err);
                }
            }
        }

        for err in failures {
            self.record(
                Some(tags::START.to_string()),
                format!("observer failed: {err}"),
            );
        }
    }

    fn record(&mut self, type_tag: Option<String>, message: String) {
        warn!(type_tag = type_tag.as_deref().unwrap_or("-"), "{message}");
        if self.config.max_diagnostics == 0 {
            return;
        }
        while self.diagnostics.len() >= self.config.max_diagnostics {
            self.diagnostics.pop_front();
        }
        self.diagnostics.push_back(Diagnostic { type_tag, message });
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("state", &self.state)
            .field("blocks", &self.store.len())
            .field("observers", &self.observers.len())
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}
