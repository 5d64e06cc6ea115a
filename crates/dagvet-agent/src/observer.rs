use async_trait::async_trait;
use dagvet_protocol::{tags, wrap, Finished, MessageBody, Verdict};
use dagvet_store::{MemoryBlockStore, Resolution, Resolver};
use dagvet_types::{Cid, Path, Value};
use tracing::info;

use crate::agent::AgentState;
use crate::channel::HostChannel;
use crate::error::AgentResult;

/// Handle returned by `Agent::subscribe`, used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverToken(pub(crate) u64);

/// The start transition as seen by an observer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StartedEvent {
    pub tip: Cid,
    /// `true` when delivered to an observer that subscribed after the start.
    pub replay: bool,
}

/// Reacts to the agent reaching `Started`.
///
/// Implementations typically resolve one or more paths from the tip and send
/// a `finished` verdict. Errors are recorded as agent diagnostics and do not
/// stop other observers from running.
#[async_trait]
pub trait StartObserver: Send + Sync {
    async fn on_start(&self, ctx: &mut StartContext<'_>) -> AgentResult<()>;
}

/// Writes envelopes to the host and tracks the `finished` transition.
pub(crate) struct Outbox<'a> {
    pub(crate) channel: &'a dyn HostChannel,
    pub(crate) state: &'a mut AgentState,
}

impl Outbox<'_> {
    pub(crate) fn send(&mut self, type_tag: &str, payload: &Value) -> AgentResult<()> {
        let bytes = wrap(type_tag, payload)?;
        self.channel.send_bytes(bytes)?;

        if type_tag == tags::FINISHED {
            if let AgentState::Started { tip } = *self.state {
                let result = Finished::from_value(payload)
                    .map(|f| f.result)
                    .unwrap_or_else(|_| Verdict::Other(String::new()));
                info!(tip = %tip, result = %result, "validation finished");
                *self.state = AgentState::Finished { tip, result };
            }
        }
        Ok(())
    }
}

/// What an observer gets to work with during [`StartObserver::on_start`].
pub struct StartContext<'a> {
    pub(crate) event: StartedEvent,
    pub(crate) store: &'a MemoryBlockStore,
    pub(crate) max_depth: usize,
    pub(crate) outbox: Outbox<'a>,
}

impl<'a> StartContext<'a> {
    /// The start being delivered.
    pub fn event(&self) -> StartedEvent {
        self.event
    }

    pub fn tip(&self) -> Cid {
        self.event.tip
    }

    pub fn store(&self) -> &MemoryBlockStore {
        self.store
    }

    /// A resolver over the agent's store with the configured hop limit.
    pub fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.store).with_max_depth(self.max_depth)
    }

    /// Resolve `path` starting from the tip.
    pub async fn resolve(&self, path: &Path) -> dagvet_store::StoreResult<Resolution> {
        self.resolver().resolve(self.event.tip, path).await
    }

    /// Current agent state; reflects any `finished` already sent.
    pub fn state(&self) -> &AgentState {
        &*self.outbox.state
    }

    /// Wrap `payload` under `type_tag` and write it to the host.
    pub fn send(&mut self, type_tag: &str, payload: &Value) -> AgentResult<()> {
        self.outbox.send(type_tag, payload)
    }

    /// Encode `message` under its own type tag and send it.
    pub fn send_message<M: MessageBody>(&mut self, message: &M) -> AgentResult<()> {
        self.outbox.send(M::TYPE_TAG, &message.to_value())
    }

    /// Send `finished` with `result`.
    pub fn finish(&mut self, result: Verdict) -> AgentResult<()> {
        self.send_message(&Finished { result })
    }
}
