use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::agent::Agent;
use crate::error::AgentResult;
use crate::observer::{ObserverToken, StartObserver};

/// Adapts an [`Agent`] to a host that delivers messages through a plain
/// synchronous callback.
///
/// Each delivery blocks a private current-thread runtime until the agent has
/// finished handling it. Must not be driven from inside another tokio
/// runtime.
pub struct HostBridge {
    runtime: Runtime,
    agent: Agent,
}

impl HostBridge {
    /// Wrap `agent` with its own current-thread runtime.
    pub fn new(agent: Agent) -> AgentResult<Self> {
        let runtime = Builder::new_current_thread().enable_time().build()?;
        Ok(Self { runtime, agent })
    }

    /// Host callback: handle one inbound buffer to completion.
    pub fn on_receive(&mut self, data: &[u8]) {
        self.runtime.block_on(self.agent.receive(data));
    }

    /// Blocking form of [`Agent::subscribe`].
    pub fn subscribe(&mut self, observer: Arc<dyn StartObserver>) -> ObserverToken {
        self.runtime.block_on(self.agent.subscribe(observer))
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn agent_mut(&mut self) -> &mut Agent {
        &mut self.agent
    }

    /// Drop the runtime and hand back the agent.
    pub fn into_agent(self) -> Agent {
        self.agent
    }
}

impl std::fmt::Debug for HostBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostBridge").field("agent", &self.agent).finish()
    }
}
