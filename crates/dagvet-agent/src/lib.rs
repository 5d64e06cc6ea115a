//! Embedded validation agent for dagvet.
//!
//! An [`Agent`] sits behind a [`HostChannel`]. The host delivers a `start`
//! envelope carrying a tip CID and the blocks under it; the agent rebuilds a
//! content-addressed store from those blocks, then runs every registered
//! [`StartObserver`]. Observers resolve paths from the tip and report a
//! verdict with `finished`.
//!
//! # Key Types
//!
//! - [`Agent`] -- state machine owning the store and the observer list
//! - [`AgentConfig`] -- limits and verification settings, loadable from TOML
//! - [`StartObserver`] / [`StartContext`] -- the policy hook
//! - [`PathTruthyPolicy`] -- built-in policy: truthy value at a path is `ok`
//! - [`HostBridge`] -- synchronous callback adapter
//! - [`host::validate`] -- drive one validation end to end

pub mod agent;
pub mod bridge;
pub mod channel;
pub mod config;
pub mod error;
pub mod host;
pub mod observer;
pub mod policy;

pub use agent::{Agent, AgentState, Diagnostic, Dispatch};
pub use bridge::HostBridge;
pub use channel::{HostChannel, MemoryChannel};
pub use config::AgentConfig;
pub use error::{AgentError, AgentResult, ChannelError};
pub use observer::{ObserverToken, StartContext, StartObserver, StartedEvent};
pub use policy::PathTruthyPolicy;

pub use dagvet_protocol::Verdict;
