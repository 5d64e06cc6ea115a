//! Host side of a validation: frame a `start`, run an agent over an
//! in-memory channel, and collect the verdict.

use std::sync::Arc;

use dagvet_protocol::{tags, Envelope, Finished, MessageBody, Start, Verdict};
use tracing::{debug, info};

use crate::agent::Agent;
use crate::channel::MemoryChannel;
use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult};
use crate::observer::StartObserver;

/// Run one validation of `start` with `observer` as the policy.
///
/// Returns the result of the first `finished` message the agent sends.
/// Fails with [`AgentError::Timeout`] when the agent does not settle within
/// the configured timeout and with [`AgentError::NoVerdict`] when it settles
/// without sending `finished`.
pub async fn validate(
    start: &Start,
    observer: Arc<dyn StartObserver>,
    config: &AgentConfig,
) -> AgentResult<Verdict> {
    let bytes = start.encode()?;
    let (channel, mut rx) = MemoryChannel::new();
    let mut agent = Agent::new(config.clone(), Box::new(channel));
    agent.subscribe(observer).await;

    let timeout = config.validation_timeout();
    tokio::time::timeout(timeout, agent.receive(&bytes))
        .await
        .map_err(|_| AgentError::Timeout(timeout))?;

    let last_diagnostic = agent.take_diagnostics().pop();
    drop(agent);

    while let Some(frame) = rx.recv().await {
        let envelope = Envelope::decode(&frame)?;
        if envelope.type_tag == tags::FINISHED {
            let finished = Finished::from_envelope(&envelope)?;
            info!(tip = %start.tip, result = %finished.result, "verdict received");
            return Ok(finished.result);
        }
        debug!(type_tag = %envelope.type_tag, "skipping host message");
    }

    Err(AgentError::NoVerdict {
        reason: last_diagnostic
            .map(|d| d.to_string())
            .unwrap_or_else(|| "agent sent no finished message".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::StartContext;
    use crate::policy::PathTruthyPolicy;
    use async_trait::async_trait;
    use dagvet_codec::encode_block;
    use dagvet_protocol::NodeBundle;
    use dagvet_types::Value;
    use std::time::Duration;

    fn start_for(value: &Value) -> Start {
        let (cid, block) = encode_block(value).unwrap();
        Start::new(cid, NodeBundle::Sequence(vec![block]))
    }

    struct Silent;

    #[async_trait]
    impl StartObserver for Silent {
        async fn on_start(&self, _ctx: &mut StartContext<'_>) -> AgentResult<()> {
            Ok(())
        }
    }

    struct Sleepy;

    #[async_trait]
    impl StartObserver for Sleepy {
        async fn on_start(&self, ctx: &mut StartContext<'_>) -> AgentResult<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            ctx.finish(Verdict::Ok)
        }
    }

    #[tokio::test]
    async fn ok_verdict() {
        let start = start_for(&Value::map([("tree", Value::map([("ok", Value::from(true))]))]));
        let verdict = validate(
            &start,
            Arc::new(PathTruthyPolicy::new("tree/ok")),
            &AgentConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(verdict, Verdict::Ok);
    }

    #[tokio::test]
    async fn invalid_verdict() {
        let start = start_for(&Value::map([("tree", Value::map([("ok", Value::from(false))]))]));
        let verdict = validate(
            &start,
            Arc::new(PathTruthyPolicy::new("tree/ok")),
            &AgentConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(verdict, Verdict::Invalid);
    }

    #[tokio::test]
    async fn silent_observer_is_no_verdict() {
        let start = start_for(&Value::Null);
        let err = validate(&start, Arc::new(Silent), &AgentConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::NoVerdict { .. }));
    }

    #[tokio::test]
    async fn rejected_start_reports_reason() {
        let (cid, _) = encode_block(&Value::from(1i64)).unwrap();
        let (_, other) = encode_block(&Value::from(2i64)).unwrap();
        let start = Start::new(cid, NodeBundle::Keyed(vec![(cid, other)]));

        let err = validate(&start, Arc::new(Silent), &AgentConfig::default())
            .await
            .unwrap_err();
        match err {
            AgentError::NoVerdict { reason } => assert!(reason.contains("mismatch")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn slow_observer_times_out() {
        let start = start_for(&Value::Null);
        let config = AgentConfig {
            validation_timeout_ms: 50,
            ..Default::default()
        };
        let err = validate(&start, Arc::new(Sleepy), &config).await.unwrap_err();
        assert!(matches!(err, AgentError::Timeout(d) if d == Duration::from_millis(50)));
    }
}
