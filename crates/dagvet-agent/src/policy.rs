use async_trait::async_trait;
use dagvet_protocol::Verdict;
use dagvet_types::Path;
use tracing::debug;

use crate::error::AgentResult;
use crate::observer::{StartContext, StartObserver};

/// Reports `ok` when the value at `path` below the tip is truthy.
///
/// A falsy value, or any failure to resolve the path (missing block, missing
/// key, hop limit), reports `invalid`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathTruthyPolicy {
    path: Path,
}

impl PathTruthyPolicy {
    /// Policy that checks the value at `path`.
    pub fn new(path: impl Into<Path>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StartObserver for PathTruthyPolicy {
    async fn on_start(&self, ctx: &mut StartContext<'_>) -> AgentResult<()> {
        let verdict = match ctx.resolve(&self.path).await {
            Ok(res) if res.value.is_truthy() => Verdict::Ok,
            Ok(res) => {
                debug!(path = %self.path, kind = %res.value.kind(), "falsy value");
                Verdict::Invalid
            }
            Err(err) => {
                debug!(path = %self.path, error = %err, "path did not resolve");
                Verdict::Invalid
            }
        };
        ctx.finish(verdict)
    }
}
