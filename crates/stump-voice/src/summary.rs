//! Rolling conversation summary used to rehydrate context after restart.

use std::sync::Arc;

use tokio::sync::watch;

/// A short model-produced digest of recent dialogue.
///
/// `version` strictly increases on every successful update, so a consumer
/// can record the version before requesting a summary and later tell
/// "produced since the request" from "stale" without races.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollingSummary {
    pub text: String,
    pub version: u64,
}

/// Shared cell holding the latest summary.
///
/// The internal summary tool writes through `record`; the restart
/// coordinator waits on `subscribe()` with a bounded timeout.
#[derive(Clone)]
pub struct SummaryCell {
    tx: Arc<watch::Sender<RollingSummary>>,
}

impl SummaryCell {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(RollingSummary::default());
        Self { tx: Arc::new(tx) }
    }

    /// Store a new summary, bumping the version.
    pub fn record(&self, text: impl Into<String>) {
        self.tx.send_modify(|summary| {
            summary.text = text.into();
            summary.version += 1;
        });
        tracing::debug!(version = self.tx.borrow().version, "rolling summary updated");
    }

    pub fn current(&self) -> RollingSummary {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RollingSummary> {
        self.tx.subscribe()
    }
}

impl Default for SummaryCell {
    fn default() -> Self {
        Self::new()
    }
}
