use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;
use tracing::warn;

/// 节点运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Running,
    Success,
    Failed,
}

impl ExecutionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::Running => "RUNNING",
            ExecutionStatus::Success => "SUCCESS",
            ExecutionStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Holds the status of one node run.
///
/// Starts at `Running` and accepts exactly one terminal transition. Other
/// tasks observe it through [`StatusCell::subscribe`]; only the owner can
/// write.
#[derive(Debug)]
pub struct StatusCell {
    tx: watch::Sender<ExecutionStatus>,
}

impl StatusCell {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ExecutionStatus::Running);
        Self { tx }
    }

    pub fn get(&self) -> ExecutionStatus {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ExecutionStatus> {
        self.tx.subscribe()
    }

    /// Moves the run into `terminal`. Returns false (and leaves the status
    /// untouched) if the run already finished or `terminal` is `Running`.
    pub(crate) fn finish(&self, terminal: ExecutionStatus) -> bool {
        if !terminal.is_terminal() {
            warn!("Refusing to move a run back to {}", terminal);
            return false;
        }
        let changed = self.tx.send_if_modified(|current| {
            if current.is_terminal() {
                return false;
            }
            *current = terminal;
            true
        });
        if !changed {
            warn!(
                current = %self.get(),
                requested = %terminal,
                "Run already finished, ignoring transition"
            );
        }
        changed
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits until the observed run reaches a terminal status.
///
/// Returns `None` if the run was dropped while still `Running`.
pub async fn wait_for_terminal(
    rx: &mut watch::Receiver<ExecutionStatus>,
) -> Option<ExecutionStatus> {
    rx.wait_for(|status| status.is_terminal())
        .await
        .ok()
        .map(|status| *status)
}
