//! Applying the pending set through the remote assignment port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CommitError, PortError};
use crate::model::{Resource, ResourceId, Task, TaskId};

use super::pending::{ChangeId, PendingChange, PendingChanges};

/// Remote side of the planner: the authoritative task and vehicle store.
#[async_trait]
pub trait AssignmentPort: Send + Sync {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, PortError>;

    async fn fetch_resources(&self) -> Result<Vec<Resource>, PortError>;

    async fn assign(&self, task: &TaskId, resource: &ResourceId) -> Result<Task, PortError>;

    async fn unassign(&self, task: &TaskId) -> Result<Task, PortError>;
}

/// How a batch reacts to a failed remote call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// Stop at the first failure. Applied changes stay applied and leave the
    /// pending set; the failed and untried ones remain.
    #[default]
    StopOnFirstFailure,
    /// Try every change. Applied ones leave the pending set, failed ones remain.
    ContinueOnFailure,
    /// Stop at the first failure and undo the already-applied changes, newest
    /// first. Every change remains pending.
    Compensate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeStatus {
    Applied,
    Failed(PortError),
    /// Not attempted because an earlier change failed.
    Skipped,
    /// Applied, then undone after a later failure.
    RolledBack,
    /// Applied, and the undo failed too; the remote side keeps the change.
    RollbackFailed(PortError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeOutcome {
    pub change_id: ChangeId,
    pub task_id: TaskId,
    pub status: ChangeStatus,
}

/// Per-change result of a commit, in the order changes were attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub policy: CommitPolicy,
    pub outcomes: Vec<ChangeOutcome>,
}

impl BatchReport {
    fn new(policy: CommitPolicy) -> Self {
        Self {
            policy,
            outcomes: Vec::new(),
        }
    }

    fn record(&mut self, change: &PendingChange, status: ChangeStatus) {
        self.outcomes.push(ChangeOutcome {
            change_id: change.id,
            task_id: change.task_id.clone(),
            status,
        });
    }

    fn set_status(&mut self, change_id: ChangeId, status: ChangeStatus) {
        if let Some(outcome) = self.outcomes.iter_mut().find(|o| o.change_id == change_id) {
            outcome.status = status;
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.status == ChangeStatus::Applied)
    }

    /// Changes whose effect is live on the remote side.
    pub fn applied(&self) -> Vec<ChangeId> {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o.status,
                    ChangeStatus::Applied | ChangeStatus::RollbackFailed(_)
                )
            })
            .map(|o| o.change_id)
            .collect()
    }

    pub fn failed(&self) -> Vec<&ChangeOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ChangeStatus::Failed(_)))
            .collect()
    }
}

async fn apply(port: &dyn AssignmentPort, change: &PendingChange) -> Result<Task, PortError> {
    match &change.proposed {
        Some(resource) => port.assign(&change.task_id, resource).await,
        None => port.unassign(&change.task_id).await,
    }
}

async fn undo(port: &dyn AssignmentPort, change: &PendingChange) -> Result<Task, PortError> {
    match &change.original {
        Some(resource) => port.assign(&change.task_id, resource).await,
        None => port.unassign(&change.task_id).await,
    }
}

/// Apply every pending change through `port`, one call at a time, in the
/// order the changes were created.
///
/// On full success the pending set is emptied. Otherwise the set is trimmed
/// according to `policy` and the first failure is returned with the full
/// report.
pub async fn commit_all(
    pending: &mut PendingChanges,
    port: &dyn AssignmentPort,
    policy: CommitPolicy,
) -> Result<BatchReport, CommitError> {
    let batch: Vec<PendingChange> = pending.iter().cloned().collect();
    let mut report = BatchReport::new(policy);
    let mut first_failure: Option<(ChangeId, TaskId, PortError)> = None;
    let mut applied: Vec<&PendingChange> = Vec::new();

    info!(count = batch.len(), ?policy, "committing pending changes");

    for change in &batch {
        if first_failure.is_some() && policy != CommitPolicy::ContinueOnFailure {
            report.record(change, ChangeStatus::Skipped);
            continue;
        }
        match apply(port, change).await {
            Ok(_) => {
                debug!(change = %change.id, task = %change.task_id, to = ?change.proposed, "change applied");
                applied.push(change);
                report.record(change, ChangeStatus::Applied);
            }
            Err(err) => {
                warn!(change = %change.id, task = %change.task_id, error = %err, "change failed");
                report.record(change, ChangeStatus::Failed(err.clone()));
                if first_failure.is_none() {
                    first_failure = Some((change.id, change.task_id.clone(), err));
                }
            }
        }
    }

    let Some((failed, task_id, source)) = first_failure else {
        pending.clear();
        info!(count = batch.len(), "commit complete");
        return Ok(report);
    };

    if policy == CommitPolicy::Compensate {
        for change in applied.iter().rev() {
            match undo(port, change).await {
                Ok(_) => {
                    debug!(change = %change.id, task = %change.task_id, "change rolled back");
                    report.set_status(change.id, ChangeStatus::RolledBack);
                }
                Err(err) => {
                    warn!(change = %change.id, task = %change.task_id, error = %err, "rollback failed");
                    report.set_status(change.id, ChangeStatus::RollbackFailed(err));
                }
            }
        }
    } else {
        pending.discard(&report.applied());
    }

    warn!(
        change = %failed,
        task = %task_id,
        remaining = pending.len(),
        "commit stopped with pending changes left"
    );
    Err(CommitError {
        failed,
        task_id,
        source,
        report,
    })
}
