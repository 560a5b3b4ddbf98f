use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{PlannerError, Result};
use crate::model::{ResourceId, Task, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(Uuid);

impl ChangeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChangeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A staged reassignment of one task. `None` means unassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChange {
    pub id: ChangeId,
    pub task_id: TaskId,
    pub original: Option<ResourceId>,
    pub proposed: Option<ResourceId>,
}

impl PendingChange {
    pub fn is_unassign(&self) -> bool {
        self.proposed.is_none()
    }
}

/// What a call to [`PendingChanges::propose`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposeOutcome {
    /// First move of the task in this session.
    Created(ChangeId),
    /// The task was already pending; only the target changed.
    Updated(ChangeId),
    /// The task went back to where it started; its entry was dropped.
    Collapsed,
    /// The target is where the task already is.
    NoOp,
}

/// The session's staged reassignments, at most one per task, in creation order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PendingChanges {
    changes: Vec<PendingChange>,
}

impl PendingChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingChange> {
        self.changes.iter()
    }

    pub fn get(&self, id: ChangeId) -> Option<&PendingChange> {
        self.changes.iter().find(|c| c.id == id)
    }

    pub fn for_task(&self, task: &TaskId) -> Option<&PendingChange> {
        self.changes.iter().find(|c| &c.task_id == task)
    }

    pub fn is_pending(&self, task: &TaskId) -> bool {
        self.for_task(task).is_some()
    }

    /// Move `task_id` to `target` locally and record the net change.
    ///
    /// Only the displacement from the session's starting state is kept: a
    /// task moved back to its original resource leaves no entry.
    pub fn propose(
        &mut self,
        tasks: &mut [Task],
        task_id: &TaskId,
        target: Option<ResourceId>,
    ) -> Result<ProposeOutcome> {
        let task = tasks
            .iter_mut()
            .find(|t| &t.id == task_id)
            .ok_or_else(|| PlannerError::UnknownTask(task_id.clone()))?;

        if task.resource_id == target {
            debug!(task = %task_id, "drop on current resource ignored");
            return Ok(ProposeOutcome::NoOp);
        }

        let outcome = match self.changes.iter().position(|c| &c.task_id == task_id) {
            Some(idx) if self.changes[idx].original == target => {
                self.changes.remove(idx);
                ProposeOutcome::Collapsed
            }
            Some(idx) => {
                let change = &mut self.changes[idx];
                change.proposed = target.clone();
                ProposeOutcome::Updated(change.id)
            }
            None => {
                let change = PendingChange {
                    id: ChangeId::new(),
                    task_id: task_id.clone(),
                    original: task.resource_id.clone(),
                    proposed: target.clone(),
                };
                let id = change.id;
                self.changes.push(change);
                ProposeOutcome::Created(id)
            }
        };

        debug!(
            task = %task_id,
            from = ?task.resource_id,
            to = ?target,
            ?outcome,
            "reassignment proposed"
        );
        task.resource_id = target;
        Ok(outcome)
    }

    /// Drop one change and put its task back on the original resource.
    ///
    /// A task no longer in `tasks` is skipped; the entry is still removed.
    pub fn revert(&mut self, tasks: &mut [Task], id: ChangeId) -> Option<PendingChange> {
        let idx = self.changes.iter().position(|c| c.id == id)?;
        let change = self.changes.remove(idx);
        restore(tasks, &change);
        debug!(change = %id, task = %change.task_id, "change reverted");
        Some(change)
    }

    /// Put every affected task back and empty the set. No remote calls.
    pub fn cancel_all(&mut self, tasks: &mut [Task]) -> Vec<PendingChange> {
        let drained: Vec<PendingChange> = self.changes.drain(..).collect();
        for change in drained.iter().rev() {
            restore(tasks, change);
        }
        if !drained.is_empty() {
            info!(count = drained.len(), "pending changes cancelled");
        }
        drained
    }

    /// Prune entries that no longer apply to a freshly loaded task list.
    ///
    /// The list itself is left as loaded. Entries whose task disappeared, or
    /// whose proposal the remote side already holds, are dropped; the rest
    /// keep the resource the task had before it was first moved. Returns how
    /// many entries were dropped.
    pub fn retain_live(&mut self, tasks: &[Task]) -> usize {
        let before = self.changes.len();
        self.changes.retain(|change| {
            tasks
                .iter()
                .find(|t| t.id == change.task_id)
                .is_some_and(|task| task.resource_id != change.proposed)
        });
        let dropped = before - self.changes.len();
        if dropped > 0 {
            debug!(dropped, "stale pending changes dropped on reload");
        }
        dropped
    }

    pub fn clear(&mut self) {
        self.changes.clear();
    }

    /// Remove entries by id without touching tasks.
    pub(crate) fn discard(&mut self, ids: &[ChangeId]) {
        self.changes.retain(|c| !ids.contains(&c.id));
    }
}

fn restore(tasks: &mut [Task], change: &PendingChange) {
    if let Some(task) = tasks.iter_mut().find(|t| t.id == change.task_id) {
        task.resource_id = change.original.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ServiceTimes, TaskKind};

    fn task(id: &str, resource: Option<&str>) -> Task {
        let mut t = Task::new(
            id,
            TaskKind::Single,
            ServiceTimes {
                scheduled_departure: 600,
                kitchen_out: 400,
                service_start: 500,
                service_end: 540,
                unload_end: 600,
                load_start: 400,
                load_end: 600,
            },
        );
        t.resource_id = resource.map(ResourceId::from);
        t
    }

    fn rid(s: &str) -> Option<ResourceId> {
        Some(ResourceId::from(s))
    }

    #[test]
    fn first_move_creates_then_updates() {
        let mut tasks = vec![task("t", Some("A"))];
        let mut pending = PendingChanges::new();
        let id = TaskId::from("t");

        let created = pending.propose(&mut tasks, &id, rid("B")).unwrap();
        let ProposeOutcome::Created(change_id) = created else {
            panic!("expected Created, got {:?}", created);
        };
        assert_eq!(tasks[0].resource_id, rid("B"));

        let updated = pending.propose(&mut tasks, &id, rid("C")).unwrap();
        assert_eq!(updated, ProposeOutcome::Updated(change_id));
        let change = pending.for_task(&id).unwrap();
        assert_eq!(change.original, rid("A"));
        assert_eq!(change.proposed, rid("C"));
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn moving_back_collapses_entry() {
        let mut tasks = vec![task("t", Some("A"))];
        let mut pending = PendingChanges::new();
        let id = TaskId::from("t");
        pending.propose(&mut tasks, &id, rid("B")).unwrap();
        pending.propose(&mut tasks, &id, None).unwrap();
        let outcome = pending.propose(&mut tasks, &id, rid("A")).unwrap();
        assert_eq!(outcome, ProposeOutcome::Collapsed);
        assert!(pending.is_empty());
        assert_eq!(tasks[0].resource_id, rid("A"));
    }

    #[test]
    fn drops_onto_current_place_are_noops() {
        let mut tasks = vec![task("t", Some("A")), task("u", None)];
        let mut pending = PendingChanges::new();
        assert_eq!(
            pending.propose(&mut tasks, &"t".into(), rid("A")).unwrap(),
            ProposeOutcome::NoOp
        );
        assert_eq!(
            pending.propose(&mut tasks, &"u".into(), None).unwrap(),
            ProposeOutcome::NoOp
        );
        assert!(pending.is_empty());
    }

    #[test]
    fn unknown_task_is_an_error() {
        let mut tasks = vec![task("t", None)];
        let mut pending = PendingChanges::new();
        let err = pending.propose(&mut tasks, &"zz".into(), rid("A")).unwrap_err();
        assert!(matches!(err, PlannerError::UnknownTask(_)));
    }

    #[test]
    fn revert_restores_original() {
        let mut tasks = vec![task("t", None)];
        let mut pending = PendingChanges::new();
        let ProposeOutcome::Created(change_id) =
            pending.propose(&mut tasks, &"t".into(), rid("B")).unwrap()
        else {
            panic!("expected Created");
        };
        let reverted = pending.revert(&mut tasks, change_id).unwrap();
        assert_eq!(reverted.proposed, rid("B"));
        assert_eq!(tasks[0].resource_id, None);
        assert!(pending.revert(&mut tasks, change_id).is_none());
    }

    #[test]
    fn cancel_all_restores_every_task() {
        let mut tasks = vec![task("a", Some("A")), task("b", None), task("c", Some("C"))];
        let before: Vec<Option<ResourceId>> = tasks.iter().map(|t| t.resource_id.clone()).collect();
        let mut pending = PendingChanges::new();
        pending.propose(&mut tasks, &"a".into(), rid("B")).unwrap();
        pending.propose(&mut tasks, &"b".into(), rid("A")).unwrap();
        pending.propose(&mut tasks, &"a".into(), None).unwrap();
        pending.propose(&mut tasks, &"c".into(), rid("A")).unwrap();

        let cancelled = pending.cancel_all(&mut tasks);
        assert_eq!(cancelled.len(), 3);
        assert!(pending.is_empty());
        let after: Vec<Option<ResourceId>> = tasks.iter().map(|t| t.resource_id.clone()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn reload_prunes_without_touching_tasks() {
        let mut tasks = vec![task("a", Some("A")), task("b", None), task("c", None)];
        let mut pending = PendingChanges::new();
        pending.propose(&mut tasks, &"a".into(), rid("B")).unwrap();
        pending.propose(&mut tasks, &"b".into(), rid("C")).unwrap();
        pending.propose(&mut tasks, &"c".into(), rid("C")).unwrap();

        // b already moved remotely, c vanished, a moved elsewhere remotely.
        let fresh = vec![task("a", Some("D")), task("b", Some("C"))];
        assert_eq!(pending.retain_live(&fresh), 2);
        assert_eq!(pending.len(), 1);
        let change = pending.for_task(&"a".into()).unwrap();
        assert_eq!(change.original, rid("A"));
        assert_eq!(change.proposed, rid("B"));
        assert_eq!(fresh[0].resource_id, rid("D"));
    }
}
