//! Drag-and-drop session state: `Idle → Dragging → Resolving → Idle`.

use tracing::debug;

use crate::error::DragError;
use crate::layout::GapInfo;
use crate::model::{ResourceId, Task, TaskId};

/// Where a dragged task can be dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Resource(ResourceId),
    Unassigned,
}

impl DropTarget {
    /// The resource the task would end up on (`None` for the tray).
    pub fn into_resource(self) -> Option<ResourceId> {
        match self {
            DropTarget::Resource(id) => Some(id),
            DropTarget::Unassigned => None,
        }
    }

    pub fn resource(&self) -> Option<&ResourceId> {
        match self {
            DropTarget::Resource(id) => Some(id),
            DropTarget::Unassigned => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        /// Snapshot of the task taken when the drag started.
        task: Task,
        hover: Option<DropTarget>,
        gaps: Option<GapInfo>,
    },
    /// Dropped on a target; waiting for the reassignment to be recorded.
    Resolving { task_id: TaskId, target: DropTarget },
}

/// One drag at a time.
#[derive(Debug, Clone, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, DragState::Idle)
    }

    pub fn dragged(&self) -> Option<&Task> {
        match &self.state {
            DragState::Dragging { task, .. } => Some(task),
            _ => None,
        }
    }

    pub fn hover(&self) -> Option<&DropTarget> {
        match &self.state {
            DragState::Dragging { hover, .. } => hover.as_ref(),
            _ => None,
        }
    }

    pub fn gaps(&self) -> Option<&GapInfo> {
        match &self.state {
            DragState::Dragging { gaps, .. } => gaps.as_ref(),
            _ => None,
        }
    }

    pub fn start(&mut self, task: &Task) -> Result<(), DragError> {
        let active = match &self.state {
            DragState::Idle => None,
            DragState::Dragging { task: active, .. } => Some(active.id.clone()),
            DragState::Resolving { task_id, .. } => Some(task_id.clone()),
        };
        if let Some(active) = active {
            return Err(DragError::SessionActive(active));
        }

        debug!(task = %task.id, "drag started");
        self.state = DragState::Dragging {
            task: task.clone(),
            hover: None,
            gaps: None,
        };
        Ok(())
    }

    /// Record the current hover target and its gap feedback.
    pub fn update(
        &mut self,
        target: Option<DropTarget>,
        feedback: Option<GapInfo>,
    ) -> Result<(), DragError> {
        match &mut self.state {
            DragState::Dragging { hover, gaps, .. } => {
                *hover = target;
                *gaps = feedback;
                Ok(())
            }
            _ => Err(DragError::NoSession),
        }
    }

    /// Drop the task. Without a target the session returns to idle and
    /// nothing is returned.
    pub fn end(&mut self, target: Option<DropTarget>) -> Result<Option<(TaskId, DropTarget)>, DragError> {
        let DragState::Dragging { task, .. } = &self.state else {
            return Err(DragError::NoSession);
        };
        let task_id = task.id.clone();
        match target {
            Some(target) => {
                debug!(task = %task_id, ?target, "drag dropped");
                self.state = DragState::Resolving {
                    task_id: task_id.clone(),
                    target: target.clone(),
                };
                Ok(Some((task_id, target)))
            }
            None => {
                debug!(task = %task_id, "drag dropped outside any target");
                self.state = DragState::Idle;
                Ok(None)
            }
        }
    }

    /// Leave `Resolving` once the drop has been handled.
    pub fn finish(&mut self) {
        if matches!(self.state, DragState::Resolving { .. }) {
            self.state = DragState::Idle;
        }
    }

    /// Abandon the drag from any state.
    pub fn cancel(&mut self) {
        if !self.is_idle() {
            debug!("drag cancelled");
        }
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ServiceTimes, TaskKind};

    fn task(id: &str) -> Task {
        Task::new(
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
        )
    }

    #[test]
    fn full_cycle_through_resolving() {
        let mut session = DragSession::new();
        session.start(&task("a")).unwrap();
        session
            .update(Some(DropTarget::Resource("R1".into())), None)
            .unwrap();
        assert_eq!(session.hover(), Some(&DropTarget::Resource("R1".into())));

        let dropped = session.end(Some(DropTarget::Unassigned)).unwrap();
        assert_eq!(dropped, Some((TaskId::from("a"), DropTarget::Unassigned)));
        assert!(matches!(session.state(), DragState::Resolving { .. }));
        assert!(session.start(&task("b")).is_err());
        session.finish();
        assert!(session.is_idle());
    }

    #[test]
    fn second_start_is_rejected() {
        let mut session = DragSession::new();
        session.start(&task("a")).unwrap();
        assert_eq!(
            session.start(&task("b")),
            Err(DragError::SessionActive("a".into()))
        );
        assert_eq!(session.dragged().unwrap().id, TaskId::from("a"));
    }

    #[test]
    fn drop_outside_returns_to_idle() {
        let mut session = DragSession::new();
        session.start(&task("a")).unwrap();
        assert_eq!(session.end(None).unwrap(), None);
        assert!(session.is_idle());
        assert_eq!(session.end(None), Err(DragError::NoSession));
    }

    #[test]
    fn cancel_discards_from_any_state() {
        let mut session = DragSession::new();
        session.cancel();
        session.start(&task("a")).unwrap();
        session.cancel();
        assert!(session.is_idle());
        assert_eq!(session.update(None, None), Err(DragError::NoSession));
    }
}
