use crate::model::{DayWindow, Minutes, ResourceId, Task, TaskId};

/// Free time on one side of a dragged task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gap {
    /// Neighbouring task, or `None` when the gap runs to the window edge.
    pub neighbor: Option<TaskId>,
    pub minutes: Minutes,
    /// Where the gap begins: the neighbour's end (or window start) before,
    /// the moved task's end after.
    pub insert_time: Minutes,
}

/// Gap feedback for a hovered resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GapInfo {
    pub resource_id: ResourceId,
    pub before: Option<Gap>,
    pub after: Option<Gap>,
}

/// Compute the free time around `moved` if it were dropped on `resource_id`.
///
/// `placed` are the resource's tasks; the moved task itself is skipped if
/// present. The insertion point is the moved task's own service start.
/// Negative gaps (the drop would overlap a neighbour) are not reported.
pub fn compute_gaps<'a>(
    resource_id: &ResourceId,
    placed: impl IntoIterator<Item = &'a Task>,
    moved: &Task,
    window: &DayWindow,
) -> GapInfo {
    let mut sorted: Vec<&Task> = placed.into_iter().filter(|t| t.id != moved.id).collect();
    sorted.sort_by_key(|t| t.start());

    let insert_at = moved.start();
    let before = sorted.iter().rev().find(|t| t.start() <= insert_at);
    let after = sorted.iter().find(|t| t.start() > insert_at);

    let before_gap = match before {
        Some(prev) => Gap {
            neighbor: Some(prev.id.clone()),
            minutes: moved.start() - prev.end(),
            insert_time: prev.end(),
        },
        None => Gap {
            neighbor: None,
            minutes: moved.start() - window.start,
            insert_time: window.start,
        },
    };

    let after_gap = match after {
        Some(next) => Gap {
            neighbor: Some(next.id.clone()),
            minutes: next.start() - moved.end(),
            insert_time: moved.end(),
        },
        None => Gap {
            neighbor: None,
            minutes: window.end - moved.end(),
            insert_time: moved.end(),
        },
    };

    GapInfo {
        resource_id: resource_id.clone(),
        before: Some(before_gap).filter(|g| g.minutes >= 0),
        after: Some(after_gap).filter(|g| g.minutes >= 0),
    }
}
