use crate::model::{Task, TaskId};

use super::geometry::RowGeometry;
use super::layers::FirstFit;

/// Lane placement of the unassigned tray.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanePacking {
    /// `(task, lane)` sorted by service start.
    pub placements: Vec<(TaskId, usize)>,
    pub lane_count: usize,
}

impl LanePacking {
    pub fn lane_of(&self, task: &TaskId) -> Option<usize> {
        self.placements
            .iter()
            .find(|(id, _)| id == task)
            .map(|(_, lane)| *lane)
    }

    pub fn tray_height(&self, geometry: &RowGeometry) -> f32 {
        geometry.tray_height(self.lane_count)
    }
}

/// Pack tasks without a resource into the fewest non-overlapping lanes.
///
/// Assigned tasks in the input are skipped.
pub fn pack_unassigned<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> LanePacking {
    let mut ordered: Vec<&Task> = tasks.into_iter().filter(|t| !t.is_assigned()).collect();
    ordered.sort_by_key(|t| t.start());

    let mut fit = FirstFit::default();
    let placements = ordered
        .into_iter()
        .map(|task| (task.id.clone(), fit.place(task.service_interval())))
        .collect();

    LanePacking {
        placements,
        lane_count: fit.depth(),
    }
}
