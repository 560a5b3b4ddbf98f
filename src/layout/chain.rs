//! Brackets: the time span and vertical extent of a chain of tasks sharing
//! one vehicle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{ChainId, DayWindow, Minutes, Plan, ResourceId, Task, TaskId, TaskKind};

use super::geometry::RowGeometry;
use super::layers::LayerMap;

/// Minutes a bracket opens before the first member's scheduled departure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadTimes {
    pub single: Minutes,
    pub dual: Minutes,
}

impl Default for LeadTimes {
    fn default() -> Self {
        Self {
            single: 155,
            dual: 180,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainTiming {
    pub lead: LeadTimes,
    /// Minutes a bracket stays open after the last member's service end.
    pub trail: Minutes,
}

impl Default for ChainTiming {
    fn default() -> Self {
        Self {
            lead: LeadTimes::default(),
            trail: 20,
        }
    }
}

impl ChainTiming {
    pub fn new(lead: LeadTimes, trail: Minutes) -> Self {
        Self { lead, trail }
    }

    pub fn lead(&self, kind: TaskKind) -> Minutes {
        match kind {
            TaskKind::Single => self.lead.single,
            TaskKind::Dual => self.lead.dual,
        }
    }
}

/// Temporal boundary of a chain on one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainWindow {
    pub chain_id: ChainId,
    pub resource_id: ResourceId,
    pub start: Minutes,
    pub end: Minutes,
}

/// Compute the bracket span of `members`.
///
/// Returns `None` when fewer than two members remain. The result is clamped
/// to `window`.
pub fn chain_window(
    chain_id: &ChainId,
    resource_id: &ResourceId,
    members: &[&Task],
    timing: &ChainTiming,
    window: &DayWindow,
) -> Option<ChainWindow> {
    if members.len() < 2 {
        return None;
    }
    let mut sorted = members.to_vec();
    sorted.sort_by_key(|t| t.start());
    let first = sorted.first()?;
    let last = sorted.last()?;

    let start = first.times.scheduled_departure - timing.lead(first.kind);
    let end = last.times.service_end + timing.trail;
    Some(ChainWindow {
        chain_id: chain_id.clone(),
        resource_id: resource_id.clone(),
        start: window.clamp(start),
        end: window.clamp(end),
    })
}

/// Every bracket in the plan, per resource, sorted by start.
pub fn chain_windows(
    plan: &Plan,
    timing: &ChainTiming,
    window: &DayWindow,
) -> BTreeMap<ResourceId, Vec<ChainWindow>> {
    let mut out = BTreeMap::new();
    for rid in plan.resource_ids() {
        let mut groups: BTreeMap<&ChainId, Vec<&Task>> = BTreeMap::new();
        for task in plan.tasks_on(&rid) {
            if let Some(chain) = task.chain_id.as_ref().filter(|c| c.is_groupable()) {
                groups.entry(chain).or_default().push(task);
            }
        }

        let mut windows: Vec<ChainWindow> = groups
            .into_iter()
            .filter_map(|(chain, members)| chain_window(chain, &rid, &members, timing, window))
            .collect();
        windows.sort_by_key(|w| w.start);
        out.insert(rid, windows);
    }
    out
}

/// Vertical extent of a bracket within its row.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BracketBounds {
    pub min_layer: usize,
    pub max_layer: usize,
    pub top: f32,
    pub height: f32,
}

/// Vertical bounds of a bracket over `members`, using the row's layers.
///
/// Members missing from `layers` are ignored; if none remain the bounds are
/// zero-sized.
pub fn bracket_bounds<'a>(
    members: impl IntoIterator<Item = &'a TaskId>,
    layers: &LayerMap,
    geometry: &RowGeometry,
) -> BracketBounds {
    let Some((min_layer, max_layer)) = layers.span_of(members) else {
        return BracketBounds::default();
    };

    let row_layers = layers.row_layers();
    if row_layers == 1 {
        return BracketBounds {
            min_layer: 0,
            max_layer: 0,
            top: (geometry.lane_height - geometry.bracket_height) / 2.0,
            height: geometry.bracket_height,
        };
    }

    let stack_top = geometry.stack_top(row_layers);
    let top = stack_top + min_layer as f32 * geometry.layer_spacing();
    let bottom = stack_top + max_layer as f32 * geometry.layer_spacing() + geometry.task_height();
    BracketBounds {
        min_layer,
        max_layer,
        top,
        height: geometry.bracket_height.max(bottom - top),
    }
}

/// Where a task sits inside its chain, for drawing bracket ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketPosition {
    Single,
    Start,
    Middle,
    End,
}

/// `members` must be sorted by service start.
pub fn bracket_position(task: &TaskId, members: &[&Task]) -> BracketPosition {
    if members.len() < 2 {
        return BracketPosition::Single;
    }
    match members.iter().position(|t| &t.id == task) {
        None => BracketPosition::Single,
        Some(0) => BracketPosition::Start,
        Some(i) if i == members.len() - 1 => BracketPosition::End,
        Some(_) => BracketPosition::Middle,
    }
}
