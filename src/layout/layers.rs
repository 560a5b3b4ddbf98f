use std::collections::{BTreeMap, HashMap};

use crate::model::{Interval, Plan, ResourceId, Task, TaskId};

/// First-fit placement of spans into numbered layers.
///
/// Each span lands on the lowest layer holding no overlapping span. Fed in
/// start order this uses exactly as many layers as the peak overlap.
#[derive(Debug, Default)]
pub(crate) struct FirstFit {
    layers: Vec<Vec<Interval>>,
}

impl FirstFit {
    pub(crate) fn place(&mut self, span: Interval) -> usize {
        let free = self
            .layers
            .iter()
            .position(|placed| placed.iter().all(|other| !span.overlaps(other)));
        match free {
            Some(layer) => {
                self.layers[layer].push(span);
                layer
            }
            None => {
                self.layers.push(vec![span]);
                self.layers.len() - 1
            }
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.layers.len()
    }
}

/// Layer of every task on one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerMap {
    /// `(task, layer)` in scan order.
    entries: Vec<(TaskId, usize)>,
    index: HashMap<TaskId, usize>,
    depth: usize,
}

impl LayerMap {
    pub fn layer_of(&self, task: &TaskId) -> Option<usize> {
        self.index.get(task).copied()
    }

    /// Number of distinct layers in use (0 when empty).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Layers a row must show; an empty row still shows one.
    pub fn row_layers(&self) -> usize {
        self.depth.max(1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TaskId, usize)> {
        self.entries.iter().map(|(id, layer)| (id, *layer))
    }

    /// Lowest and highest layer among `tasks`; ids not in the map are ignored.
    pub fn span_of<'a>(&self, tasks: impl IntoIterator<Item = &'a TaskId>) -> Option<(usize, usize)> {
        tasks
            .into_iter()
            .filter_map(|id| self.layer_of(id))
            .fold(None, |acc, layer| match acc {
                None => Some((layer, layer)),
                Some((lo, hi)) => Some((lo.min(layer), hi.max(layer))),
            })
    }
}

/// Assign display layers to one resource's tasks.
///
/// Tasks are scanned by service start; equal starts keep their input order.
pub fn assign_layers<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> LayerMap {
    let mut ordered: Vec<&Task> = tasks.into_iter().collect();
    ordered.sort_by_key(|t| t.start());

    let mut fit = FirstFit::default();
    let mut map = LayerMap::default();
    for task in ordered {
        let layer = fit.place(task.service_interval());
        map.entries.push((task.id.clone(), layer));
        map.index.insert(task.id.clone(), layer);
    }
    map.depth = fit.depth();
    map
}

/// Layers for every resource in the plan, including ones with no tasks.
pub fn layers_by_resource(plan: &Plan) -> BTreeMap<ResourceId, LayerMap> {
    plan.resource_ids()
        .into_iter()
        .map(|rid| {
            let layers = assign_layers(plan.tasks_on(&rid));
            (rid, layers)
        })
        .collect()
}
