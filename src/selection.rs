//! Multi-select and chain editing.

use tracing::{debug, info};

use crate::error::SelectionError;
use crate::model::{ChainId, ResourceId, Task, TaskId};

/// Tasks picked for grouping, all on one resource, plus a picked chain.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    tasks: Vec<TaskId>,
    multi_select: bool,
    chain: Option<ChainId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &[TaskId] {
        &self.tasks
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.contains(id)
    }

    pub fn is_multi_select(&self) -> bool {
        self.multi_select
    }

    pub fn selected_chain(&self) -> Option<&ChainId> {
        self.chain.as_ref()
    }

    /// Add or remove a task. Adding a task on a different resource than the
    /// current selection is rejected and leaves the selection unchanged.
    ///
    /// Returns whether the task is selected afterwards.
    pub fn toggle(&mut self, tasks: &[Task], id: &TaskId) -> Result<bool, SelectionError> {
        let task = find(tasks, id)?;

        if let Some(pos) = self.tasks.iter().position(|t| t == id) {
            self.tasks.remove(pos);
            return Ok(false);
        }

        if let Some(anchor) = self.tasks.iter().find_map(|sid| tasks.iter().find(|t| &t.id == sid)) {
            if anchor.resource_id != task.resource_id {
                debug!(task = %id, "selection across resources rejected");
                return Err(SelectionError::MixedResources {
                    task: id.clone(),
                    expected: anchor.resource_id.clone(),
                    found: task.resource_id.clone(),
                });
            }
        }

        self.tasks.push(id.clone());
        self.multi_select = true;
        Ok(true)
    }

    /// Pick a chain, or unpick it when it is already picked.
    pub fn toggle_chain(&mut self, chain: &ChainId) {
        if self.chain.as_ref() == Some(chain) {
            self.chain = None;
        } else {
            self.chain = Some(chain.clone());
        }
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
        self.multi_select = false;
        self.chain = None;
    }

    /// Group the selected tasks into a new chain and clear the selection.
    ///
    /// Needs at least two selected tasks, all on the same assigned resource.
    pub fn create_chain(&mut self, tasks: &mut [Task]) -> Result<(ChainId, ResourceId), SelectionError> {
        let members: Vec<&Task> = tasks.iter().filter(|t| self.tasks.contains(&t.id)).collect();
        if members.len() < 2 {
            return Err(SelectionError::TooFew(members.len()));
        }

        let resource = members[0].resource_id.clone();
        if let Some(stray) = members.iter().find(|t| t.resource_id != resource) {
            return Err(SelectionError::MixedResources {
                task: stray.id.clone(),
                expected: resource,
                found: stray.resource_id.clone(),
            });
        }
        let resource = resource.ok_or(SelectionError::Unassigned)?;

        let chain = ChainId::generate();
        for task in tasks.iter_mut().filter(|t| self.tasks.contains(&t.id)) {
            task.chain_id = Some(chain.clone());
        }
        info!(chain = %chain, resource = %resource, members = self.tasks.len(), "chain created");
        self.clear();
        Ok((chain, resource))
    }

    /// Break the picked chain, if any. Returns the number of tasks released.
    pub fn break_selected_chain(&mut self, tasks: &mut [Task]) -> Option<usize> {
        let chain = self.chain.take()?;
        Some(break_chain(tasks, &chain))
    }
}

/// Remove `chain` from every member. Placeholder ids are left alone.
pub fn break_chain(tasks: &mut [Task], chain: &ChainId) -> usize {
    if !chain.is_groupable() {
        return 0;
    }
    let mut released = 0;
    for task in tasks.iter_mut().filter(|t| t.in_chain(chain)) {
        task.chain_id = None;
        released += 1;
    }
    info!(chain = %chain, released, "chain broken");
    released
}

fn find<'a>(tasks: &'a [Task], id: &TaskId) -> Result<&'a Task, SelectionError> {
    tasks
        .iter()
        .find(|t| &t.id == id)
        .ok_or_else(|| SelectionError::UnknownTask(id.clone()))
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

    #[test]
    fn toggle_rejects_other_resources() {
        let tasks = vec![task("a", Some("R1")), task("b", Some("R1")), task("c", Some("R2"))];
        let mut sel = Selection::new();
        assert!(sel.toggle(&tasks, &"a".into()).unwrap());
        assert!(sel.toggle(&tasks, &"b".into()).unwrap());
        let err = sel.toggle(&tasks, &"c".into()).unwrap_err();
        assert!(matches!(err, SelectionError::MixedResources { .. }));
        assert_eq!(sel.tasks().len(), 2);
        assert!(sel.is_multi_select());

        assert!(!sel.toggle(&tasks, &"a".into()).unwrap());
        assert_eq!(sel.tasks(), &[TaskId::from("b")]);
    }

    #[test]
    fn create_chain_groups_and_clears() {
        let mut tasks = vec![task("a", Some("R1")), task("b", Some("R1")), task("c", Some("R1"))];
        let mut sel = Selection::new();
        sel.toggle(&tasks, &"a".into()).unwrap();
        sel.toggle(&tasks, &"c".into()).unwrap();
        let (chain, resource) = sel.create_chain(&mut tasks).unwrap();
        assert_eq!(resource, ResourceId::from("R1"));
        assert!(chain.as_str().starts_with("chain-"));
        assert!(tasks[0].in_chain(&chain));
        assert!(tasks[1].chain_id.is_none());
        assert!(tasks[2].in_chain(&chain));
        assert!(sel.tasks().is_empty());
        assert!(!sel.is_multi_select());
    }

    #[test]
    fn create_chain_validates_selection() {
        let mut tasks = vec![task("a", None), task("b", None), task("c", Some("R1"))];
        let mut sel = Selection::new();
        sel.toggle(&tasks, &"a".into()).unwrap();
        assert_eq!(sel.create_chain(&mut tasks), Err(SelectionError::TooFew(1)));
        sel.toggle(&tasks, &"b".into()).unwrap();
        assert_eq!(sel.create_chain(&mut tasks), Err(SelectionError::Unassigned));
        assert!(tasks.iter().all(|t| t.chain_id.is_none()));
    }

    #[test]
    fn break_chain_releases_members() {
        let mut tasks = vec![task("a", Some("R1")), task("b", Some("R1"))];
        for t in tasks.iter_mut() {
            t.chain_id = Some(ChainId::from("c1"));
        }
        let mut sel = Selection::new();
        sel.toggle_chain(&ChainId::from("c1"));
        assert_eq!(sel.break_selected_chain(&mut tasks), Some(2));
        assert!(tasks.iter().all(|t| t.chain_id.is_none()));
        assert_eq!(sel.break_selected_chain(&mut tasks), None);
        assert_eq!(break_chain(&mut tasks, &ChainId::from("solo-a")), 0);
    }
}
