use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::resource::{Resource, ResourceId};
use super::task::{ChainId, Task, TaskId};

/// A planning snapshot: the base date, the vehicles and their flights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    /// Day origin for every minute offset in the plan.
    pub date: NaiveDate,
    pub resources: Vec<Resource>,
    pub tasks: Vec<Task>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Default for Plan {
    fn default() -> Self {
        Self {
            name: "Untitled Plan".to_string(),
            date: Utc::now().date_naive(),
            resources: Vec::new(),
            tasks: Vec::new(),
            created: Utc::now(),
            modified: Utc::now(),
        }
    }
}

impl Plan {
    pub fn new(name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            date,
            ..Default::default()
        }
    }

    /// Touch the modified timestamp.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn task_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| &t.id == id)
    }

    pub fn resource(&self, id: &ResourceId) -> Option<&Resource> {
        self.resources.iter().find(|r| &r.id == id)
    }

    /// Tasks on `resource`, sorted by service start (stable).
    pub fn tasks_on(&self, resource: &ResourceId) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.iter().filter(|t| t.is_on(resource)).collect();
        tasks.sort_by_key(|t| t.start());
        tasks
    }

    /// Tasks with no resource, sorted by service start (stable).
    pub fn unassigned(&self) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.tasks.iter().filter(|t| !t.is_assigned()).collect();
        tasks.sort_by_key(|t| t.start());
        tasks
    }

    /// Members of `chain` on `resource`, sorted by service start.
    pub fn chain_members(&self, chain: &ChainId, resource: &ResourceId) -> Vec<&Task> {
        self.tasks_on(resource)
            .into_iter()
            .filter(|t| t.in_chain(chain))
            .collect()
    }

    /// Resource ids in display order: declared resources first, then any id
    /// referenced by a task but missing from the resource list.
    pub fn resource_ids(&self) -> Vec<ResourceId> {
        let mut ids: Vec<ResourceId> = self.resources.iter().map(|r| r.id.clone()).collect();
        for task in &self.tasks {
            if let Some(rid) = &task.resource_id {
                if !ids.contains(rid) {
                    ids.push(rid.clone());
                }
            }
        }
        ids
    }

    /// Replace the task list wholesale with an authoritative snapshot.
    pub fn replace_tasks(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.touch();
    }
}
