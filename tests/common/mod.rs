#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use flight_planner::error::{PortError, PortOperation};
use flight_planner::model::{Resource, ResourceId, ServiceTimes, ShiftWindow, Task, TaskId, TaskKind};
use flight_planner::AssignmentPort;

pub fn task(id: &str, resource: Option<&str>, start: i32, end: i32) -> Task {
    let mut t = Task::new(
        id,
        TaskKind::Single,
        ServiceTimes {
            scheduled_departure: end + 20,
            kitchen_out: start - 60,
            service_start: start,
            service_end: end,
            unload_end: end + 20,
            load_start: start - 60,
            load_end: end + 20,
        },
    );
    t.resource_id = resource.map(ResourceId::from);
    t
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Assign(TaskId, ResourceId),
    Unassign(TaskId),
}

/// In-memory assignment backend that records calls and fails on request.
#[derive(Default)]
pub struct MockPort {
    tasks: Mutex<Vec<Task>>,
    resources: Vec<Resource>,
    fail_on: Mutex<HashSet<TaskId>>,
    calls: Mutex<Vec<Call>>,
    fetch_down: AtomicBool,
}

impl MockPort {
    pub fn new(resources: &[&str], tasks: Vec<Task>) -> Self {
        Self {
            tasks: Mutex::new(tasks),
            resources: resources
                .iter()
                .map(|id| Resource::new(*id, format!("Lift {id}"), ShiftWindow::default()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn fail_on(&self, task: &str) {
        self.fail_on.lock().unwrap().insert(TaskId::from(task));
    }

    pub fn heal(&self) {
        self.fail_on.lock().unwrap().clear();
    }

    /// Make every later `fetch_tasks` fail until `fetch_up` is called.
    pub fn fetch_down(&self) {
        self.fetch_down.store(true, Ordering::SeqCst);
    }

    pub fn fetch_up(&self) {
        self.fetch_down.store(false, Ordering::SeqCst);
    }

    /// Drop a task from the backend, as another user deleting it would.
    pub fn remove(&self, task: &str) {
        self.tasks.lock().unwrap().retain(|t| t.id.as_str() != task);
    }

    /// Move a task on the backend without going through the port calls.
    pub fn move_to(&self, task: &str, resource: Option<&str>) {
        if let Some(t) = self.tasks.lock().unwrap().iter_mut().find(|t| t.id.as_str() == task) {
            t.resource_id = resource.map(ResourceId::from);
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn resource_of(&self, task: &str) -> Option<ResourceId> {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id.as_str() == task)
            .and_then(|t| t.resource_id.clone())
    }

    fn set(&self, op: PortOperation, task: &TaskId, resource: Option<ResourceId>) -> Result<Task, PortError> {
        if self.fail_on.lock().unwrap().contains(task) {
            return Err(PortError::for_task(op, task.clone(), "backend rejected the change"));
        }
        let mut tasks = self.tasks.lock().unwrap();
        let found = tasks
            .iter_mut()
            .find(|t| &t.id == task)
            .ok_or_else(|| PortError::for_task(op, task.clone(), "no such task"))?;
        found.resource_id = resource;
        Ok(found.clone())
    }
}

#[async_trait]
impl AssignmentPort for MockPort {
    async fn fetch_tasks(&self) -> Result<Vec<Task>, PortError> {
        if self.fetch_down.load(Ordering::SeqCst) {
            return Err(PortError::new(PortOperation::FetchTasks, "backend unavailable"));
        }
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn fetch_resources(&self) -> Result<Vec<Resource>, PortError> {
        Ok(self.resources.clone())
    }

    async fn assign(&self, task: &TaskId, resource: &ResourceId) -> Result<Task, PortError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Assign(task.clone(), resource.clone()));
        self.set(PortOperation::Assign, task, Some(resource.clone()))
    }

    async fn unassign(&self, task: &TaskId) -> Result<Task, PortError> {
        self.calls.lock().unwrap().push(Call::Unassign(task.clone()));
        self.set(PortOperation::Unassign, task, None)
    }
}
