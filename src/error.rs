use std::io;

use thiserror::Error;

use crate::changes::commit::BatchReport;
use crate::changes::pending::ChangeId;
use crate::model::{ChainId, ResourceId, TaskId};

/// Crate-level error.
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Drag(#[from] DragError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Commit(#[from] CommitError),

    /// Every change was applied but the reload that follows failed.
    #[error("Changes committed, but reloading tasks failed: {source}")]
    RefreshAfterCommit {
        report: BatchReport,
        #[source]
        source: PortError,
    },

    #[error("Unknown task: {0}")]
    UnknownTask(TaskId),

    #[error("Unknown chain: {0}")]
    UnknownChain(ChainId),
}

pub type Result<T> = std::result::Result<T, PlannerError>;

/// A selection or grouping request that was rejected without touching state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Task {task} is on {found:?}, but the selection is on {expected:?}")]
    MixedResources {
        task: TaskId,
        expected: Option<ResourceId>,
        found: Option<ResourceId>,
    },

    #[error("A chain needs at least 2 tasks, {0} selected")]
    TooFew(usize),

    #[error("Unassigned tasks cannot form a chain")]
    Unassigned,

    #[error("Unknown task: {0}")]
    UnknownTask(TaskId),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DragError {
    #[error("A drag of task {0} is already in progress")]
    SessionActive(TaskId),

    #[error("No drag in progress")]
    NoSession,

    #[error("Unknown task: {0}")]
    UnknownTask(TaskId),
}

/// Failure reported by the assignment port.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{operation} failed: {message}")]
pub struct PortError {
    pub operation: PortOperation,
    pub task_id: Option<TaskId>,
    pub message: String,
}

impl PortError {
    pub fn new(operation: PortOperation, message: impl Into<String>) -> Self {
        Self {
            operation,
            task_id: None,
            message: message.into(),
        }
    }

    pub fn for_task(operation: PortOperation, task_id: TaskId, message: impl Into<String>) -> Self {
        Self {
            operation,
            task_id: Some(task_id),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortOperation {
    FetchTasks,
    FetchResources,
    Assign,
    Unassign,
}

impl std::fmt::Display for PortOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PortOperation::FetchTasks => "fetch tasks",
            PortOperation::FetchResources => "fetch resources",
            PortOperation::Assign => "assign",
            PortOperation::Unassign => "unassign",
        };
        f.write_str(name)
    }
}

/// A batch commit that did not apply every change.
#[derive(Error, Debug)]
#[error("Commit stopped at change {failed} (task {task_id}): {source}")]
pub struct CommitError {
    pub failed: ChangeId,
    pub task_id: TaskId,
    #[source]
    pub source: PortError,
    pub report: BatchReport,
}
