//! Scheduling geometry and change tracking for a timeline flight planner.
//!
//! Tasks (flights) sit on resources (catering vehicles) along a one-day
//! timeline. The crate works out how overlapping tasks stack, where chain
//! brackets start and end, and how much slack a drop would leave, and it
//! stages drag-and-drop reassignments until they are committed through an
//! [`AssignmentPort`].

pub mod changes;
pub mod config;
pub mod drag;
pub mod error;
pub mod io;
pub mod layout;
pub mod model;
pub mod planner;
pub mod selection;

pub use changes::{AssignmentPort, BatchReport, CommitPolicy, PendingChanges, ProposeOutcome};
pub use config::PlannerConfig;
pub use drag::{DragSession, DropTarget};
pub use error::{PlannerError, Result};
pub use planner::Planner;
pub use selection::Selection;
