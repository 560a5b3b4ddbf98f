pub mod commit;
pub mod pending;

pub use commit::{commit_all, AssignmentPort, BatchReport, ChangeOutcome, ChangeStatus, CommitPolicy};
pub use pending::{ChangeId, PendingChange, PendingChanges, ProposeOutcome};
