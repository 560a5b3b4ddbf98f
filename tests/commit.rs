mod common;

use common::{task, Call, MockPort};
use flight_planner::changes::{commit_all, ChangeStatus};
use flight_planner::error::PortOperation;
use flight_planner::model::{ResourceId, TaskId};
use flight_planner::{CommitPolicy, DropTarget, PendingChanges, PlannerConfig, PlannerError, Planner};

fn rid(id: &str) -> Option<ResourceId> {
    Some(ResourceId::from(id))
}

fn port() -> MockPort {
    MockPort::new(
        &["M1", "M2"],
        vec![
            task("a", Some("M1"), 500, 560),
            task("b", None, 600, 640),
            task("c", Some("M2"), 700, 760),
        ],
    )
}

async fn loaded(port: &MockPort) -> Planner {
    let mut planner = Planner::new(PlannerConfig::default());
    planner.load(port).await.unwrap();
    planner
}

fn drop_on(planner: &mut Planner, task: &str, target: DropTarget) {
    planner.drag_start(&TaskId::from(task)).unwrap();
    planner.drag_end(Some(target)).unwrap();
}

/// a → M2, b → M1, c → unassigned, in that order.
fn stage_three(planner: &mut Planner) {
    drop_on(planner, "a", DropTarget::Resource("M2".into()));
    drop_on(planner, "b", DropTarget::Resource("M1".into()));
    drop_on(planner, "c", DropTarget::Unassigned);
    assert_eq!(planner.pending().len(), 3);
}

#[test_log::test(tokio::test)]
async fn full_success_clears_and_refreshes() {
    let port = port();
    let mut planner = loaded(&port).await;
    stage_three(&mut planner);

    let report = planner
        .commit_changes(&port, CommitPolicy::default())
        .await
        .unwrap();
    assert!(report.is_success());
    assert!(planner.pending().is_empty());
    assert_eq!(
        port.calls(),
        vec![
            Call::Assign("a".into(), "M2".into()),
            Call::Assign("b".into(), "M1".into()),
            Call::Unassign("c".into()),
        ]
    );
    assert!(planner.task(&"a".into()).unwrap().is_on(&"M2".into()));
    assert!(!planner.task(&"c".into()).unwrap().is_assigned());
}

#[test_log::test(tokio::test)]
async fn stop_on_first_failure_keeps_failed_and_untried() {
    let port = port();
    let mut planner = loaded(&port).await;
    stage_three(&mut planner);
    port.fail_on("b");

    let err = planner
        .commit_changes(&port, CommitPolicy::StopOnFirstFailure)
        .await
        .unwrap_err();
    let PlannerError::Commit(err) = err else {
        panic!("expected a commit error");
    };
    assert_eq!(err.task_id, TaskId::from("b"));
    let statuses: Vec<&ChangeStatus> = err.report.outcomes.iter().map(|o| &o.status).collect();
    assert!(matches!(statuses[..], [ChangeStatus::Applied, ChangeStatus::Failed(_), ChangeStatus::Skipped]));

    // c was never attempted; a stays applied remotely.
    assert_eq!(port.calls().len(), 2);
    assert_eq!(port.resource_of("a"), rid("M2"));
    let left: Vec<&str> = planner.pending().iter().map(|c| c.task_id.as_str()).collect();
    assert_eq!(left, ["b", "c"]);

    // Retry once the backend recovers.
    port.heal();
    planner
        .commit_changes(&port, CommitPolicy::StopOnFirstFailure)
        .await
        .unwrap();
    assert!(planner.pending().is_empty());
    assert_eq!(port.resource_of("b"), rid("M1"));
    assert_eq!(port.resource_of("c"), None);
}

#[test_log::test(tokio::test)]
async fn continue_on_failure_tries_everything() {
    let port = port();
    let mut planner = loaded(&port).await;
    stage_three(&mut planner);
    port.fail_on("a");

    let err = planner
        .commit_changes(&port, CommitPolicy::ContinueOnFailure)
        .await
        .unwrap_err();
    let PlannerError::Commit(err) = err else {
        panic!("expected a commit error");
    };
    assert_eq!(err.report.failed().len(), 1);
    assert_eq!(err.report.applied().len(), 2);
    assert_eq!(port.calls().len(), 3);
    let left: Vec<&str> = planner.pending().iter().map(|c| c.task_id.as_str()).collect();
    assert_eq!(left, ["a"]);
}

#[test_log::test(tokio::test)]
async fn compensate_undoes_applied_changes() {
    let port = port();
    let mut planner = loaded(&port).await;
    stage_three(&mut planner);
    port.fail_on("c");

    let err = planner
        .commit_changes(&port, CommitPolicy::Compensate)
        .await
        .unwrap_err();
    let PlannerError::Commit(err) = err else {
        panic!("expected a commit error");
    };
    let statuses: Vec<&ChangeStatus> = err.report.outcomes.iter().map(|o| &o.status).collect();
    assert!(matches!(
        statuses[..],
        [ChangeStatus::RolledBack, ChangeStatus::RolledBack, ChangeStatus::Failed(_)]
    ));
    assert!(err.report.applied().is_empty());

    // Undo runs newest first: b back to unassigned, then a back to M1.
    let calls = port.calls();
    assert_eq!(calls[3], Call::Unassign("b".into()));
    assert_eq!(calls[4], Call::Assign("a".into(), "M1".into()));
    assert_eq!(port.resource_of("a"), rid("M1"));
    assert_eq!(port.resource_of("b"), None);
    assert_eq!(planner.pending().len(), 3);
}

#[test_log::test(tokio::test)]
async fn empty_commit_makes_no_calls() {
    let port = port();
    let mut pending = PendingChanges::new();
    let report = commit_all(&mut pending, &port, CommitPolicy::Compensate)
        .await
        .unwrap();
    assert!(report.outcomes.is_empty());
    assert!(port.calls().is_empty());
}

#[test_log::test(tokio::test)]
async fn reload_failure_after_commit_keeps_the_report() {
    let port = port();
    let mut planner = loaded(&port).await;
    stage_three(&mut planner);
    port.fetch_down();

    let err = planner
        .commit_changes(&port, CommitPolicy::default())
        .await
        .unwrap_err();
    let PlannerError::RefreshAfterCommit { report, source } = err else {
        panic!("expected a reload error after commit");
    };
    assert!(report.is_success());
    assert_eq!(report.applied().len(), 3);
    assert_eq!(source.operation, PortOperation::FetchTasks);

    // The backend holds every change and nothing is left to commit.
    assert!(planner.pending().is_empty());
    assert_eq!(port.resource_of("a"), rid("M2"));
    assert_eq!(port.resource_of("c"), None);

    port.fetch_up();
    planner.refresh(&port).await.unwrap();
    assert!(planner.task(&"b".into()).unwrap().is_on(&"M1".into()));
}
