// ==========================================
// AssignmentRepository 事务集成测试
// ==========================================
// 场景: 提交、复核冲突回滚、替换与恢复、修订
// ==========================================

#[path = "helpers/mock_config.rs"]
mod mock_config;
#[path = "helpers/engine_env.rs"]
mod engine_env;
#[path = "helpers/test_data_builder.rs"]
mod test_data_builder;

use engine_env::{test_helpers, EngineTestEnv};
use staffing_fulfillment::domain::action_log::{ActionLog, ActionType};
use staffing_fulfillment::domain::assignment::CommitPlan;
use staffing_fulfillment::engine::{AssignmentCommitter, FulfillmentFailure};
use staffing_fulfillment::repository::RepositoryError;
use test_data_builder::*;

fn plan(request_id: &str, workers: &[&str]) -> CommitPlan {
    CommitPlan {
        request_id: request_id.to_string(),
        work_date: work_day(),
        shift_code: Some("D".to_string()),
        worker_ids: workers.iter().map(|s| s.to_string()).collect(),
        actor: "tester".to_string(),
        committed_at: ts(),
    }
}

fn commit_log(request_id: &str) -> ActionLog {
    ActionLog::new(ActionType::CommitAssignments, "tester", Some(request_id), None, None)
}

fn seed_three(env: &EngineTestEnv) {
    seed(
        &env.repos,
        &standard_units(),
        vec![
            WorkerBuilder::male("W1").member_of("U1", "S1").build(),
            WorkerBuilder::male("W2").member_of("U1", "S1").build(),
            WorkerBuilder::female("W3").member_of("U1", "S1").build(),
        ],
        vec![
            RequestBuilder::new("R1", "U1", "S1").shift("D").needs(2, 0, 0).build(),
            RequestBuilder::new("R2", "U2", "S1").needs(1, 0, 0).build(),
        ],
    );
}

#[test]
fn test_commit_writes_assignments_history_and_log_atomically() {
    let env = EngineTestEnv::new();
    seed_three(&env);
    let repo = &env.repos.assignment_repo;

    let receipt = repo.commit_request(&plan("R1", &["W1", "W2"]), &commit_log("R1")).unwrap();
    assert_eq!(receipt.assignments.len(), 2);
    assert!(receipt.displaced_worker_ids.is_empty());

    let rows = repo.find_by_request("R1").unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|a| a.work_date == work_day()));
    assert!(rows.iter().all(|a| a.shift_code.as_deref() == Some("D")));

    assert_eq!(test_helpers::count_rows(&env.conn, "work_history").unwrap(), 2);
    assert_eq!(test_helpers::count_rows(&env.conn, "action_log").unwrap(), 1);
    assert_eq!(test_helpers::worker_state(&env.conn, "W1").unwrap(), "ASSIGNED");
    assert_eq!(test_helpers::request_status(&env.conn, "R1").unwrap(), "FULFILLED");
}

#[test]
fn test_conflict_on_leave_rolls_back_everything() {
    let env = EngineTestEnv::new();
    seed_three(&env);
    test_helpers::set_leave_flag(&env.conn, "W2", true).unwrap();

    let err = env
        .repos
        .assignment_repo
        .commit_request(&plan("R1", &["W1", "W2"]), &commit_log("R1"))
        .unwrap_err();
    match err {
        RepositoryError::EligibilityConflict { worker_id, reason } => {
            assert_eq!(worker_id, "W2");
            assert!(reason.starts_with("ON_LEAVE"));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    assert_eq!(test_helpers::count_rows(&env.conn, "assignment").unwrap(), 0);
    assert_eq!(test_helpers::count_rows(&env.conn, "work_history").unwrap(), 0);
    assert_eq!(test_helpers::count_rows(&env.conn, "action_log").unwrap(), 0);
    assert_eq!(test_helpers::worker_state(&env.conn, "W1").unwrap(), "AVAILABLE");
    assert_eq!(test_helpers::request_status(&env.conn, "R1").unwrap(), "PENDING");
}

#[test]
fn test_committer_reports_conflict_as_request_failure() {
    let env = EngineTestEnv::new();
    seed_three(&env);
    let committer = AssignmentCommitter::new(env.repos.assignment_repo.clone());
    let r1 = env.repos.request_repo.find_by_id("R1").unwrap().unwrap();
    let r2 = env.repos.request_repo.find_by_id("R2").unwrap().unwrap();

    // 选定之后、落库之前人员请假
    test_helpers::set_leave_flag(&env.conn, "W2", true).unwrap();
    let err = committer
        .commit(&r1, &["W1".to_string(), "W2".to_string()], "tester", serde_json::json!({}))
        .unwrap_err();
    assert_eq!(err.code(), "COMMIT_CONFLICT");
    match err {
        FulfillmentFailure::CommitConflict { worker_id, reason } => {
            assert_eq!(worker_id, "W2");
            assert!(reason.starts_with("ON_LEAVE"));
        }
        other => panic!("unexpected failure: {:?}", other),
    }

    // 同批另一需求不受影响
    let receipt = committer
        .commit(&r2, &["W1".to_string()], "tester", serde_json::json!({}))
        .unwrap();
    assert_eq!(receipt.assignments.len(), 1);
    assert_eq!(test_helpers::request_status(&env.conn, "R1").unwrap(), "PENDING");
    assert_eq!(test_helpers::request_status(&env.conn, "R2").unwrap(), "FULFILLED");
    assert_eq!(test_helpers::count_rows(&env.conn, "action_log").unwrap(), 1);
}

#[test]
fn test_worker_booked_on_other_request_same_day_is_rejected() {
    let env = EngineTestEnv::new();
    seed_three(&env);
    let repo = &env.repos.assignment_repo;

    repo.commit_request(&plan("R1", &["W1", "W2"]), &commit_log("R1")).unwrap();

    // 人为恢复状态，只留下同日调配记录
    test_helpers::set_worker_state(&env.conn, "W1", "AVAILABLE").unwrap();
    let err = repo
        .commit_request(&plan("R2", &["W1"]), &commit_log("R2"))
        .unwrap_err();
    match err {
        RepositoryError::EligibilityConflict { reason, .. } => {
            assert!(reason.starts_with("DOUBLE_BOOKED"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(test_helpers::request_status(&env.conn, "R2").unwrap(), "PENDING");
}

#[test]
fn test_deactivated_worker_is_rejected() {
    let env = EngineTestEnv::new();
    seed_three(&env);
    test_helpers::set_worker_state(&env.conn, "W3", "DEACTIVATED").unwrap();

    let err = env
        .repos
        .assignment_repo
        .commit_request(&plan("R2", &["W3"]), &commit_log("R2"))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::EligibilityConflict { .. }));
}

#[test]
fn test_recommit_restores_displaced_worker() {
    let env = EngineTestEnv::new();
    seed_three(&env);
    let repo = &env.repos.assignment_repo;

    repo.commit_request(&plan("R1", &["W1", "W2"]), &commit_log("R1")).unwrap();
    let receipt = repo
        .commit_request(&plan("R1", &["W1", "W3"]), &commit_log("R1"))
        .unwrap();

    assert_eq!(receipt.displaced_worker_ids, vec!["W2".to_string()]);
    assert_eq!(receipt.restored_worker_ids, vec!["W2".to_string()]);
    assert_eq!(test_helpers::worker_state(&env.conn, "W2").unwrap(), "AVAILABLE");
    assert_eq!(test_helpers::worker_state(&env.conn, "W1").unwrap(), "ASSIGNED");
    assert_eq!(test_helpers::worker_state(&env.conn, "W3").unwrap(), "ASSIGNED");
    assert_eq!(repo.find_by_request("R1").unwrap().len(), 2);
    assert_eq!(test_helpers::count_rows(&env.conn, "work_history").unwrap(), 2);
}

#[test]
fn test_duplicate_worker_in_plan_is_conflict() {
    let env = EngineTestEnv::new();
    seed_three(&env);

    let err = env
        .repos
        .assignment_repo
        .commit_request(&plan("R1", &["W1", "W1"]), &commit_log("R1"))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::EligibilityConflict { .. }));
    assert_eq!(test_helpers::count_rows(&env.conn, "assignment").unwrap(), 0);
}

#[test]
fn test_commit_for_missing_request_is_not_found() {
    let env = EngineTestEnv::new();
    seed_three(&env);

    let err = env
        .repos
        .assignment_repo
        .commit_request(&plan("NOPE", &["W1"]), &commit_log("NOPE"))
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[test]
fn test_revert_requires_fulfilled_request() {
    let env = EngineTestEnv::new();
    seed_three(&env);
    let repo = &env.repos.assignment_repo;
    let log = ActionLog::new(ActionType::RequestRevision, "tester", Some("R1"), None, None);

    let err = repo.revert_request("R1", &log, ts()).unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidStateTransition { .. }));

    repo.commit_request(&plan("R1", &["W1"]), &commit_log("R1")).unwrap();
    let receipt = repo.revert_request("R1", &log, ts()).unwrap();
    assert_eq!(receipt.removed_assignments, 1);
    assert_eq!(receipt.restored_worker_ids, vec!["W1".to_string()]);
    assert_eq!(
        test_helpers::request_status(&env.conn, "R1").unwrap(),
        "REVISION_REQUESTED"
    );
}
