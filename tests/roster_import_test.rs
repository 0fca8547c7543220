// ==========================================
// 花名册导入集成测试
// ==========================================

#[path = "helpers/mock_config.rs"]
mod mock_config;
#[path = "helpers/engine_env.rs"]
mod engine_env;
#[path = "helpers/test_data_builder.rs"]
mod test_data_builder;

use engine_env::{test_helpers, EngineTestEnv};
use staffing_fulfillment::domain::types::{EmploymentType, Gender};
use staffing_fulfillment::importer::{ImportError, RosterImporter};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use test_data_builder::*;

const ACTOR: &str = "importer";

fn importer(env: &EngineTestEnv) -> RosterImporter {
    for u in standard_units() {
        env.repos.worker_repo.upsert_unit(&u).unwrap();
    }
    RosterImporter::new(
        Arc::clone(&env.repos.worker_repo),
        Arc::clone(&env.repos.action_log_repo),
    )
}

#[test]
fn test_import_valid_rows_and_collect_row_errors() {
    let env = EngineTestEnv::new();
    let importer = importer(&env);

    let csv = "\
worker_id,display_name,gender,employment_type,units,dedicated_unit,leave_flag
W1,张三,M,PERMANENT,U1;U2,U1,
W2,李四,F,DAILY,U3,,yes
W3,王五,X,PERMANENT,U1,,
W4,赵六,M,PERMANENT,U9,,
W1,重复,M,PERMANENT,U1,,
W5,钱七,F,PERMANENT,U1,U2,
";
    let summary = importer.import_reader(csv.as_bytes(), ACTOR).unwrap();

    assert_eq!(summary.total_rows, 6);
    assert_eq!(summary.imported, 2);
    assert_eq!(summary.rejected, 4);
    let rows: Vec<usize> = summary.errors.iter().map(|e| e.row).collect();
    assert_eq!(rows, vec![3, 4, 5, 6]);
    assert!(summary.errors[0].message.contains("invalid gender"));
    assert!(summary.errors[1].message.contains("unknown unit: U9"));
    assert!(summary.errors[2].message.contains("duplicate"));
    assert!(summary.errors[3].message.contains("dedicated_unit"));

    let workers = env
        .repos
        .worker_repo
        .find_by_ids(&["W1".to_string(), "W2".to_string()])
        .unwrap();
    let w1 = &workers["W1"];
    assert_eq!(w1.gender, Gender::Male);
    assert_eq!(w1.memberships.len(), 2);
    assert!(w1
        .memberships
        .iter()
        .any(|m| m.unit_id == "U1" && m.section_id == "S1" && m.dedicated));
    let w2 = &workers["W2"];
    assert_eq!(w2.employment_type, EmploymentType::Daily);
    assert!(w2.leave_flag);
    assert_eq!(w2.memberships[0].section_id, "S2");

    let logs = env
        .repos
        .action_log_repo
        .find_by_action_type("ROSTER_IMPORT", 10)
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].actor, ACTOR);
}

#[test]
fn test_reimport_keeps_assignment_state() {
    let env = EngineTestEnv::new();
    let importer = importer(&env);

    let csv = "worker_id,display_name,gender,employment_type,units\nW1,张三,M,PERMANENT,U1\n";
    importer.import_reader(csv.as_bytes(), ACTOR).unwrap();
    test_helpers::set_worker_state(&env.conn, "W1", "ASSIGNED").unwrap();

    let renamed = "worker_id,display_name,gender,employment_type,units\nW1,张三丰,M,PERMANENT,U1;U3\n";
    let summary = importer.import_reader(renamed.as_bytes(), ACTOR).unwrap();
    assert_eq!(summary.imported, 1);

    assert_eq!(test_helpers::worker_state(&env.conn, "W1").unwrap(), "ASSIGNED");
    let w = &env.repos.worker_repo.find_by_ids(&["W1".to_string()]).unwrap()["W1"];
    assert_eq!(w.display_name, "张三丰");
    assert_eq!(w.memberships.len(), 2);
}

#[test]
fn test_missing_column_is_rejected_up_front() {
    let env = EngineTestEnv::new();
    let importer = importer(&env);

    let csv = "worker_id,display_name,gender,units\nW1,张三,M,U1\n";
    let err = importer.import_reader(csv.as_bytes(), ACTOR).unwrap_err();
    assert!(matches!(err, ImportError::MissingColumn(ref c) if c == "employment_type"));
    assert_eq!(test_helpers::count_rows(&env.conn, "worker").unwrap(), 0);
}

#[test]
fn test_import_from_file() {
    let env = EngineTestEnv::new();
    let importer = importer(&env);

    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "worker_id,display_name,gender,employment_type,units").unwrap();
    writeln!(file, "W1,张三,MALE,PERMANENT,U1").unwrap();
    writeln!(file, "W2,李四,FEMALE,DAILY,U2").unwrap();
    file.flush().unwrap();

    let summary = importer.import_csv(file.path(), ACTOR).unwrap();
    assert_eq!(summary.imported, 2);
    assert!(summary.errors.is_empty());
    assert_eq!(test_helpers::count_rows(&env.conn, "worker").unwrap(), 2);
}

#[test]
fn test_missing_file_is_reported() {
    let env = EngineTestEnv::new();
    let importer = importer(&env);

    let err = importer
        .import_csv("/nonexistent/roster.csv", ACTOR)
        .unwrap_err();
    assert!(matches!(err, ImportError::FileNotFound(_)));
}
