// ==========================================
// 人员调配系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 内置建表脚本（幂等），供 CLI 初始化与测试复用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 建表脚本（全部 IF NOT EXISTS，可重复执行）
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS organizational_unit (
    unit_id TEXT PRIMARY KEY,
    section_id TEXT NOT NULL,
    unit_name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS worker (
    worker_id TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    gender TEXT NOT NULL,
    employment_type TEXT NOT NULL,
    availability_state TEXT NOT NULL DEFAULT 'AVAILABLE',
    leave_flag INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS worker_unit (
    worker_id TEXT NOT NULL REFERENCES worker(worker_id) ON DELETE CASCADE,
    unit_id TEXT NOT NULL REFERENCES organizational_unit(unit_id) ON DELETE CASCADE,
    dedicated INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (worker_id, unit_id)
);

CREATE TABLE IF NOT EXISTS staffing_request (
    request_id TEXT PRIMARY KEY,
    unit_id TEXT NOT NULL REFERENCES organizational_unit(unit_id),
    work_date TEXT NOT NULL,
    shift_code TEXT,
    required_total INTEGER NOT NULL,
    required_male INTEGER NOT NULL DEFAULT 0,
    required_female INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'PENDING',
    fulfilled_by TEXT,
    fulfilled_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS assignment (
    assignment_id TEXT PRIMARY KEY,
    worker_id TEXT NOT NULL REFERENCES worker(worker_id),
    request_id TEXT NOT NULL REFERENCES staffing_request(request_id),
    work_date TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'PENDING',
    shift_code TEXT,
    assigned_by TEXT NOT NULL,
    assigned_at TEXT NOT NULL,
    UNIQUE (worker_id, request_id)
);
CREATE INDEX IF NOT EXISTS idx_assignment_date ON assignment(work_date);
CREATE INDEX IF NOT EXISTS idx_assignment_request ON assignment(request_id);

CREATE TABLE IF NOT EXISTS work_history (
    worker_id TEXT NOT NULL REFERENCES worker(worker_id),
    work_date TEXT NOT NULL,
    request_id TEXT NOT NULL,
    shift_code TEXT,
    PRIMARY KEY (worker_id, work_date, request_id)
);

CREATE TABLE IF NOT EXISTS weekly_workload (
    worker_id TEXT NOT NULL REFERENCES worker(worker_id),
    week_start TEXT NOT NULL,
    work_count INTEGER NOT NULL,
    PRIMARY KEY (worker_id, week_start)
);

CREATE TABLE IF NOT EXISTS assessment_result (
    assessment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    worker_id TEXT NOT NULL REFERENCES worker(worker_id),
    assessed_at TEXT NOT NULL,
    passed INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS rating_record (
    rating_id INTEGER PRIMARY KEY AUTOINCREMENT,
    worker_id TEXT NOT NULL REFERENCES worker(worker_id),
    score REAL NOT NULL,
    rated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS priority_override (
    override_id TEXT PRIMARY KEY,
    worker_id TEXT NOT NULL REFERENCES worker(worker_id),
    weight_multiplier REAL NOT NULL,
    unit_scope TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS action_log (
    action_id TEXT PRIMARY KEY,
    action_type TEXT NOT NULL,
    action_ts TEXT NOT NULL,
    actor TEXT NOT NULL,
    request_id TEXT,
    payload_json TEXT,
    detail TEXT
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表并登记 schema_version（幂等）
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    configure_sqlite_connection(conn)?;
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
