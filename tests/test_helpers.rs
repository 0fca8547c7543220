// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、外部状态模拟等功能
// ==========================================

#![allow(dead_code)]

use rusqlite::Connection;
use staffing_fulfillment::db::{ensure_schema, open_sqlite_connection};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接（与 AppState 相同的 Arc<Mutex<Connection>> 形态）
pub fn open_shared(db_path: &str) -> Result<Arc<Mutex<Connection>>, Box<dyn Error>> {
    let conn = open_sqlite_connection(db_path)?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// 直接改写人员可用状态（模拟外部停用流程）
pub fn set_worker_state(
    conn: &Arc<Mutex<Connection>>,
    worker_id: &str,
    state: &str,
) -> Result<(), Box<dyn Error>> {
    let c = conn.lock().map_err(|e| e.to_string())?;
    c.execute(
        "UPDATE worker SET availability_state = ?1 WHERE worker_id = ?2",
        rusqlite::params![state, worker_id],
    )?;
    Ok(())
}

/// 直接改写请假标记（模拟外部请假流程）
pub fn set_leave_flag(
    conn: &Arc<Mutex<Connection>>,
    worker_id: &str,
    on_leave: bool,
) -> Result<(), Box<dyn Error>> {
    let c = conn.lock().map_err(|e| e.to_string())?;
    c.execute(
        "UPDATE worker SET leave_flag = ?1 WHERE worker_id = ?2",
        rusqlite::params![if on_leave { 1 } else { 0 }, worker_id],
    )?;
    Ok(())
}

/// 读取人员当前可用状态
pub fn worker_state(conn: &Arc<Mutex<Connection>>, worker_id: &str) -> Result<String, Box<dyn Error>> {
    let c = conn.lock().map_err(|e| e.to_string())?;
    Ok(c.query_row(
        "SELECT availability_state FROM worker WHERE worker_id = ?1",
        [worker_id],
        |row| row.get(0),
    )?)
}

/// 读取需求当前状态
pub fn request_status(conn: &Arc<Mutex<Connection>>, request_id: &str) -> Result<String, Box<dyn Error>> {
    let c = conn.lock().map_err(|e| e.to_string())?;
    Ok(c.query_row(
        "SELECT status FROM staffing_request WHERE request_id = ?1",
        [request_id],
        |row| row.get(0),
    )?)
}

/// 统计表行数
pub fn count_rows(conn: &Arc<Mutex<Connection>>, table: &str) -> Result<i64, Box<dyn Error>> {
    let c = conn.lock().map_err(|e| e.to_string())?;
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    Ok(c.query_row(&sql, [], |row| row.get(0))?)
}
