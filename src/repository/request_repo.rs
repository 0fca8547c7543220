// ==========================================
// 人员调配系统 - 用工需求仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 需求由外部流程创建；状态流转只在 AssignmentRepository 的事务中发生
// ==========================================

use crate::domain::request::StaffingRequest;
use crate::domain::types::RequestStatus;
use crate::repository::error::{
    conversion_error, parse_date, parse_datetime, RepositoryError, RepositoryResult, DATE_FMT,
    DATETIME_FMT,
};
use chrono::NaiveDate;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const SELECT_REQUEST: &str = r#"
    SELECT r.request_id, r.unit_id, ou.section_id, r.work_date, r.shift_code,
           r.required_total, r.required_male, r.required_female, r.status,
           r.fulfilled_by, r.fulfilled_at, r.created_at, r.updated_at
    FROM staffing_request r
    JOIN organizational_unit ou ON ou.unit_id = r.unit_id
"#;

// ==========================================
// StaffingRequestRepository - 用工需求仓储
// ==========================================
pub struct StaffingRequestRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StaffingRequestRepository {
    /// 创建新的StaffingRequestRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增需求
    ///
    /// # 返回
    /// - `Ok(request_id)`: 成功
    /// - `Err`: 数据库错误（班组不存在时为外键错误）
    pub fn insert(&self, request: &StaffingRequest) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO staffing_request (
                    request_id, unit_id, work_date, shift_code,
                    required_total, required_male, required_female, status,
                    fulfilled_by, fulfilled_at, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                request.request_id,
                request.unit_id,
                request.work_date.format(DATE_FMT).to_string(),
                request.shift_code,
                request.required_total,
                request.required_male,
                request.required_female,
                request.status.to_db_str(),
                request.fulfilled_by,
                request.fulfilled_at.map(|t| t.format(DATETIME_FMT).to_string()),
                request.created_at.format(DATETIME_FMT).to_string(),
                request.updated_at.format(DATETIME_FMT).to_string(),
            ],
        )?;

        Ok(request.request_id.clone())
    }

    /// 按ID查询需求
    pub fn find_by_id(&self, request_id: &str) -> RepositoryResult<Option<StaffingRequest>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE r.request_id = ?1", SELECT_REQUEST);

        match conn.query_row(&sql, params![request_id], Self::map_row) {
            Ok(r) => Ok(Some(r)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 批量按ID查询需求
    ///
    /// # 返回
    /// request_id → 需求；不存在的ID不出现在结果中
    pub fn find_by_ids(
        &self,
        request_ids: &[String],
    ) -> RepositoryResult<HashMap<String, StaffingRequest>> {
        let conn = self.get_conn()?;
        let mut found = HashMap::new();

        for chunk in request_ids.chunks(500) {
            let sql = format!(
                "{} WHERE r.request_id IN ({})",
                SELECT_REQUEST,
                vec!["?"; chunk.len()].join(", ")
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), Self::map_row)?
                .collect::<Result<Vec<_>, _>>()?;
            for r in rows {
                found.insert(r.request_id.clone(), r);
            }
        }
        Ok(found)
    }

    /// 查询指定日期的需求（按 request_id 升序）
    pub fn list_by_date(&self, work_date: NaiveDate) -> RepositoryResult<Vec<StaffingRequest>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE r.work_date = ?1 ORDER BY r.request_id", SELECT_REQUEST);
        let mut stmt = conn.prepare(&sql)?;
        let requests = stmt
            .query_map(params![work_date.format(DATE_FMT).to_string()], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(requests)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<StaffingRequest> {
        let work_date_raw: String = row.get(3)?;
        let status_raw: String = row.get(8)?;
        let fulfilled_at_raw: Option<String> = row.get(10)?;
        let created_raw: String = row.get(11)?;
        let updated_raw: String = row.get(12)?;

        Ok(StaffingRequest {
            request_id: row.get(0)?,
            unit_id: row.get(1)?,
            section_id: row.get(2)?,
            work_date: parse_date(3, "work_date", &work_date_raw)?,
            shift_code: row.get(4)?,
            required_total: row.get(5)?,
            required_male: row.get(6)?,
            required_female: row.get(7)?,
            status: RequestStatus::from_db_str(&status_raw)
                .ok_or_else(|| conversion_error(8, "status", &status_raw))?,
            fulfilled_by: row.get(9)?,
            fulfilled_at: fulfilled_at_raw
                .map(|raw| parse_datetime(10, "fulfilled_at", &raw))
                .transpose()?,
            created_at: parse_datetime(11, "created_at", &created_raw)?,
            updated_at: parse_datetime(12, "updated_at", &updated_raw)?,
        })
    }
}
