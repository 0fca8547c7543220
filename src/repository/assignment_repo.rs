// ==========================================
// 人员调配系统 - 调配记录仓储
// ==========================================
// 红线: 人员状态流转只在本仓储的事务内发生
// 红线: 单个需求的提交/修订必须原子（一个事务），失败整体回滚
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::domain::assignment::{Assignment, CommitPlan, CommitReceipt, RevisionReceipt};
use crate::domain::types::{AssignmentStatus, AvailabilityState, RequestStatus};
use crate::repository::action_log_repo::insert_log;
use crate::repository::error::{
    conversion_error, parse_date, parse_datetime, RepositoryError, RepositoryResult, DATE_FMT,
    DATETIME_FMT,
};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const SELECT_ASSIGNMENT: &str = r#"
    SELECT assignment_id, worker_id, request_id, work_date, status,
           shift_code, assigned_by, assigned_at
    FROM assignment
"#;

// ==========================================
// AssignmentRepository - 调配记录仓储
// ==========================================
pub struct AssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AssignmentRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 查询需求下的调配（按 assigned_at, worker_id）
    pub fn find_by_request(&self, request_id: &str) -> RepositoryResult<Vec<Assignment>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE request_id = ?1 ORDER BY assigned_at, worker_id",
            SELECT_ASSIGNMENT
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![request_id], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 查询某日所有调配（候选池构建的同日冲突快照）
    pub fn find_by_date(&self, work_date: NaiveDate) -> RepositoryResult<Vec<Assignment>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE work_date = ?1 ORDER BY request_id, worker_id",
            SELECT_ASSIGNMENT
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![work_date.format(DATE_FMT).to_string()], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ==========================================
    // 提交（单事务）
    // ==========================================

    /// 提交单个需求的调配
    ///
    /// # 事务内步骤
    /// 1. 校验需求存在且日期一致
    /// 2. 逐个复核所选人员（并发状态变化 → EligibilityConflict）
    /// 3. 删除旧调配与出勤历史；被替换的人员若当日无其他调配则恢复 AVAILABLE
    /// 4. 写入新调配与出勤历史；所选人员置为 ASSIGNED
    /// 5. 需求置为 FULFILLED；写操作日志
    ///
    /// 任一步失败整体回滚
    pub fn commit_request(
        &self,
        plan: &CommitPlan,
        log: &ActionLog,
    ) -> RepositoryResult<CommitReceipt> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let request_date = Self::load_request_date(&tx, &plan.request_id)?;
        if request_date != plan.work_date {
            return Err(RepositoryError::ValidationError(format!(
                "commit plan date {} does not match request {} date {}",
                plan.work_date, plan.request_id, request_date
            )));
        }

        let prior = Self::load_request_workers(&tx, &plan.request_id)?;
        let prior_set: HashSet<&str> = prior.iter().map(|s| s.as_str()).collect();

        // ===== 复核 =====
        let mut seen: HashSet<&str> = HashSet::new();
        for worker_id in &plan.worker_ids {
            if !seen.insert(worker_id.as_str()) {
                return Err(conflict(worker_id, "DUPLICATE: worker selected twice"));
            }
            Self::revalidate_worker(
                &tx,
                worker_id,
                &plan.request_id,
                request_date,
                prior_set.contains(worker_id.as_str()),
            )?;
        }

        // ===== 清理旧调配 =====
        let removed = Self::delete_request_rows(&tx, &plan.request_id)?;
        let displaced: Vec<String> = prior
            .iter()
            .filter(|w| !seen.contains(w.as_str()))
            .cloned()
            .collect();
        let restored = Self::restore_available(&tx, &displaced, request_date)?;

        // ===== 写入新调配 =====
        let date_str = request_date.format(DATE_FMT).to_string();
        let ts_str = plan.committed_at.format(DATETIME_FMT).to_string();
        let mut assignments = Vec::with_capacity(plan.worker_ids.len());
        for worker_id in &plan.worker_ids {
            let assignment = Assignment {
                assignment_id: uuid::Uuid::new_v4().to_string(),
                worker_id: worker_id.clone(),
                request_id: plan.request_id.clone(),
                work_date: request_date,
                status: AssignmentStatus::Pending,
                shift_code: plan.shift_code.clone(),
                assigned_by: plan.actor.clone(),
                assigned_at: plan.committed_at,
            };
            tx.execute(
                r#"INSERT INTO assignment (
                        assignment_id, worker_id, request_id, work_date, status,
                        shift_code, assigned_by, assigned_at
                   ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
                params![
                    assignment.assignment_id,
                    assignment.worker_id,
                    assignment.request_id,
                    date_str,
                    assignment.status.to_db_str(),
                    assignment.shift_code,
                    assignment.assigned_by,
                    ts_str,
                ],
            )?;
            tx.execute(
                r#"INSERT INTO work_history (worker_id, work_date, request_id, shift_code)
                   VALUES (?1, ?2, ?3, ?4)"#,
                params![worker_id, date_str, plan.request_id, plan.shift_code],
            )?;
            tx.execute(
                "UPDATE worker SET availability_state = ?1, updated_at = ?2 WHERE worker_id = ?3",
                params![AvailabilityState::Assigned.to_db_str(), ts_str, worker_id],
            )?;
            assignments.push(assignment);
        }

        tx.execute(
            r#"UPDATE staffing_request
               SET status = ?1, fulfilled_by = ?2, fulfilled_at = ?3, updated_at = ?3
               WHERE request_id = ?4"#,
            params![
                RequestStatus::Fulfilled.to_db_str(),
                plan.actor,
                ts_str,
                plan.request_id
            ],
        )?;

        insert_log(&tx, log)?;
        tx.commit()?;

        debug!(
            request_id = %plan.request_id,
            removed_assignments = removed,
            restored = restored.len(),
            "旧调配已替换"
        );
        info!(
            request_id = %plan.request_id,
            assigned = assignments.len(),
            "需求调配已提交"
        );

        Ok(CommitReceipt {
            request_id: plan.request_id.clone(),
            assignments,
            displaced_worker_ids: displaced,
            restored_worker_ids: restored,
        })
    }

    /// 需求修订：撤销全部调配并退回 REVISION_REQUESTED（单事务）
    pub fn revert_request(
        &self,
        request_id: &str,
        log: &ActionLog,
        at: NaiveDateTime,
    ) -> RepositoryResult<RevisionReceipt> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let status = Self::load_request_status(&tx, request_id)?;
        if status != RequestStatus::Fulfilled {
            return Err(RepositoryError::InvalidStateTransition {
                from: status.to_db_str().to_string(),
                to: RequestStatus::RevisionRequested.to_db_str().to_string(),
            });
        }
        let request_date = Self::load_request_date(&tx, request_id)?;

        let prior = Self::load_request_workers(&tx, request_id)?;
        let removed = Self::delete_request_rows(&tx, request_id)?;
        let restored = Self::restore_available(&tx, &prior, request_date)?;

        tx.execute(
            r#"UPDATE staffing_request
               SET status = ?1, fulfilled_by = NULL, fulfilled_at = NULL, updated_at = ?2
               WHERE request_id = ?3"#,
            params![
                RequestStatus::RevisionRequested.to_db_str(),
                at.format(DATETIME_FMT).to_string(),
                request_id
            ],
        )?;

        insert_log(&tx, log)?;
        tx.commit()?;

        info!(request_id = %request_id, removed, "需求已退回修订");

        Ok(RevisionReceipt {
            request_id: request_id.to_string(),
            removed_assignments: removed,
            restored_worker_ids: restored,
        })
    }

    // ==========================================
    // 事务内辅助
    // ==========================================

    fn load_request_date(tx: &Transaction, request_id: &str) -> RepositoryResult<NaiveDate> {
        let raw: Option<String> = tx
            .query_row(
                "SELECT work_date FROM staffing_request WHERE request_id = ?1",
                params![request_id],
                |row| row.get(0),
            )
            .optional()?;
        let raw = raw.ok_or_else(|| RepositoryError::NotFound {
            entity: "StaffingRequest".to_string(),
            id: request_id.to_string(),
        })?;
        Ok(parse_date(0, "work_date", &raw)?)
    }

    fn load_request_status(tx: &Transaction, request_id: &str) -> RepositoryResult<RequestStatus> {
        let raw: Option<String> = tx
            .query_row(
                "SELECT status FROM staffing_request WHERE request_id = ?1",
                params![request_id],
                |row| row.get(0),
            )
            .optional()?;
        let raw = raw.ok_or_else(|| RepositoryError::NotFound {
            entity: "StaffingRequest".to_string(),
            id: request_id.to_string(),
        })?;
        RequestStatus::from_db_str(&raw).ok_or_else(|| RepositoryError::FieldValueError {
            field: "status".to_string(),
            message: raw.clone(),
        })
    }

    fn load_request_workers(tx: &Transaction, request_id: &str) -> RepositoryResult<Vec<String>> {
        let mut stmt =
            tx.prepare("SELECT worker_id FROM assignment WHERE request_id = ?1 ORDER BY worker_id")?;
        let ids = stmt
            .query_map(params![request_id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    /// 复核单个人员（读取事务内的最新状态）
    fn revalidate_worker(
        tx: &Transaction,
        worker_id: &str,
        request_id: &str,
        work_date: NaiveDate,
        already_on_request: bool,
    ) -> RepositoryResult<()> {
        let row: Option<(String, i32)> = tx
            .query_row(
                "SELECT availability_state, leave_flag FROM worker WHERE worker_id = ?1",
                params![worker_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (state_raw, leave_flag) = match row {
            Some(r) => r,
            None => return Err(conflict(worker_id, "NOT_FOUND: worker does not exist")),
        };
        let state = AvailabilityState::from_db_str(&state_raw)
            .ok_or_else(|| conflict(worker_id, &format!("BAD_STATE: {}", state_raw)))?;

        if leave_flag != 0 {
            return Err(conflict(worker_id, "ON_LEAVE: leave flag set"));
        }
        match state {
            AvailabilityState::Available => {}
            AvailabilityState::Assigned if already_on_request => {}
            other => {
                return Err(conflict(
                    worker_id,
                    &format!("NOT_AVAILABLE: availability is {}", other),
                ))
            }
        }

        let other_request: Option<String> = tx
            .query_row(
                r#"SELECT request_id FROM assignment
                   WHERE worker_id = ?1 AND work_date = ?2 AND request_id <> ?3
                   LIMIT 1"#,
                params![worker_id, work_date.format(DATE_FMT).to_string(), request_id],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(other) = other_request {
            return Err(conflict(
                worker_id,
                &format!("DOUBLE_BOOKED: already assigned to {} on {}", other, work_date),
            ));
        }
        Ok(())
    }

    fn delete_request_rows(tx: &Transaction, request_id: &str) -> RepositoryResult<usize> {
        tx.execute(
            "DELETE FROM work_history WHERE request_id = ?1",
            params![request_id],
        )?;
        let removed = tx.execute(
            "DELETE FROM assignment WHERE request_id = ?1",
            params![request_id],
        )?;
        Ok(removed)
    }

    /// 将已不在任何同日调配中的 ASSIGNED 人员恢复为 AVAILABLE
    fn restore_available(
        tx: &Transaction,
        worker_ids: &[String],
        work_date: NaiveDate,
    ) -> RepositoryResult<Vec<String>> {
        let date_str = work_date.format(DATE_FMT).to_string();
        let mut restored = Vec::new();
        for worker_id in worker_ids {
            let still_booked: bool = tx
                .query_row(
                    "SELECT 1 FROM assignment WHERE worker_id = ?1 AND work_date = ?2 LIMIT 1",
                    params![worker_id, date_str],
                    |_row| Ok(true),
                )
                .optional()?
                .unwrap_or(false);
            if still_booked {
                continue;
            }
            let changed = tx.execute(
                r#"UPDATE worker SET availability_state = ?1, updated_at = datetime('now', 'localtime')
                   WHERE worker_id = ?2 AND availability_state = ?3"#,
                params![
                    AvailabilityState::Available.to_db_str(),
                    worker_id,
                    AvailabilityState::Assigned.to_db_str()
                ],
            )?;
            if changed > 0 {
                restored.push(worker_id.clone());
            }
        }
        Ok(restored)
    }

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Assignment> {
        let date_raw: String = row.get(3)?;
        let status_raw: String = row.get(4)?;
        let at_raw: String = row.get(7)?;
        Ok(Assignment {
            assignment_id: row.get(0)?,
            worker_id: row.get(1)?,
            request_id: row.get(2)?,
            work_date: parse_date(3, "work_date", &date_raw)?,
            status: AssignmentStatus::from_db_str(&status_raw)
                .ok_or_else(|| conversion_error(4, "status", &status_raw))?,
            shift_code: row.get(5)?,
            assigned_by: row.get(6)?,
            assigned_at: parse_datetime(7, "assigned_at", &at_raw)?,
        })
    }
}

fn conflict(worker_id: &str, reason: &str) -> RepositoryError {
    RepositoryError::EligibilityConflict {
        worker_id: worker_id.to_string(),
        reason: reason.to_string(),
    }
}
