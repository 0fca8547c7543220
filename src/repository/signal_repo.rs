// ==========================================
// 人员调配系统 - 人员历史信号仓储
// ==========================================
// 职责: 批量加载特征提取所需的出勤历史、周负荷、考核、评分、人工加权
// 说明: 考核/评分/周负荷由外部流程写入，这里提供写入方法供导入与测试使用
// ==========================================

use crate::domain::worker::{
    AssessmentResult, PriorityOverride, RatingRecord, WeeklyWorkload, WorkHistoryRecord,
    WorkerSignals,
};
use crate::repository::error::{
    parse_date, parse_datetime, RepositoryError, RepositoryResult, DATE_FMT, DATETIME_FMT,
};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const ID_CHUNK_SIZE: usize = 400;

// ==========================================
// WorkerSignalRepository - 人员信号仓储
// ==========================================
pub struct WorkerSignalRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkerSignalRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 批量加载
    // ==========================================

    /// 批量加载人员信号
    ///
    /// # 参数
    /// - `worker_ids`: 候选人员
    /// - `before`: 只加载该日期之前的出勤历史（不含当日）
    ///
    /// # 返回
    /// worker_id → WorkerSignals；无任何信号的人员也会返回默认值
    pub fn load_signals(
        &self,
        worker_ids: &[String],
        before: NaiveDate,
    ) -> RepositoryResult<HashMap<String, WorkerSignals>> {
        let conn = self.get_conn()?;
        let mut signals: HashMap<String, WorkerSignals> = worker_ids
            .iter()
            .map(|id| (id.clone(), WorkerSignals::default()))
            .collect();
        let before_str = before.format(DATE_FMT).to_string();

        for chunk in worker_ids.chunks(ID_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");

            // ===== 出勤历史（日期降序）=====
            {
                let sql = format!(
                    r#"SELECT worker_id, work_date, request_id, shift_code
                       FROM work_history
                       WHERE work_date < ? AND worker_id IN ({})
                       ORDER BY worker_id, work_date DESC, request_id"#,
                    placeholders
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params_from_iter(Self::bind(&before_str, chunk)), |row| {
                        let raw: String = row.get(1)?;
                        Ok(WorkHistoryRecord {
                            worker_id: row.get(0)?,
                            work_date: parse_date(1, "work_date", &raw)?,
                            request_id: row.get(2)?,
                            shift_code: row.get(3)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                for r in rows {
                    if let Some(s) = signals.get_mut(&r.worker_id) {
                        s.history.push(r);
                    }
                }
            }

            // ===== 需求日期之前最近一周负荷快照 =====
            {
                let numbered = (2..chunk.len() + 2)
                    .map(|i| format!("?{}", i))
                    .collect::<Vec<_>>()
                    .join(", ");
                let sql = format!(
                    r#"SELECT worker_id, week_start, work_count
                       FROM weekly_workload w
                       WHERE worker_id IN ({})
                         AND week_start <= ?1
                         AND week_start = (SELECT MAX(week_start) FROM weekly_workload
                                           WHERE worker_id = w.worker_id AND week_start <= ?1)"#,
                    numbered
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params_from_iter(Self::bind(&before_str, chunk)), |row| {
                        let raw: String = row.get(1)?;
                        Ok(WeeklyWorkload {
                            worker_id: row.get(0)?,
                            week_start: parse_date(1, "week_start", &raw)?,
                            work_count: row.get(2)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                for r in rows {
                    if let Some(s) = signals.get_mut(&r.worker_id) {
                        s.latest_weekly_load = Some(r);
                    }
                }
            }

            // ===== 最近一次考核 =====
            {
                let sql = format!(
                    r#"SELECT worker_id, assessed_at, passed
                       FROM assessment_result
                       WHERE worker_id IN ({})
                       ORDER BY worker_id, assessed_at, assessment_id"#,
                    placeholders
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params_from_iter(chunk.iter()), |row| {
                        let raw: String = row.get(1)?;
                        Ok(AssessmentResult {
                            worker_id: row.get(0)?,
                            assessed_at: parse_datetime(1, "assessed_at", &raw)?,
                            passed: row.get::<_, i32>(2)? != 0,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                // 升序遍历，最后写入的即最新一次
                for r in rows {
                    if let Some(s) = signals.get_mut(&r.worker_id) {
                        s.latest_assessment = Some(r);
                    }
                }
            }

            // ===== 评分 =====
            {
                let sql = format!(
                    r#"SELECT worker_id, score, rated_at
                       FROM rating_record
                       WHERE worker_id IN ({})
                       ORDER BY worker_id, rated_at, rating_id"#,
                    placeholders
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params_from_iter(chunk.iter()), |row| {
                        let raw: String = row.get(2)?;
                        Ok(RatingRecord {
                            worker_id: row.get(0)?,
                            score: row.get(1)?,
                            rated_at: parse_datetime(2, "rated_at", &raw)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                for r in rows {
                    if let Some(s) = signals.get_mut(&r.worker_id) {
                        s.ratings.push(r);
                    }
                }
            }

            // ===== 人工加权 =====
            {
                let sql = format!(
                    r#"SELECT override_id, worker_id, weight_multiplier, unit_scope
                       FROM priority_override
                       WHERE worker_id IN ({})
                       ORDER BY worker_id, override_id"#,
                    placeholders
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params_from_iter(chunk.iter()), |row| {
                        let scope_raw: String = row.get(3)?;
                        Ok(PriorityOverride {
                            override_id: row.get(0)?,
                            worker_id: row.get(1)?,
                            weight_multiplier: row.get(2)?,
                            unit_scope: parse_unit_scope(&scope_raw),
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                for r in rows {
                    if let Some(s) = signals.get_mut(&r.worker_id) {
                        s.overrides.push(r);
                    }
                }
            }
        }

        Ok(signals)
    }

    /// 组装 [before, id...] 绑定参数
    fn bind(before: &str, ids: &[String]) -> Vec<Value> {
        let mut values = Vec::with_capacity(ids.len() + 1);
        values.push(Value::Text(before.to_string()));
        values.extend(ids.iter().map(|id| Value::Text(id.clone())));
        values
    }

    // ==========================================
    // 写入（外部流程 / 导入 / 测试数据）
    // ==========================================

    /// 写入历史出勤（外部导入用；需求满足时的写入由提交事务完成）
    pub fn insert_history(&self, record: &WorkHistoryRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT OR REPLACE INTO work_history (worker_id, work_date, request_id, shift_code)
               VALUES (?1, ?2, ?3, ?4)"#,
            params![
                record.worker_id,
                record.work_date.format(DATE_FMT).to_string(),
                record.request_id,
                record.shift_code,
            ],
        )?;
        Ok(())
    }

    pub fn upsert_weekly_workload(&self, load: &WeeklyWorkload) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO weekly_workload (worker_id, week_start, work_count)
               VALUES (?1, ?2, ?3)
               ON CONFLICT(worker_id, week_start) DO UPDATE SET work_count = ?3"#,
            params![
                load.worker_id,
                load.week_start.format(DATE_FMT).to_string(),
                load.work_count,
            ],
        )?;
        Ok(())
    }

    pub fn insert_assessment(&self, result: &AssessmentResult) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO assessment_result (worker_id, assessed_at, passed) VALUES (?1, ?2, ?3)",
            params![
                result.worker_id,
                result.assessed_at.format(DATETIME_FMT).to_string(),
                if result.passed { 1 } else { 0 },
            ],
        )?;
        Ok(())
    }

    pub fn insert_rating(&self, rating: &RatingRecord) -> RepositoryResult<()> {
        if !(0.0..=5.0).contains(&rating.score) {
            return Err(RepositoryError::FieldValueError {
                field: "score".to_string(),
                message: format!("rating must be within 0..=5, got {}", rating.score),
            });
        }
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO rating_record (worker_id, score, rated_at) VALUES (?1, ?2, ?3)",
            params![
                rating.worker_id,
                rating.score,
                rating.rated_at.format(DATETIME_FMT).to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn upsert_override(&self, o: &PriorityOverride) -> RepositoryResult<()> {
        if !(o.weight_multiplier.is_finite() && o.weight_multiplier > 0.0) {
            return Err(RepositoryError::FieldValueError {
                field: "weight_multiplier".to_string(),
                message: format!("must be a positive number, got {}", o.weight_multiplier),
            });
        }
        let scope = serde_json::to_string(&o.unit_scope)
            .map_err(|e| RepositoryError::InternalError(e.to_string()))?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO priority_override (override_id, worker_id, weight_multiplier, unit_scope)
               VALUES (?1, ?2, ?3, ?4)
               ON CONFLICT(override_id) DO UPDATE SET
                   worker_id = ?2, weight_multiplier = ?3, unit_scope = ?4"#,
            params![o.override_id, o.worker_id, o.weight_multiplier, scope],
        )?;
        Ok(())
    }
}

/// 解析 unit_scope（JSON 数组；兼容逗号分隔的旧格式）
fn parse_unit_scope(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<String>>(trimmed) {
        Ok(v) => v,
        Err(_) => trimmed
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    }
}
