// ==========================================
// 人员调配系统 - 人员主数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 红线: 人员可用状态只由 AssignmentRepository 的提交事务修改
// ==========================================

use crate::domain::types::{AvailabilityState, EmploymentType, Gender};
use crate::domain::worker::{OrganizationalUnit, UnitMembership, Worker};
use crate::repository::error::{
    conversion_error, parse_datetime, RepositoryError, RepositoryResult, DATETIME_FMT,
};
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// IN 子句单批参数上限
const ID_CHUNK_SIZE: usize = 500;

// ==========================================
// WorkerRepository - 人员仓储
// ==========================================
pub struct WorkerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkerRepository {
    /// 创建新的WorkerRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 组织单元
    // ==========================================

    /// 新增或更新组织单元
    pub fn upsert_unit(&self, unit: &OrganizationalUnit) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO organizational_unit (unit_id, section_id, unit_name)
               VALUES (?1, ?2, ?3)
               ON CONFLICT(unit_id) DO UPDATE SET section_id = ?2, unit_name = ?3"#,
            params![unit.unit_id, unit.section_id, unit.unit_name],
        )?;
        Ok(())
    }

    pub fn find_unit(&self, unit_id: &str) -> RepositoryResult<Option<OrganizationalUnit>> {
        let conn = self.get_conn()?;
        match conn.query_row(
            "SELECT unit_id, section_id, unit_name FROM organizational_unit WHERE unit_id = ?1",
            params![unit_id],
            |row| {
                Ok(OrganizationalUnit {
                    unit_id: row.get(0)?,
                    section_id: row.get(1)?,
                    unit_name: row.get(2)?,
                })
            },
        ) {
            Ok(unit) => Ok(Some(unit)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ==========================================
    // 人员写入（主数据维护，不改变调配状态语义）
    // ==========================================

    /// 批量新增或更新人员（含班组归属，事务内整体替换归属关系）
    ///
    /// # 说明
    /// - 已存在人员的 availability_state 不被覆盖（状态只由提交事务维护）
    /// - leave_flag 属于外部请假流程，随主数据一并更新
    pub fn upsert_workers(&self, workers: &[Worker]) -> RepositoryResult<usize> {
        if workers.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        for worker in workers {
            let dedicated = worker.memberships.iter().filter(|m| m.dedicated).count();
            if dedicated > 1 {
                return Err(RepositoryError::FieldValueError {
                    field: "dedicated".to_string(),
                    message: format!("worker {} has {} dedicated units", worker.worker_id, dedicated),
                });
            }

            tx.execute(
                r#"INSERT INTO worker (
                        worker_id, display_name, gender, employment_type,
                        availability_state, leave_flag, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    ON CONFLICT(worker_id) DO UPDATE SET
                        display_name = ?2, gender = ?3, employment_type = ?4,
                        leave_flag = ?6, updated_at = ?7"#,
                params![
                    worker.worker_id,
                    worker.display_name,
                    worker.gender.to_db_str(),
                    worker.employment_type.to_db_str(),
                    worker.availability_state.to_db_str(),
                    if worker.leave_flag { 1 } else { 0 },
                    worker.updated_at.format(DATETIME_FMT).to_string(),
                ],
            )?;

            tx.execute(
                "DELETE FROM worker_unit WHERE worker_id = ?1",
                params![worker.worker_id],
            )?;
            for m in &worker.memberships {
                tx.execute(
                    "INSERT INTO worker_unit (worker_id, unit_id, dedicated) VALUES (?1, ?2, ?3)",
                    params![worker.worker_id, m.unit_id, if m.dedicated { 1 } else { 0 }],
                )?;
            }
        }

        tx.commit()?;
        Ok(workers.len())
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 按ID查询人员（含班组归属）
    pub fn find_by_id(&self, worker_id: &str) -> RepositoryResult<Option<Worker>> {
        let mut found = self.find_by_ids(&[worker_id.to_string()])?;
        Ok(found.remove(worker_id))
    }

    /// 批量按ID查询人员
    pub fn find_by_ids(&self, worker_ids: &[String]) -> RepositoryResult<HashMap<String, Worker>> {
        let conn = self.get_conn()?;
        let mut workers = HashMap::new();

        for chunk in worker_ids.chunks(ID_CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                r#"SELECT worker_id, display_name, gender, employment_type,
                          availability_state, leave_flag, updated_at
                   FROM worker WHERE worker_id IN ({})"#,
                placeholders
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), Self::map_worker_row)?
                .collect::<Result<Vec<Worker>, _>>()?;
            for w in rows {
                workers.insert(w.worker_id.clone(), w);
            }
        }

        let memberships = Self::load_memberships(&conn, Some(worker_ids))?;
        for (worker_id, list) in memberships {
            if let Some(w) = workers.get_mut(&worker_id) {
                w.memberships = list;
            }
        }
        Ok(workers)
    }

    /// 查询全部人员（按 worker_id 升序，含班组归属）
    ///
    /// # 说明
    /// 停用人员也会返回，由候选池构建器统一判定
    pub fn list_all(&self) -> RepositoryResult<Vec<Worker>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT worker_id, display_name, gender, employment_type,
                      availability_state, leave_flag, updated_at
               FROM worker
               ORDER BY worker_id"#,
        )?;
        let mut workers = stmt
            .query_map([], Self::map_worker_row)?
            .collect::<Result<Vec<Worker>, _>>()?;

        let mut memberships = Self::load_memberships(&conn, None)?;
        for w in workers.iter_mut() {
            if let Some(list) = memberships.remove(&w.worker_id) {
                w.memberships = list;
            }
        }
        Ok(workers)
    }

    /// 读取班组归属（worker_id → 列表，按 unit_id 升序）
    fn load_memberships(
        conn: &Connection,
        worker_ids: Option<&[String]>,
    ) -> RepositoryResult<HashMap<String, Vec<UnitMembership>>> {
        let base_sql = r#"SELECT wu.worker_id, wu.unit_id, ou.section_id, wu.dedicated
                          FROM worker_unit wu
                          JOIN organizational_unit ou ON ou.unit_id = wu.unit_id"#;

        let map_row = |row: &rusqlite::Row| -> rusqlite::Result<(String, UnitMembership)> {
            Ok((
                row.get::<_, String>(0)?,
                UnitMembership {
                    unit_id: row.get(1)?,
                    section_id: row.get(2)?,
                    dedicated: row.get::<_, i32>(3)? != 0,
                },
            ))
        };

        let mut rows: Vec<(String, UnitMembership)> = Vec::new();
        match worker_ids {
            None => {
                let sql = format!("{} ORDER BY wu.worker_id, wu.unit_id", base_sql);
                let mut stmt = conn.prepare(&sql)?;
                rows.extend(
                    stmt.query_map([], map_row)?
                        .collect::<Result<Vec<_>, _>>()?,
                );
            }
            Some(ids) => {
                for chunk in ids.chunks(ID_CHUNK_SIZE) {
                    let sql = format!(
                        "{} WHERE wu.worker_id IN ({}) ORDER BY wu.worker_id, wu.unit_id",
                        base_sql,
                        vec!["?"; chunk.len()].join(", ")
                    );
                    let mut stmt = conn.prepare(&sql)?;
                    rows.extend(
                        stmt.query_map(params_from_iter(chunk.iter()), map_row)?
                            .collect::<Result<Vec<_>, _>>()?,
                    );
                }
            }
        }

        let mut grouped: HashMap<String, Vec<UnitMembership>> = HashMap::new();
        for (worker_id, m) in rows {
            grouped.entry(worker_id).or_default().push(m);
        }
        Ok(grouped)
    }

    /// 映射 worker 行（归属关系另行填充）
    fn map_worker_row(row: &rusqlite::Row) -> rusqlite::Result<Worker> {
        let gender_raw: String = row.get(2)?;
        let employment_raw: String = row.get(3)?;
        let state_raw: String = row.get(4)?;
        let updated_raw: String = row.get(6)?;

        Ok(Worker {
            worker_id: row.get(0)?,
            display_name: row.get(1)?,
            gender: Gender::from_db_str(&gender_raw)
                .ok_or_else(|| conversion_error(2, "gender", &gender_raw))?,
            employment_type: EmploymentType::from_db_str(&employment_raw)
                .ok_or_else(|| conversion_error(3, "employment_type", &employment_raw))?,
            availability_state: AvailabilityState::from_db_str(&state_raw)
                .ok_or_else(|| conversion_error(4, "availability_state", &state_raw))?,
            leave_flag: row.get::<_, i32>(5)? != 0,
            memberships: Vec::new(),
            updated_at: parse_datetime(6, "updated_at", &updated_raw)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;
    use chrono::NaiveDate;

    fn repo() -> WorkerRepository {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        WorkerRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn worker(id: &str, units: &[(&str, &str, bool)]) -> Worker {
        Worker {
            worker_id: id.to_string(),
            display_name: format!("Worker {}", id),
            gender: Gender::Female,
            employment_type: EmploymentType::Daily,
            availability_state: AvailabilityState::Available,
            leave_flag: false,
            memberships: units
                .iter()
                .map(|(u, s, d)| UnitMembership {
                    unit_id: u.to_string(),
                    section_id: s.to_string(),
                    dedicated: *d,
                })
                .collect(),
            updated_at: NaiveDate::from_ymd_opt(2026, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        }
    }

    fn unit(id: &str, section: &str) -> OrganizationalUnit {
        OrganizationalUnit {
            unit_id: id.to_string(),
            section_id: section.to_string(),
            unit_name: id.to_string(),
        }
    }

    #[test]
    fn test_upsert_and_load_with_memberships() {
        let repo = repo();
        repo.upsert_unit(&unit("U1", "S1")).unwrap();
        repo.upsert_unit(&unit("U2", "S2")).unwrap();
        repo.upsert_workers(&[
            worker("W2", &[("U2", "S2", false)]),
            worker("W1", &[("U1", "S1", true), ("U2", "S2", false)]),
        ])
        .unwrap();

        let all = repo.list_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].worker_id, "W1");
        assert_eq!(all[0].memberships.len(), 2);
        assert_eq!(all[0].dedicated_membership().unwrap().unit_id, "U1");

        let w2 = repo.find_by_id("W2").unwrap().unwrap();
        assert!(w2.belongs_to_section("S2"));
        assert!(repo.find_by_id("W9").unwrap().is_none());
    }

    #[test]
    fn test_reject_multiple_dedicated_units() {
        let repo = repo();
        repo.upsert_unit(&unit("U1", "S1")).unwrap();
        repo.upsert_unit(&unit("U2", "S1")).unwrap();
        let err = repo
            .upsert_workers(&[worker("W1", &[("U1", "S1", true), ("U2", "S1", true)])])
            .unwrap_err();
        assert!(matches!(err, RepositoryError::FieldValueError { .. }));
        assert!(repo.list_all().unwrap().is_empty());
    }
}
