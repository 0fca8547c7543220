// ==========================================
// 人员调配系统 - 花名册导入
// ==========================================
// 流程: CSV 解析 → 逐行校验 → 有效行单事务落库 → 写操作日志
// 红线: 导入不修改已有人员的 availability_state
// ==========================================

use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::types::{AvailabilityState, EmploymentType, Gender};
use crate::domain::worker::{UnitMembership, Worker};
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::{ActionLogRepository, WorkerRepository};
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// 必需列
pub const REQUIRED_COLUMNS: [&str; 5] = ["worker_id", "display_name", "gender", "employment_type", "units"];

/// 花名册原始行
#[derive(Debug, Clone, Deserialize)]
pub struct RosterRow {
    pub worker_id: String,
    pub display_name: String,
    pub gender: String,
    pub employment_type: String,
    /// 分号分隔的班组ID
    pub units: String,
    #[serde(default)]
    pub dedicated_unit: Option<String>,
    #[serde(default)]
    pub leave_flag: Option<String>,
}

/// 行级错误（行号从 1 开始，不含表头）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterRowError {
    pub row: usize,
    pub worker_id: Option<String>,
    pub message: String,
}

/// 导入汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterImportSummary {
    pub total_rows: usize,
    pub imported: usize,
    pub rejected: usize,
    pub errors: Vec<RosterRowError>,
    pub elapsed_ms: u64,
}

// ==========================================
// RosterImporter - 花名册导入器
// ==========================================
pub struct RosterImporter {
    worker_repo: Arc<WorkerRepository>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl RosterImporter {
    pub fn new(worker_repo: Arc<WorkerRepository>, action_log_repo: Arc<ActionLogRepository>) -> Self {
        Self {
            worker_repo,
            action_log_repo,
        }
    }

    /// 从 CSV 文件导入
    #[instrument(skip(self, file_path), fields(path = %file_path.as_ref().display()))]
    pub fn import_csv<P: AsRef<Path>>(&self, file_path: P, actor: &str) -> ImportResult<RosterImportSummary> {
        let path = file_path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(ext.to_string_lossy().to_string()));
            }
        }

        let file = File::open(path).map_err(|e| ImportError::CsvParseError(e.to_string()))?;
        self.import_reader(file, actor)
    }

    /// 从任意读取源导入
    pub fn import_reader<R: Read>(&self, reader: R, actor: &str) -> ImportResult<RosterImportSummary> {
        let start = Instant::now();
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);

        let headers: HashSet<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        for col in REQUIRED_COLUMNS {
            if !headers.contains(col) {
                return Err(ImportError::MissingColumn(col.to_string()));
            }
        }

        let now = chrono::Local::now().naive_local();
        let mut section_cache: HashMap<String, Option<String>> = HashMap::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut workers = Vec::new();
        let mut errors = Vec::new();
        let mut total_rows = 0;

        for (idx, result) in reader.deserialize::<RosterRow>().enumerate() {
            let row_no = idx + 1;
            total_rows += 1;

            let row = match result {
                Ok(r) => r,
                Err(e) => {
                    errors.push(RosterRowError {
                        row: row_no,
                        worker_id: None,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            match self.parse_row(&row, &mut section_cache, now) {
                Ok(worker) => {
                    if !seen.insert(worker.worker_id.clone()) {
                        errors.push(RosterRowError {
                            row: row_no,
                            worker_id: Some(worker.worker_id),
                            message: "duplicate worker_id in file".to_string(),
                        });
                        continue;
                    }
                    workers.push(worker);
                }
                Err(message) => errors.push(RosterRowError {
                    row: row_no,
                    worker_id: Some(row.worker_id.clone()).filter(|s| !s.is_empty()),
                    message,
                }),
            }
        }

        let imported = self.worker_repo.upsert_workers(&workers)?;

        let log = ActionLog::new(
            ActionType::RosterImport,
            actor,
            None,
            Some(json!({
                "total_rows": total_rows,
                "imported": imported,
                "rejected": errors.len(),
            })),
            Some(format!("roster import: {} imported, {} rejected", imported, errors.len())),
        );
        if let Err(e) = self.action_log_repo.insert(&log) {
            warn!(error = %e, "导入日志写入失败");
        }

        info!(total_rows, imported, rejected = errors.len(), "花名册导入完成");

        Ok(RosterImportSummary {
            total_rows,
            imported,
            rejected: errors.len(),
            errors,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// 校验并转换单行
    fn parse_row(
        &self,
        row: &RosterRow,
        section_cache: &mut HashMap<String, Option<String>>,
        now: chrono::NaiveDateTime,
    ) -> Result<Worker, String> {
        if row.worker_id.is_empty() {
            return Err("worker_id is empty".to_string());
        }
        let gender = Gender::from_db_str(&row.gender)
            .ok_or_else(|| format!("invalid gender: {}", row.gender))?;
        let employment_type = EmploymentType::from_db_str(&row.employment_type)
            .ok_or_else(|| format!("invalid employment_type: {}", row.employment_type))?;
        let leave_flag = match row.leave_flag.as_deref().map(str::trim) {
            None | Some("") => false,
            Some(v) => parse_flag(v).ok_or_else(|| format!("invalid leave_flag: {}", v))?,
        };

        let units = split_units(&row.units);
        let dedicated = row
            .dedicated_unit
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if let Some(d) = dedicated {
            if !units.iter().any(|u| u == d) {
                return Err(format!("dedicated_unit {} is not listed in units", d));
            }
        }

        let mut memberships = Vec::with_capacity(units.len());
        for unit_id in &units {
            let section_id = self.section_of(unit_id, section_cache)?;
            memberships.push(UnitMembership {
                unit_id: unit_id.clone(),
                section_id,
                dedicated: dedicated == Some(unit_id.as_str()),
            });
        }

        Ok(Worker {
            worker_id: row.worker_id.clone(),
            display_name: row.display_name.clone(),
            gender,
            employment_type,
            availability_state: AvailabilityState::Available,
            leave_flag,
            memberships,
            updated_at: now,
        })
    }

    fn section_of(
        &self,
        unit_id: &str,
        cache: &mut HashMap<String, Option<String>>,
    ) -> Result<String, String> {
        if !cache.contains_key(unit_id) {
            let unit = self
                .worker_repo
                .find_unit(unit_id)
                .map_err(|e| format!("unit lookup failed: {}", e))?;
            cache.insert(unit_id.to_string(), unit.map(|u| u.section_id));
        }
        cache
            .get(unit_id)
            .cloned()
            .flatten()
            .ok_or_else(|| format!("unknown unit: {}", unit_id))
    }
}

/// 拆分班组列表（分号分隔，去空去重，保持顺序）
pub fn split_units(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_string()))
        .map(str::to_string)
        .collect()
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.to_lowercase().as_str() {
        "1" | "true" | "y" | "yes" => Some(true),
        "0" | "false" | "n" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_units() {
        assert_eq!(split_units("U1; U2;;U1"), vec!["U1", "U2"]);
        assert!(split_units("  ").is_empty());
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("Yes"), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
