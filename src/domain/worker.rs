// ==========================================
// 人员调配系统 - 人员领域模型
// ==========================================
// 职责: 人员主数据、组织归属、历史信号
// 红线: 引擎层只读，状态变更只在 AssignmentCommitter
// ==========================================

use crate::domain::types::{AvailabilityState, EmploymentType, Gender};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Worker - 人员主数据
// ==========================================
// 对齐: worker 表 + worker_unit 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub worker_id: String,
    pub display_name: String,
    pub gender: Gender,
    pub employment_type: EmploymentType,
    pub availability_state: AvailabilityState,
    pub leave_flag: bool,
    pub memberships: Vec<UnitMembership>,
    pub updated_at: NaiveDateTime,
}

impl Worker {
    /// 专属班组（至多一个）
    pub fn dedicated_membership(&self) -> Option<&UnitMembership> {
        self.memberships.iter().find(|m| m.dedicated)
    }

    pub fn belongs_to_unit(&self, unit_id: &str) -> bool {
        self.memberships.iter().any(|m| m.unit_id == unit_id)
    }

    pub fn belongs_to_section(&self, section_id: &str) -> bool {
        self.memberships.iter().any(|m| m.section_id == section_id)
    }
}

// ==========================================
// UnitMembership - 班组归属
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMembership {
    pub unit_id: String,
    pub section_id: String,
    pub dedicated: bool,
}

// ==========================================
// OrganizationalUnit - 组织单元（班组）
// ==========================================
// 上级为工段 (Section)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationalUnit {
    pub unit_id: String,
    pub section_id: String,
    pub unit_name: String,
}

// ==========================================
// WorkHistoryRecord - 出勤历史
// ==========================================
// 每个 (人员, 日期, 已满足需求) 一行
// 生命周期: 需求满足时写入，调配记录删除时同步删除
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkHistoryRecord {
    pub worker_id: String,
    pub work_date: NaiveDate,
    pub request_id: String,
    pub shift_code: Option<String>,
}

// ==========================================
// WeeklyWorkload - 周出勤快照
// ==========================================
// 由外部周任务维护，本系统只读
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyWorkload {
    pub worker_id: String,
    pub week_start: NaiveDate,
    pub work_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub worker_id: String,
    pub assessed_at: NaiveDateTime,
    pub passed: bool,
}

/// 评分记录（0~5 分）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub worker_id: String,
    pub score: f64,
    pub rated_at: NaiveDateTime,
}

// ==========================================
// PriorityOverride - 人工优先级加权
// ==========================================
// unit_scope 为空表示全局生效
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityOverride {
    pub override_id: String,
    pub worker_id: String,
    pub weight_multiplier: f64,
    pub unit_scope: Vec<String>,
}

impl PriorityOverride {
    /// 判断该加权是否适用于指定班组
    pub fn applies_to(&self, unit_id: &str) -> bool {
        self.weight_multiplier > 0.0
            && (self.unit_scope.is_empty() || self.unit_scope.iter().any(|u| u == unit_id))
    }
}

// ==========================================
// WorkerSignals - 单人特征提取所需的全部历史信号
// ==========================================
// 由仓储层一次性批量加载，特征提取时只读
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerSignals {
    /// 出勤历史（日期降序）
    pub history: Vec<WorkHistoryRecord>,
    /// 最近一周快照
    pub latest_weekly_load: Option<WeeklyWorkload>,
    /// 最近一次考核结果
    pub latest_assessment: Option<AssessmentResult>,
    pub ratings: Vec<RatingRecord>,
    pub overrides: Vec<PriorityOverride>,
}
