// ==========================================
// 人员调配系统 - 领域类型定义
// ==========================================
// 职责: 调配引擎使用的枚举类型
// 约定: 数据库存储格式统一为 SCREAMING_SNAKE_CASE
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 性别 (Gender)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl Gender {
    /// 从数据库字符串解析（兼容小写/单字母写法）
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "MALE" | "M" => Some(Gender::Male),
            "FEMALE" | "F" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
        }
    }

    /// 用于原因描述的小写名称
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

// ==========================================
// 用工类型 (Employment Type)
// ==========================================
// 排序: PERMANENT 优先于 DAILY
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmploymentType {
    Permanent, // 正式工
    Daily,     // 日结工
}

impl fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl EmploymentType {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PERMANENT" => Some(EmploymentType::Permanent),
            "DAILY" => Some(EmploymentType::Daily),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            EmploymentType::Permanent => "PERMANENT",
            EmploymentType::Daily => "DAILY",
        }
    }

    /// 排序键: 正式工=0, 日结工=1
    pub fn rank(&self) -> u8 {
        match self {
            EmploymentType::Permanent => 0,
            EmploymentType::Daily => 1,
        }
    }
}

// ==========================================
// 人员可用状态 (Availability State)
// ==========================================
// 红线: 只有 AssignmentCommitter 可以修改此状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityState {
    Available,   // 可调配
    Assigned,    // 已调配
    OnLeave,     // 请假
    Deactivated, // 停用
}

impl fmt::Display for AvailabilityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl AvailabilityState {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "AVAILABLE" => Some(AvailabilityState::Available),
            "ASSIGNED" => Some(AvailabilityState::Assigned),
            "ON_LEAVE" => Some(AvailabilityState::OnLeave),
            "DEACTIVATED" => Some(AvailabilityState::Deactivated),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AvailabilityState::Available => "AVAILABLE",
            AvailabilityState::Assigned => "ASSIGNED",
            AvailabilityState::OnLeave => "ON_LEAVE",
            AvailabilityState::Deactivated => "DEACTIVATED",
        }
    }
}

// ==========================================
// 用工需求状态 (Request Status)
// ==========================================
// 生命周期: PENDING → FULFILLED → REVISION_REQUESTED → FULFILLED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    RevisionRequested,
    Fulfilled,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl RequestStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Some(RequestStatus::Pending),
            "REVISION_REQUESTED" => Some(RequestStatus::RevisionRequested),
            "FULFILLED" => Some(RequestStatus::Fulfilled),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::RevisionRequested => "REVISION_REQUESTED",
            RequestStatus::Fulfilled => "FULFILLED",
        }
    }
}

// ==========================================
// 调配记录状态 (Assignment Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Pending,  // 待确认
    Accepted, // 已接受
    Rejected, // 已拒绝
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl AssignmentStatus {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Some(AssignmentStatus::Pending),
            "ACCEPTED" => Some(AssignmentStatus::Accepted),
            "REJECTED" => Some(AssignmentStatus::Rejected),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "PENDING",
            AssignmentStatus::Accepted => "ACCEPTED",
            AssignmentStatus::Rejected => "REJECTED",
        }
    }
}

// ==========================================
// 组织就近层级 (Locality Tier)
// ==========================================
// 顺序: ExactUnit < SameSection < Other（越小越就近）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalityTier {
    ExactUnit,   // 同一班组
    SameSection, // 同一工段
    Other,       // 其他
}

impl fmt::Display for LocalityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalityTier::ExactUnit => write!(f, "exact_unit"),
            LocalityTier::SameSection => write!(f, "same_section"),
            LocalityTier::Other => write!(f, "other"),
        }
    }
}

impl LocalityTier {
    /// 排序键: exact_unit=0, same_section=1, other=2
    pub fn rank(&self) -> u8 {
        match self {
            LocalityTier::ExactUnit => 0,
            LocalityTier::SameSection => 1,
            LocalityTier::Other => 2,
        }
    }
}

// ==========================================
// 学习分来源 (Score Source)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    Model,    // 排序模型预测
    Fallback, // 确定性兜底公式
}

impl fmt::Display for ScoreSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreSource::Model => write!(f, "model"),
            ScoreSource::Fallback => write!(f, "fallback"),
        }
    }
}

// ==========================================
// 性别配额不满足时的处理策略 (Quota Policy)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuotaPolicy {
    /// 拒绝提交（默认）
    #[default]
    Reject,
    /// 告警后按现有人选提交
    WarnAndProceed,
}

impl QuotaPolicy {
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "reject" => Some(QuotaPolicy::Reject),
            "warn_and_proceed" | "warn-and-proceed" => Some(QuotaPolicy::WarnAndProceed),
            _ => None,
        }
    }
}

// ==========================================
// 候选池范围 (Pool Scope)
// ==========================================
// 用途: 可选的组织单元预过滤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PoolScope {
    #[default]
    All,
    SameSection,
    ExactUnit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_db_round_trip_and_aliases() {
        assert_eq!(Gender::from_db_str("m"), Some(Gender::Male));
        assert_eq!(Gender::from_db_str("female"), Some(Gender::Female));
        assert_eq!(Gender::from_db_str("x"), None);
        assert_eq!(
            AvailabilityState::from_db_str("on_leave"),
            Some(AvailabilityState::OnLeave)
        );
        assert_eq!(
            RequestStatus::from_db_str(RequestStatus::RevisionRequested.to_db_str()),
            Some(RequestStatus::RevisionRequested)
        );
        assert_eq!(QuotaPolicy::from_db_str("warn-and-proceed"), Some(QuotaPolicy::WarnAndProceed));
    }

    #[test]
    fn test_tier_and_employment_ordering() {
        assert!(LocalityTier::ExactUnit < LocalityTier::SameSection);
        assert!(LocalityTier::SameSection < LocalityTier::Other);
        assert!(EmploymentType::Permanent.rank() < EmploymentType::Daily.rank());
    }
}
