// ==========================================
// 人员调配系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod assignment;
pub mod candidate;
pub mod request;
pub mod types;
pub mod worker;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use assignment::{Assignment, CommitPlan, CommitReceipt, RevisionReceipt};
pub use candidate::{CandidateFeatures, ModelFeatureRow, ScoredCandidate, ShiftRecord};
pub use request::StaffingRequest;
pub use types::{
    AssignmentStatus, AvailabilityState, EmploymentType, Gender, LocalityTier, PoolScope,
    QuotaPolicy, RequestStatus, ScoreSource,
};
pub use worker::{
    AssessmentResult, OrganizationalUnit, PriorityOverride, RatingRecord, UnitMembership,
    WeeklyWorkload, WorkHistoryRecord, Worker, WorkerSignals,
};
