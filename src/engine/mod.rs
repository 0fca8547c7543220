// ==========================================
// 人员调配系统 - 引擎层
// ==========================================
// 职责: 候选池 → 特征 → 评分 → 排序 → 配额选择 → 提交
// 红线: Engine 不拼 SQL, 所有排除/失败必须输出 reason
// ==========================================

pub mod candidate_pool;
pub mod committer;
pub mod coordinator;
pub mod error;
pub mod features;
pub mod outcome;
pub mod priority;
pub mod quota_selector;
pub mod ranking_model;
pub mod repositories;
pub mod scoring;
pub mod strategy;

// 重导出核心引擎
pub use candidate_pool::{CandidatePool, CandidatePoolBuilder, RejectedWorker, RejectionReason};
pub use committer::AssignmentCommitter;
pub use coordinator::{BulkAssignmentCoordinator, PREVIEW_ALTERNATES};
pub use error::{FulfillmentError, FulfillmentFailure, FulfillmentResult};
pub use features::FeatureExtractor;
pub use outcome::{
    BatchFulfillmentResult, BatchPreview, ExplicitSelection, PreviewCandidate, PreviewSummary,
    RequestOutcome, RequestOutcomeStatus, RequestPreview, SlotOverride,
};
pub use priority::{ranking_key, PriorityTierSorter};
pub use quota_selector::{GenderQuotaSelector, Selection};
pub use ranking_model::{LogisticRankingModel, ModelError, RankingModel, UntrainedModel};
pub use repositories::FulfillmentRepositories;
pub use scoring::ScoreBlender;
pub use strategy::FulfillmentStrategy;
