// ==========================================
// 人员调配系统 - 调配结果类型
// ==========================================
// 单需求结果、批量结果、预览结果、人工改派输入
// ==========================================

use crate::domain::candidate::ScoredCandidate;
use crate::domain::types::{EmploymentType, Gender, LocalityTier, ScoreSource};
use crate::engine::candidate_pool::RejectedWorker;
use crate::engine::error::FulfillmentFailure;
use crate::engine::strategy::FulfillmentStrategy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 单个需求在批次中的终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcomeStatus {
    Fulfilled,
    Failed,
}

// ==========================================
// RequestOutcome - 单需求结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestOutcome {
    pub request_id: String,
    pub status: RequestOutcomeStatus,
    /// 入选人员（排名顺序）
    pub assigned_worker_ids: Vec<String>,
    pub male_count: u32,
    pub female_count: u32,
    /// WarnAndProceed 策略下的配额告警
    pub warnings: Vec<String>,
    pub failure: Option<FulfillmentFailure>,
    /// 重新满足时恢复为 AVAILABLE 的旧人员
    pub restored_worker_ids: Vec<String>,
}

impl RequestOutcome {
    pub fn failed(request_id: &str, failure: FulfillmentFailure) -> Self {
        Self {
            request_id: request_id.to_string(),
            status: RequestOutcomeStatus::Failed,
            assigned_worker_ids: Vec::new(),
            male_count: 0,
            female_count: 0,
            warnings: Vec::new(),
            failure: Some(failure),
            restored_worker_ids: Vec::new(),
        }
    }

    pub fn is_fulfilled(&self) -> bool {
        self.status == RequestOutcomeStatus::Fulfilled
    }
}

// ==========================================
// BatchFulfillmentResult - 批量结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFulfillmentResult {
    pub per_request_status: BTreeMap<String, RequestOutcomeStatus>,
    pub fulfilled_count: usize,
    pub failed_count: usize,
    /// 人类可读错误（条数封顶）
    pub errors: Vec<String>,
    /// 超出封顶未列出的错误条数
    pub errors_truncated: usize,
    /// 调用顺序的逐需求明细
    pub outcomes: Vec<RequestOutcome>,
}

impl BatchFulfillmentResult {
    /// 汇总逐需求结果
    pub fn from_outcomes(outcomes: Vec<RequestOutcome>, error_cap: usize) -> Self {
        let mut per_request_status = BTreeMap::new();
        let mut errors = Vec::new();
        let mut errors_truncated = 0;
        let mut fulfilled_count = 0;

        for o in &outcomes {
            per_request_status.insert(o.request_id.clone(), o.status);
            if o.is_fulfilled() {
                fulfilled_count += 1;
            }
            if let Some(f) = &o.failure {
                if errors.len() < error_cap {
                    errors.push(format!("{}: {}", o.request_id, f));
                } else {
                    errors_truncated += 1;
                }
            }
        }

        Self {
            per_request_status,
            fulfilled_count,
            failed_count: outcomes.len() - fulfilled_count,
            errors,
            errors_truncated,
            outcomes,
        }
    }
}

// ==========================================
// 预览
// ==========================================

/// 预览中的候选人明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewCandidate {
    pub worker_id: String,
    pub display_name: String,
    pub gender: Gender,
    pub employment_type: EmploymentType,
    pub locality_tier: LocalityTier,
    pub has_priority_override: bool,
    pub work_days_14: u32,
    pub base_score: f64,
    pub learned_score: f64,
    pub learned_source: ScoreSource,
    pub priority_score: f64,
    pub final_score: f64,
    pub rank_score: f64,
}

impl PreviewCandidate {
    pub fn from_scored(c: &ScoredCandidate, display_name: &str) -> Self {
        Self {
            worker_id: c.worker_id().to_string(),
            display_name: display_name.to_string(),
            gender: c.features.gender,
            employment_type: c.features.employment_type,
            locality_tier: c.features.locality_tier,
            has_priority_override: c.features.has_priority_override(),
            work_days_14: c.features.work_days_14,
            base_score: c.base_score,
            learned_score: c.learned_score,
            learned_source: c.learned_source,
            priority_score: c.priority_score,
            final_score: c.final_score,
            rank_score: c.rank_score,
        }
    }
}

/// 单个需求的预览
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestPreview {
    pub request_id: String,
    pub unit_id: String,
    pub section_id: String,
    pub work_date: NaiveDate,
    pub shift_code: Option<String>,
    pub required_total: u32,
    pub required_male: u32,
    pub required_female: u32,
    /// 入选人员（槽位顺序即排名顺序）
    pub selected: Vec<PreviewCandidate>,
    /// 未入选的后备人选（排名顺序，条数封顶）
    pub alternates: Vec<PreviewCandidate>,
    pub male_count: u32,
    pub female_count: u32,
    /// 按当前配额策略提交时是否会成功
    pub would_commit: bool,
    pub failure: Option<FulfillmentFailure>,
    pub warnings: Vec<String>,
    /// 被排除人员数量（按原因代码）
    pub rejected_counts: BTreeMap<String, usize>,
    pub rejected: Vec<RejectedWorker>,
}

impl RequestPreview {
    pub fn selected_worker_ids(&self) -> Vec<String> {
        self.selected.iter().map(|c| c.worker_id.clone()).collect()
    }
}

/// 预览汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewSummary {
    pub request_count: usize,
    pub committable_count: usize,
    pub blocked_count: usize,
    pub total_workers: usize,
    pub male_workers: usize,
    pub female_workers: usize,
    /// 获得人员的需求班组（去重，升序）
    pub unique_units: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPreview {
    pub strategy: FulfillmentStrategy,
    pub requests: Vec<RequestPreview>,
    pub summary: PreviewSummary,
}

// ==========================================
// 人工改派与显式提交
// ==========================================

/// 人工改派：将某需求的第 slot 个槽位替换为指定人员
///
/// slot 等于当前已选人数时表示追加到下一个空槽位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotOverride {
    pub request_id: String,
    pub slot: usize,
    pub worker_id: String,
}

/// 显式人选（最终提交输入）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplicitSelection {
    pub request_id: String,
    pub worker_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(id: &str) -> RequestOutcome {
        RequestOutcome {
            request_id: id.to_string(),
            status: RequestOutcomeStatus::Fulfilled,
            assigned_worker_ids: vec!["W1".to_string()],
            male_count: 1,
            female_count: 0,
            warnings: vec![],
            failure: None,
            restored_worker_ids: vec![],
        }
    }

    #[test]
    fn test_batch_aggregation_caps_errors() {
        let failure = FulfillmentFailure::StructuralIneligibility {
            reason: "empty pool".to_string(),
        };
        let outcomes = vec![
            ok("R1"),
            RequestOutcome::failed("R2", failure.clone()),
            RequestOutcome::failed("R3", failure.clone()),
            RequestOutcome::failed("R4", failure),
        ];
        let result = BatchFulfillmentResult::from_outcomes(outcomes, 2);

        assert_eq!(result.fulfilled_count, 1);
        assert_eq!(result.failed_count, 3);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors_truncated, 1);
        assert_eq!(result.errors[0], "R2: STRUCTURAL_INELIGIBILITY: empty pool");
        assert_eq!(
            result.per_request_status.get("R1"),
            Some(&RequestOutcomeStatus::Fulfilled)
        );
        assert_eq!(result.outcomes[3].request_id, "R4");
    }
}
