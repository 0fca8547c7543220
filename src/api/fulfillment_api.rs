// ==========================================
// 人员调配系统 - 调配 API
// ==========================================
// 职责: 供管理流程调用的调配入口（单需求/批量/预览/人工改派/修订）
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::action_log::ActionLog;
use crate::domain::assignment::{Assignment, RevisionReceipt};
use crate::domain::request::StaffingRequest;
use crate::engine::{
    BatchFulfillmentResult, BatchPreview, BulkAssignmentCoordinator, ExplicitSelection,
    FulfillmentStrategy, SlotOverride,
};
use crate::repository::{ActionLogRepository, AssignmentRepository, StaffingRequestRepository};

// ==========================================
// 响应类型
// ==========================================

/// 单需求调配结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FulfillResponse {
    Fulfilled {
        request_id: String,
        assigned_worker_ids: Vec<String>,
        male_count: u32,
        female_count: u32,
        warnings: Vec<String>,
    },
    Infeasible {
        request_id: String,
        /// 失败代码（STRUCTURAL_INELIGIBILITY / QUOTA_INFEASIBLE / COMMIT_CONFLICT / REPOSITORY）
        code: String,
        reason: String,
    },
}

impl FulfillResponse {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, FulfillResponse::Fulfilled { .. })
    }
}

// ==========================================
// FulfillmentApi - 调配 API
// ==========================================

/// 调配API
///
/// 职责：
/// 1. 单需求/批量自动调配
/// 2. 批量预览与人工改派
/// 3. 显式人选提交
/// 4. 需求修订
pub struct FulfillmentApi {
    coordinator: Arc<BulkAssignmentCoordinator<ConfigManager>>,
    request_repo: Arc<StaffingRequestRepository>,
    assignment_repo: Arc<AssignmentRepository>,
    action_log_repo: Arc<ActionLogRepository>,
}

impl FulfillmentApi {
    pub fn new(
        coordinator: Arc<BulkAssignmentCoordinator<ConfigManager>>,
        request_repo: Arc<StaffingRequestRepository>,
        assignment_repo: Arc<AssignmentRepository>,
        action_log_repo: Arc<ActionLogRepository>,
    ) -> Self {
        Self {
            coordinator,
            request_repo,
            assignment_repo,
            action_log_repo,
        }
    }

    /// 单需求调配
    ///
    /// # 返回
    /// - Ok(Fulfilled): 已提交
    /// - Ok(Infeasible): 未满足（带原因）
    /// - Err(ApiError): 输入非法/需求不存在/配置错误
    pub async fn fulfill(
        &self,
        request_id: &str,
        strategy: FulfillmentStrategy,
        actor: &str,
    ) -> ApiResult<FulfillResponse> {
        validate_id(request_id, "需求ID")?;
        validate_id(actor, "操作人")?;

        let outcome = self
            .coordinator
            .fulfill_one(request_id, strategy, actor)
            .await?;

        let response = match outcome.failure {
            None => FulfillResponse::Fulfilled {
                request_id: outcome.request_id,
                assigned_worker_ids: outcome.assigned_worker_ids,
                male_count: outcome.male_count,
                female_count: outcome.female_count,
                warnings: outcome.warnings,
            },
            Some(failure) => FulfillResponse::Infeasible {
                request_id: outcome.request_id,
                code: failure.code().to_string(),
                reason: failure.to_string(),
            },
        };
        Ok(response)
    }

    /// 批量调配（单个需求失败不中断批次）
    pub async fn bulk_fulfill(
        &self,
        request_ids: &[String],
        strategy: FulfillmentStrategy,
        actor: &str,
    ) -> ApiResult<BatchFulfillmentResult> {
        validate_ids(request_ids)?;
        validate_id(actor, "操作人")?;

        let result = self
            .coordinator
            .bulk_fulfill(request_ids, strategy, actor)
            .await?;
        info!(
            fulfilled = result.fulfilled_count,
            failed = result.failed_count,
            "批量调配API返回"
        );
        Ok(result)
    }

    /// 批量预览（不提交）
    pub async fn preview_bulk(
        &self,
        request_ids: &[String],
        strategy: FulfillmentStrategy,
    ) -> ApiResult<BatchPreview> {
        validate_ids(request_ids)?;
        Ok(self.coordinator.preview_bulk(request_ids, strategy).await?)
    }

    /// 人工改派：把逐槽位修改应用到预览，得到显式人选
    pub fn apply_slot_overrides(
        &self,
        preview: &BatchPreview,
        overrides: &[SlotOverride],
    ) -> ApiResult<Vec<ExplicitSelection>> {
        Ok(BulkAssignmentCoordinator::<ConfigManager>::apply_slot_overrides(
            preview, overrides,
        )?)
    }

    /// 显式人选提交
    pub async fn commit_selections(
        &self,
        selections: &[ExplicitSelection],
        actor: &str,
    ) -> ApiResult<BatchFulfillmentResult> {
        if selections.is_empty() {
            return Err(ApiError::InvalidInput("提交人选不能为空".to_string()));
        }
        validate_id(actor, "操作人")?;

        Ok(self.coordinator.commit_selections(selections, actor).await?)
    }

    /// 需求修订：撤销调配，需求进入 REVISION_REQUESTED
    pub async fn request_revision(&self, request_id: &str, actor: &str) -> ApiResult<RevisionReceipt> {
        validate_id(request_id, "需求ID")?;
        validate_id(actor, "操作人")?;

        Ok(self.coordinator.request_revision(request_id, actor).await?)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 查询指定日期的需求
    pub fn list_requests_by_date(&self, work_date: NaiveDate) -> ApiResult<Vec<StaffingRequest>> {
        Ok(self.request_repo.list_by_date(work_date)?)
    }

    /// 查询需求当前的调配记录
    pub fn list_assignments(&self, request_id: &str) -> ApiResult<Vec<Assignment>> {
        validate_id(request_id, "需求ID")?;
        Ok(self.assignment_repo.find_by_request(request_id)?)
    }

    /// 查询需求的操作日志（时间升序）
    pub fn list_action_logs(&self, request_id: &str) -> ApiResult<Vec<ActionLog>> {
        validate_id(request_id, "需求ID")?;
        Ok(self.action_log_repo.find_by_request(request_id)?)
    }
}

fn validate_id(value: &str, label: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", label)));
    }
    Ok(())
}

fn validate_ids(request_ids: &[String]) -> ApiResult<()> {
    if request_ids.is_empty() {
        return Err(ApiError::InvalidInput("需求ID列表不能为空".to_string()));
    }
    request_ids.iter().try_for_each(|id| validate_id(id, "需求ID"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ids() {
        assert!(validate_ids(&[]).is_err());
        assert!(validate_ids(&["R1".to_string(), " ".to_string()]).is_err());
        assert!(validate_ids(&["R1".to_string()]).is_ok());
    }

    #[test]
    fn test_fulfill_response_serializes_with_status_tag() {
        let resp = FulfillResponse::Infeasible {
            request_id: "R1".to_string(),
            code: "QUOTA_INFEASIBLE".to_string(),
            reason: "QUOTA_INFEASIBLE: insufficient candidates: required 2, found 1".to_string(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "infeasible");
        assert!(!resp.is_fulfilled());
    }
}
