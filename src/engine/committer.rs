// ==========================================
// 人员调配系统 - 调配提交
// ==========================================
// 职责: 生成提交计划与审计日志，交给仓储层单事务落库
// 红线: 人员/需求状态流转只经由此处
// ==========================================

use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::assignment::{CommitPlan, CommitReceipt, RevisionReceipt};
use crate::domain::request::StaffingRequest;
use crate::engine::error::{FulfillmentError, FulfillmentFailure};
use crate::repository::{AssignmentRepository, RepositoryError};
use serde_json::json;
use std::sync::Arc;
use tracing::{instrument, warn};

pub struct AssignmentCommitter {
    assignment_repo: Arc<AssignmentRepository>,
}

impl AssignmentCommitter {
    pub fn new(assignment_repo: Arc<AssignmentRepository>) -> Self {
        Self { assignment_repo }
    }

    /// 提交单个需求
    ///
    /// # 参数
    /// - `worker_ids`: 入选人员（排名顺序）
    /// - `context`: 写入审计日志的附加信息（策略、告警等）
    ///
    /// # 返回
    /// - `Err(CommitConflict)`: 复核失败，事务已回滚
    /// - `Err(Repository)`: 该需求的存储故障
    #[instrument(skip(self, request, worker_ids, context), fields(request_id = %request.request_id, workers = worker_ids.len()))]
    pub fn commit(
        &self,
        request: &StaffingRequest,
        worker_ids: &[String],
        actor: &str,
        context: serde_json::Value,
    ) -> Result<CommitReceipt, FulfillmentFailure> {
        let now = chrono::Local::now().naive_local();
        let plan = CommitPlan {
            request_id: request.request_id.clone(),
            work_date: request.work_date,
            shift_code: request.shift_code.clone(),
            worker_ids: worker_ids.to_vec(),
            actor: actor.to_string(),
            committed_at: now,
        };

        let log = ActionLog::new(
            ActionType::CommitAssignments,
            actor,
            Some(&request.request_id),
            Some(json!({
                "worker_ids": worker_ids,
                "work_date": request.work_date.format("%Y-%m-%d").to_string(),
                "unit_id": request.unit_id,
                "context": context,
            })),
            Some(format!(
                "fulfilled {} with {} worker(s)",
                request.request_id,
                worker_ids.len()
            )),
        );

        self.assignment_repo.commit_request(&plan, &log).map_err(|e| {
            warn!(request_id = %request.request_id, error = %e, "调配提交失败，已回滚");
            FulfillmentFailure::from(e)
        })
    }

    /// 需求修订：撤销调配并恢复人员可用状态
    #[instrument(skip(self))]
    pub fn revise(&self, request_id: &str, actor: &str) -> Result<RevisionReceipt, FulfillmentError> {
        let now = chrono::Local::now().naive_local();
        let log = ActionLog::new(
            ActionType::RequestRevision,
            actor,
            Some(request_id),
            None,
            Some(format!("revision requested for {}", request_id)),
        );

        self.assignment_repo
            .revert_request(request_id, &log, now)
            .map_err(|e| match e {
                RepositoryError::NotFound { entity, id } => FulfillmentError::NotFound { entity, id },
                RepositoryError::InvalidStateTransition { from, to } => {
                    FulfillmentError::InvalidInput(format!(
                        "request {} cannot move from {} to {}",
                        request_id, from, to
                    ))
                }
                other => FulfillmentError::Repository(other),
            })
    }
}
