// ==========================================
// 人员调配系统 - 引擎层错误类型
// ==========================================
// 分层:
// - FulfillmentError: 硬错误（输入非法/记录不存在/配置/处理前的存储故障），整个调用失败
// - FulfillmentFailure: 单个需求的失败，记录后继续处理下一个需求
// ==========================================

use crate::domain::types::Gender;
use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 硬错误：在处理任何需求之前检出
#[derive(Error, Debug)]
pub enum FulfillmentError {
    #[error("输入无效: {0}")]
    InvalidInput(String),

    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("配置错误: {0}")]
    Config(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// 单个需求的失败原因（非致命）
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FulfillmentFailure {
    /// 候选池为空，或人工指定的人员已不可调配
    #[error("STRUCTURAL_INELIGIBILITY: {reason}")]
    StructuralIneligibility { reason: String },

    /// 性别配额或总人数不足；gender 为空表示总人数不足
    #[error("QUOTA_INFEASIBLE: {}", quota_text(.gender, .required, .found))]
    QuotaInfeasible {
        gender: Option<Gender>,
        required: u32,
        found: u32,
    },

    /// 提交时复核失败（与外部状态变更竞争），该需求已回滚
    #[error("COMMIT_CONFLICT: worker {worker_id}: {reason}")]
    CommitConflict { worker_id: String, reason: String },

    /// 该需求提交时的存储故障
    #[error("REPOSITORY: {0}")]
    Repository(String),
}

impl FulfillmentFailure {
    /// 失败类别代码
    pub fn code(&self) -> &'static str {
        match self {
            FulfillmentFailure::StructuralIneligibility { .. } => "STRUCTURAL_INELIGIBILITY",
            FulfillmentFailure::QuotaInfeasible { .. } => "QUOTA_INFEASIBLE",
            FulfillmentFailure::CommitConflict { .. } => "COMMIT_CONFLICT",
            FulfillmentFailure::Repository(_) => "REPOSITORY",
        }
    }

    pub fn is_quota_infeasible(&self) -> bool {
        matches!(self, FulfillmentFailure::QuotaInfeasible { .. })
    }
}

/// 配额不足的人类可读描述
///
/// 例: "insufficient female employees: required 3, found 1"
pub fn quota_message(gender: Option<Gender>, required: u32, found: u32) -> String {
    match gender {
        Some(g) => format!(
            "insufficient {} employees: required {}, found {}",
            g.label(),
            required,
            found
        ),
        None => format!(
            "insufficient candidates: required {}, found {}",
            required, found
        ),
    }
}

fn quota_text(gender: &Option<Gender>, required: &u32, found: &u32) -> String {
    quota_message(*gender, *required, *found)
}

impl From<RepositoryError> for FulfillmentFailure {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::EligibilityConflict { worker_id, reason } => {
                FulfillmentFailure::CommitConflict { worker_id, reason }
            }
            other => FulfillmentFailure::Repository(other.to_string()),
        }
    }
}

pub type FulfillmentResult<T> = Result<T, FulfillmentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_message_format() {
        let f = FulfillmentFailure::QuotaInfeasible {
            gender: Some(Gender::Female),
            required: 3,
            found: 1,
        };
        assert_eq!(
            f.to_string(),
            "QUOTA_INFEASIBLE: insufficient female employees: required 3, found 1"
        );
        assert_eq!(
            quota_message(None, 4, 2),
            "insufficient candidates: required 4, found 2"
        );
    }

    #[test]
    fn test_conflict_mapping() {
        let f: FulfillmentFailure = RepositoryError::EligibilityConflict {
            worker_id: "W1".to_string(),
            reason: "ON_LEAVE: leave flag set".to_string(),
        }
        .into();
        assert_eq!(f.code(), "COMMIT_CONFLICT");

        let f: FulfillmentFailure = RepositoryError::LockError("poisoned".to_string()).into();
        assert_eq!(f.code(), "REPOSITORY");
    }
}
