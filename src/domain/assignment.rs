// ==========================================
// 人员调配系统 - 调配记录领域模型
// ==========================================

use crate::domain::types::AssignmentStatus;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Assignment - 人员 ↔ 需求 调配关系
// ==========================================
// 对齐: assignment 表
// 生命周期: Committer 创建；需求修订/重新满足时整批删除
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub assignment_id: String,
    pub worker_id: String,
    pub request_id: String,
    /// 冗余自需求日期，便于同日冲突查询
    pub work_date: NaiveDate,
    pub status: AssignmentStatus,
    /// 班次标签
    pub shift_code: Option<String>,
    pub assigned_by: String,
    pub assigned_at: NaiveDateTime,
}

// ==========================================
// CommitPlan - 单个需求的提交计划
// ==========================================
// 由 AssignmentCommitter 生成，交给仓储层在单事务内落库
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitPlan {
    pub request_id: String,
    pub work_date: NaiveDate,
    pub shift_code: Option<String>,
    /// 按排名顺序
    pub worker_ids: Vec<String>,
    pub actor: String,
    pub committed_at: NaiveDateTime,
}

/// 提交结果回执
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitReceipt {
    pub request_id: String,
    pub assignments: Vec<Assignment>,
    /// 被替换掉的旧人员
    pub displaced_worker_ids: Vec<String>,
    /// 其中恢复为 AVAILABLE 的人员
    pub restored_worker_ids: Vec<String>,
}

/// 修订回执
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionReceipt {
    pub request_id: String,
    pub removed_assignments: usize,
    pub restored_worker_ids: Vec<String>,
}
