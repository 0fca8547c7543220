// ==========================================
// 人员调配系统 - 操作日志领域模型
// ==========================================
// 红线: 所有调配写入必须记录
// 用途: 审计追踪
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
// 对齐: action_log 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub action_type: String,
    pub action_ts: NaiveDateTime,
    pub actor: String,
    pub request_id: Option<String>,
    pub payload_json: Option<JsonValue>,
    pub detail: Option<String>,
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CommitAssignments, // 需求满足提交
    RequestRevision,   // 需求修订（撤销调配）
    BulkFulfill,       // 批量满足汇总
    RosterImport,      // 花名册导入
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CommitAssignments => "COMMIT_ASSIGNMENTS",
            ActionType::RequestRevision => "REQUEST_REVISION",
            ActionType::BulkFulfill => "BULK_FULFILL",
            ActionType::RosterImport => "ROSTER_IMPORT",
        }
    }
}

impl ActionLog {
    /// 构造一条新日志（生成 action_id）
    pub fn new(
        action_type: ActionType,
        actor: &str,
        request_id: Option<&str>,
        payload_json: Option<JsonValue>,
        detail: Option<String>,
    ) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type: action_type.as_str().to_string(),
            action_ts: chrono::Local::now().naive_local(),
            actor: actor.to_string(),
            request_id: request_id.map(|s| s.to_string()),
            payload_json,
            detail,
        }
    }
}
