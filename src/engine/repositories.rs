// ==========================================
// 人员调配系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合调配引擎所需的所有 Repository
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{
    ActionLogRepository, AssignmentRepository, StaffingRequestRepository, WorkerRepository,
    WorkerSignalRepository,
};

/// 调配引擎仓储集合
///
/// # 包含的仓储
/// - `request_repo`: 用工需求
/// - `worker_repo`: 人员主数据与班组归属
/// - `signal_repo`: 出勤/考核/评分/加权信号
/// - `assignment_repo`: 调配记录（唯一的状态写入口）
/// - `action_log_repo`: 操作日志
#[derive(Clone)]
pub struct FulfillmentRepositories {
    pub request_repo: Arc<StaffingRequestRepository>,
    pub worker_repo: Arc<WorkerRepository>,
    pub signal_repo: Arc<WorkerSignalRepository>,
    pub assignment_repo: Arc<AssignmentRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl FulfillmentRepositories {
    /// 基于同一连接创建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            request_repo: Arc::new(StaffingRequestRepository::new(conn.clone())),
            worker_repo: Arc::new(WorkerRepository::new(conn.clone())),
            signal_repo: Arc::new(WorkerSignalRepository::new(conn.clone())),
            assignment_repo: Arc::new(AssignmentRepository::new(conn.clone())),
            action_log_repo: Arc::new(ActionLogRepository::new(conn)),
        }
    }
}
