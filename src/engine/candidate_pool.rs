// ==========================================
// 人员调配系统 - 候选池构建
// ==========================================
// 职责: 给定需求，筛选结构上可调配的人员
// 红线: 只读，无副作用；空候选池是合法结果而不是错误
// 输出: 按 worker_id 升序的候选人 + 每个被排除人员的原因代码
// ==========================================

use crate::domain::assignment::Assignment;
use crate::domain::request::StaffingRequest;
use crate::domain::types::{AvailabilityState, PoolScope};
use crate::domain::worker::Worker;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

// ==========================================
// RejectionReason - 排除原因
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    /// leave_flag 置位或状态为 ON_LEAVE
    OnLeave,
    Deactivated,
    /// 已调配到其他需求（非本需求的重新满足）
    NotAvailable { state: AvailabilityState },
    /// 同日已有其他需求的调配
    DoubleBooked { request_id: String },
    /// 本批次已被前序需求占用
    Excluded,
    /// 不在候选池范围（PoolScope 预过滤）
    OutOfScope,
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::OnLeave => "ON_LEAVE",
            RejectionReason::Deactivated => "DEACTIVATED",
            RejectionReason::NotAvailable { .. } => "NOT_AVAILABLE",
            RejectionReason::DoubleBooked { .. } => "DOUBLE_BOOKED",
            RejectionReason::Excluded => "EXCLUDED",
            RejectionReason::OutOfScope => "OUT_OF_SCOPE",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::OnLeave => write!(f, "ON_LEAVE: worker is on leave"),
            RejectionReason::Deactivated => write!(f, "DEACTIVATED: worker is deactivated"),
            RejectionReason::NotAvailable { state } => {
                write!(f, "NOT_AVAILABLE: availability is {}", state)
            }
            RejectionReason::DoubleBooked { request_id } => {
                write!(f, "DOUBLE_BOOKED: already assigned to {} on this date", request_id)
            }
            RejectionReason::Excluded => write!(f, "EXCLUDED: already claimed in this batch"),
            RejectionReason::OutOfScope => write!(f, "OUT_OF_SCOPE: outside requested pool scope"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedWorker {
    pub worker_id: String,
    pub reason: RejectionReason,
}

// ==========================================
// CandidatePool - 构建结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    /// 可调配人员（worker_id 升序）
    pub eligible: Vec<Worker>,
    pub rejected: Vec<RejectedWorker>,
}

impl CandidatePool {
    pub fn is_empty(&self) -> bool {
        self.eligible.is_empty()
    }

    /// 在可调配人员中查找
    pub fn find(&self, worker_id: &str) -> Option<&Worker> {
        self.eligible.iter().find(|w| w.worker_id == worker_id)
    }

    pub fn rejection_for(&self, worker_id: &str) -> Option<&RejectionReason> {
        self.rejected
            .iter()
            .find(|r| r.worker_id == worker_id)
            .map(|r| &r.reason)
    }
}

// ==========================================
// CandidatePoolBuilder - 候选池构建器
// ==========================================
pub struct CandidatePoolBuilder {
    // 无状态引擎
}

impl CandidatePoolBuilder {
    pub fn new() -> Self {
        Self {}
    }

    /// 构建候选池
    ///
    /// # 参数
    /// - `request`: 需求
    /// - `workers`: 人员快照（含班组归属）
    /// - `same_date_assignments`: 需求日期当天的全部调配
    /// - `excluded`: 本批次已占用的人员
    /// - `scope`: 组织范围预过滤
    ///
    /// # 规则（按顺序判定，命中即排除）
    /// 1. 范围外 → OUT_OF_SCOPE
    /// 2. leave_flag / ON_LEAVE → ON_LEAVE；DEACTIVATED → DEACTIVATED
    /// 3. 已被本批次占用 → EXCLUDED
    /// 4. 同日已有其他需求的调配 → DOUBLE_BOOKED
    /// 5. 非 AVAILABLE 且未持有本需求调配 → NOT_AVAILABLE
    pub fn build(
        &self,
        request: &StaffingRequest,
        workers: &[Worker],
        same_date_assignments: &[Assignment],
        excluded: &HashSet<String>,
        scope: PoolScope,
    ) -> CandidatePool {
        // worker_id → 当天持有的需求（已按 request_id 排序，取第一个非本需求的）
        let mut booked_elsewhere: HashMap<&str, &str> = HashMap::new();
        let mut on_this_request: HashSet<&str> = HashSet::new();
        for a in same_date_assignments {
            if a.work_date != request.work_date {
                continue;
            }
            if a.request_id == request.request_id {
                on_this_request.insert(a.worker_id.as_str());
            } else {
                booked_elsewhere
                    .entry(a.worker_id.as_str())
                    .or_insert(a.request_id.as_str());
            }
        }

        let mut pool = CandidatePool::default();
        for worker in workers {
            let rejection = if !Self::in_scope(worker, request, scope) {
                Some(RejectionReason::OutOfScope)
            } else if worker.leave_flag
                || worker.availability_state == AvailabilityState::OnLeave
            {
                Some(RejectionReason::OnLeave)
            } else if worker.availability_state == AvailabilityState::Deactivated {
                Some(RejectionReason::Deactivated)
            } else if excluded.contains(&worker.worker_id) {
                Some(RejectionReason::Excluded)
            } else if let Some(other) = booked_elsewhere.get(worker.worker_id.as_str()) {
                Some(RejectionReason::DoubleBooked {
                    request_id: other.to_string(),
                })
            } else if worker.availability_state != AvailabilityState::Available
                && !on_this_request.contains(worker.worker_id.as_str())
            {
                Some(RejectionReason::NotAvailable {
                    state: worker.availability_state,
                })
            } else {
                None
            };

            match rejection {
                Some(reason) => pool.rejected.push(RejectedWorker {
                    worker_id: worker.worker_id.clone(),
                    reason,
                }),
                None => pool.eligible.push(worker.clone()),
            }
        }

        pool.eligible.sort_by(|a, b| a.worker_id.cmp(&b.worker_id));
        pool.rejected.sort_by(|a, b| a.worker_id.cmp(&b.worker_id));

        debug!(
            request_id = %request.request_id,
            eligible = pool.eligible.len(),
            rejected = pool.rejected.len(),
            "候选池构建完成"
        );
        pool
    }

    fn in_scope(worker: &Worker, request: &StaffingRequest, scope: PoolScope) -> bool {
        match scope {
            PoolScope::All => true,
            PoolScope::SameSection => worker.belongs_to_section(&request.section_id),
            PoolScope::ExactUnit => worker.belongs_to_unit(&request.unit_id),
        }
    }
}

impl Default for CandidatePoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}
