// ==========================================
// 人员调配系统 - 层级排序引擎
// ==========================================
// 职责: 按固定排序键对评分后的候选人排序
// 排序键（字典序，前项相同才比较后项）:
// 1) 有人工加权优先
// 2) 就近层级 exact_unit < same_section < other
// 3) 排序分降序（策略只在此项上微调）
// 4) 需求需要该性别者优先
// 5) 正式工优先
// 6) worker_id 升序
// ==========================================

use crate::config::scoring_profile::StrategyTuning;
use crate::domain::candidate::ScoredCandidate;
use crate::domain::request::StaffingRequest;
use crate::engine::strategy::FulfillmentStrategy;
use std::cmp::Ordering;

/// 分数降序包装（f64 用 total_cmp 得到全序）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreDesc(pub f64);

impl Eq for ScoreDesc {}

impl PartialOrd for ScoreDesc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoreDesc {
    fn cmp(&self, other: &Self) -> Ordering {
        other.0.total_cmp(&self.0)
    }
}

/// 排序键
pub type RankingKey<'a> = (u8, u8, ScoreDesc, u8, u8, &'a str);

// ==========================================
// PriorityTierSorter - 层级排序器
// ==========================================
pub struct PriorityTierSorter {
    tuning: StrategyTuning,
}

impl PriorityTierSorter {
    pub fn new(tuning: StrategyTuning) -> Self {
        Self { tuning }
    }

    /// 按策略计算组内排序分
    pub fn rank_score(&self, candidate: &ScoredCandidate, strategy: FulfillmentStrategy) -> f64 {
        let f = &candidate.features;
        match strategy {
            FulfillmentStrategy::Optimal => candidate.final_score,
            FulfillmentStrategy::Balanced => {
                candidate.final_score
                    - self.tuning.balanced_workload_penalty * f.work_days_14 as f64
            }
            FulfillmentStrategy::SameSectionFirst => {
                if f.dedicated_in_section {
                    candidate.final_score + self.tuning.dedicated_bonus
                } else {
                    candidate.final_score
                }
            }
        }
    }

    /// 排序（写入 rank_score 后稳定排序）
    pub fn sort(
        &self,
        mut candidates: Vec<ScoredCandidate>,
        request: &StaffingRequest,
        strategy: FulfillmentStrategy,
    ) -> Vec<ScoredCandidate> {
        for c in candidates.iter_mut() {
            c.rank_score = self.rank_score(c, strategy);
        }
        candidates.sort_by(|a, b| ranking_key(a, request).cmp(&ranking_key(b, request)));
        candidates
    }
}

/// 单一纯函数排序键
pub fn ranking_key<'a>(candidate: &'a ScoredCandidate, request: &StaffingRequest) -> RankingKey<'a> {
    let f = &candidate.features;
    (
        if f.has_priority_override() { 0 } else { 1 },
        f.locality_tier.rank(),
        ScoreDesc(candidate.rank_score),
        if request.needs_gender(f.gender) { 0 } else { 1 },
        f.employment_type.rank(),
        f.worker_id.as_str(),
    )
}
