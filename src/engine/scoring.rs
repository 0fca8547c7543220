// ==========================================
// 人员调配系统 - 评分混合
// ==========================================
// 最终分 = w_learned × 学习分 + w_base × 基础分 + w_priority × 加权分
// 学习分: 模型可用时取预测值（裁剪到 [0,1]），否则走确定性兜底公式
// 红线: 模型故障只记录告警，不向上抛出
// ==========================================

use crate::config::scoring_profile::ScoringProfile;
use crate::domain::candidate::{CandidateFeatures, ModelFeatureRow, ScoredCandidate};
use crate::domain::types::{LocalityTier, ScoreSource};
use crate::engine::ranking_model::RankingModel;
use tracing::{debug, warn};

// ==========================================
// ScoreBlender - 评分混合器
// ==========================================
pub struct ScoreBlender<'a> {
    profile: &'a ScoringProfile,
}

impl<'a> ScoreBlender<'a> {
    pub fn new(profile: &'a ScoringProfile) -> Self {
        Self { profile }
    }

    /// 规则基础分
    pub fn base_score(&self, f: &CandidateFeatures) -> f64 {
        let w = &self.profile.base;
        w.workload * f.workload_points + w.qualification * f.qualification_points + w.rating * f.average_rating
    }

    /// 兜底学习分 ∈ [0,1]
    pub fn fallback_score(&self, f: &CandidateFeatures) -> f64 {
        let w = &self.profile.fallback;
        let rating_max = self.profile.features.rating_max;
        let normalized_rating = if rating_max > 0.0 {
            (f.average_rating / rating_max).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let qualified = if f.is_qualified() { 1.0 } else { 0.0 };

        let score = w.inverse_work_days * (1.0 / (1.0 + f.work_days_30 as f64))
            + w.rating * normalized_rating
            + w.qualification * qualified
            + w.locality * locality_bonus(f.locality_tier)
            + w.rotation * f.shift_rotation_priority;
        score.clamp(0.0, 1.0)
    }

    /// 人工加权分 ∈ [0,1]
    pub fn priority_score(&self, f: &CandidateFeatures) -> f64 {
        let cap = self.profile.features.priority_points_cap;
        if cap <= 0.0 {
            return 0.0;
        }
        (f.priority_points / cap).clamp(0.0, 1.0)
    }

    /// 对整个候选列表评分（保持输入顺序）
    ///
    /// 模型只调用一次（批量预测）；以下情况整体走兜底:
    /// - 模型未训练
    /// - 预测返回错误
    /// - 返回长度与输入不一致
    ///
    /// 单行返回非有限值时，仅该行走兜底
    pub fn score_all(
        &self,
        candidates: Vec<CandidateFeatures>,
        model: &dyn RankingModel,
    ) -> Vec<ScoredCandidate> {
        let predictions = self.predict(&candidates, model);

        candidates
            .into_iter()
            .enumerate()
            .map(|(idx, features)| {
                let (learned_score, learned_source) =
                    match predictions.as_ref().and_then(|p| p.get(idx).copied()) {
                        Some(p) if p.is_finite() => (p.clamp(0.0, 1.0), ScoreSource::Model),
                        _ => (self.fallback_score(&features), ScoreSource::Fallback),
                    };
                self.blend(features, learned_score, learned_source)
            })
            .collect()
    }

    fn blend(
        &self,
        features: CandidateFeatures,
        learned_score: f64,
        learned_source: ScoreSource,
    ) -> ScoredCandidate {
        let w = &self.profile.blend;
        let base_score = self.base_score(&features);
        let priority_score = self.priority_score(&features);
        let final_score =
            w.learned * learned_score + w.base * base_score + w.priority * priority_score;

        ScoredCandidate {
            features,
            base_score,
            learned_score,
            learned_source,
            priority_score,
            final_score,
            rank_score: final_score,
        }
    }

    fn predict(
        &self,
        candidates: &[CandidateFeatures],
        model: &dyn RankingModel,
    ) -> Option<Vec<f64>> {
        if candidates.is_empty() || !model.is_model_trained() {
            debug!(candidates_count = candidates.len(), "模型未就绪，使用兜底学习分");
            return None;
        }

        let rows: Vec<ModelFeatureRow> =
            candidates.iter().map(ModelFeatureRow::from_features).collect();
        match model.predict(&rows) {
            Ok(scores) if scores.len() == rows.len() => Some(scores),
            Ok(scores) => {
                warn!(
                    expected = rows.len(),
                    got = scores.len(),
                    model_version = model.model_version().unwrap_or("-"),
                    "模型返回长度不一致，使用兜底学习分"
                );
                None
            }
            Err(e) => {
                warn!(
                    error = %e,
                    model_version = model.model_version().unwrap_or("-"),
                    "模型预测失败，使用兜底学习分"
                );
                None
            }
        }
    }
}

/// 就近加分: exact 1.0, section 0.5, other 0
fn locality_bonus(tier: LocalityTier) -> f64 {
    match tier {
        LocalityTier::ExactUnit => 1.0,
        LocalityTier::SameSection => 0.5,
        LocalityTier::Other => 0.0,
    }
}
