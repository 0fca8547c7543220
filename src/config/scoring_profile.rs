// ==========================================
// 人员调配系统 - 评分参数快照
// ==========================================
// 用途: 每次批量运行开始时加载一次，运行期间只读，保证结果可复现
// 存储: config_kv（scope_id='global'），各字段对应独立配置键
// ==========================================

use crate::domain::types::QuotaPolicy;
use serde::{Deserialize, Serialize};

/// 最终分三路混合权重
///
/// 说明: 学习分权重属于策略配置而非推导常量（模型可能基于旧特征口径训练）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendWeights {
    pub learned: f64,
    pub base: f64,
    pub priority: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            learned: 0.6,
            base: 0.3,
            priority: 0.1,
        }
    }
}

/// 规则基础分权重
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaseWeights {
    pub workload: f64,
    pub qualification: f64,
    pub rating: f64,
}

impl Default for BaseWeights {
    fn default() -> Self {
        Self {
            workload: 0.5,
            qualification: 0.3,
            rating: 0.2,
        }
    }
}

/// 无模型时的兜底公式权重（合计 1.0）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallbackWeights {
    pub inverse_work_days: f64,
    pub rating: f64,
    pub qualification: f64,
    pub locality: f64,
    pub rotation: f64,
}

impl Default for FallbackWeights {
    fn default() -> Self {
        Self {
            inverse_work_days: 0.30,
            rating: 0.20,
            qualification: 0.20,
            locality: 0.15,
            rotation: 0.15,
        }
    }
}

impl FallbackWeights {
    pub fn sum(&self) -> f64 {
        self.inverse_work_days + self.rating + self.qualification + self.locality + self.rotation
    }
}

/// 特征提取参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureParams {
    /// 周出勤次数 → 负荷分（下标=次数，超出取最后一档）
    pub workload_steps: Vec<f64>,
    pub qualification_points: f64,
    /// 无评分时的中性值
    pub neutral_rating: f64,
    pub rating_max: f64,
    pub priority_points_cap: f64,
    /// 班次轮转顺序
    pub shift_sequence: Vec<String>,
    pub max_last_shifts: usize,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            workload_steps: vec![5.0, 4.0, 3.0, 2.0, 1.0, 0.0],
            qualification_points: 5.0,
            neutral_rating: 2.5,
            rating_max: 5.0,
            priority_points_cap: 3.0,
            shift_sequence: vec![
                "MORNING".to_string(),
                "AFTERNOON".to_string(),
                "NIGHT".to_string(),
            ],
            max_last_shifts: 5,
        }
    }
}

impl FeatureParams {
    /// 负荷分上限（无近期出勤时取该值）
    pub fn max_workload_points(&self) -> f64 {
        self.workload_steps
            .iter()
            .copied()
            .fold(0.0_f64, f64::max)
    }
}

/// 策略微调参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyTuning {
    /// balanced: 每个近 14 天出勤日的扣分
    pub balanced_workload_penalty: f64,
    /// same_section_first: 专属班组在本工段的加分
    pub dedicated_bonus: f64,
}

impl Default for StrategyTuning {
    fn default() -> Self {
        Self {
            balanced_workload_penalty: 0.25,
            dedicated_bonus: 0.2,
        }
    }
}

/// 排序模型系数（训练与存储不在本系统内，只消费结果）
///
/// 存储位置: config_kv（key='ranking_model'，JSON）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingModelParams {
    pub model_version: String,
    pub intercept: f64,
    /// 顺序与 ModelFeatureRow::as_vector 一致
    pub coefficients: Vec<f64>,
    #[serde(default)]
    pub trained: bool,
}

// ==========================================
// ScoringProfile - 一次运行使用的完整参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScoringProfile {
    pub blend: BlendWeights,
    pub base: BaseWeights,
    pub fallback: FallbackWeights,
    pub features: FeatureParams,
    pub tuning: StrategyTuning,
    pub quota_policy: QuotaPolicy,
    pub batch_error_cap: usize,
}

impl ScoringProfile {
    pub const DEFAULT_BATCH_ERROR_CAP: usize = 50;

    pub fn standard() -> Self {
        Self {
            batch_error_cap: Self::DEFAULT_BATCH_ERROR_CAP,
            ..Self::default()
        }
    }
}
