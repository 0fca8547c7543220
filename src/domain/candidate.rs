// ==========================================
// 人员调配系统 - 候选人特征与评分
// ==========================================
// 红线: 组件之间只传递强类型结构，不传递松散的 key-value
// ==========================================

use crate::domain::types::{EmploymentType, Gender, LocalityTier, ScoreSource};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// ShiftRecord - 历史班次
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftRecord {
    pub work_date: NaiveDate,
    pub shift_code: String,
    /// 在班次序列中的位置；不在序列中则为 None
    pub ordinal: Option<usize>,
}

// ==========================================
// CandidateFeatures - 单个候选人的特征向量
// ==========================================
// 不可变值对象；计算只依赖本人数据，与候选池大小无关
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateFeatures {
    pub worker_id: String,
    pub gender: Gender,
    pub employment_type: EmploymentType,

    // ===== 负荷与资质 =====
    pub workload_points: f64,
    pub qualification_points: f64,
    pub average_rating: f64,
    pub work_days_14: u32,
    pub work_days_30: u32,

    // ===== 轮班 =====
    pub last_shifts: Vec<ShiftRecord>,
    pub shift_rotation_priority: f64,

    // ===== 组织就近 =====
    pub locality_tier: LocalityTier,
    /// 专属班组位于需求所在工段
    pub dedicated_in_section: bool,

    // ===== 人工加权 =====
    pub priority_points: f64,
}

impl CandidateFeatures {
    pub fn has_priority_override(&self) -> bool {
        self.priority_points > 0.0
    }

    pub fn is_qualified(&self) -> bool {
        self.qualification_points > 0.0
    }
}

// ==========================================
// ModelFeatureRow - 排序模型输入行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFeatureRow {
    pub work_days_30: f64,
    pub average_rating: f64,
    pub qualification_points: f64,
    pub is_male: f64,
    pub is_permanent: f64,
    pub is_exact_unit: f64,
    pub is_same_section: f64,
    /// 14 天出勤强度 = work_days_14 / 14
    pub workload_intensity_14: f64,
    pub shift_rotation_priority: f64,
}

impl ModelFeatureRow {
    pub fn from_features(features: &CandidateFeatures) -> Self {
        Self {
            work_days_30: features.work_days_30 as f64,
            average_rating: features.average_rating,
            qualification_points: features.qualification_points,
            is_male: flag(features.gender == Gender::Male),
            is_permanent: flag(features.employment_type == EmploymentType::Permanent),
            is_exact_unit: flag(features.locality_tier == LocalityTier::ExactUnit),
            is_same_section: flag(features.locality_tier == LocalityTier::SameSection),
            workload_intensity_14: features.work_days_14 as f64 / 14.0,
            shift_rotation_priority: features.shift_rotation_priority,
        }
    }

    /// 按固定顺序展开（与模型系数顺序一致）
    pub fn as_vector(&self) -> [f64; 9] {
        [
            self.work_days_30,
            self.average_rating,
            self.qualification_points,
            self.is_male,
            self.is_permanent,
            self.is_exact_unit,
            self.is_same_section,
            self.workload_intensity_14,
            self.shift_rotation_priority,
        ]
    }
}

fn flag(v: bool) -> f64 {
    if v {
        1.0
    } else {
        0.0
    }
}

// ==========================================
// ScoredCandidate - 评分后的候选人
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub features: CandidateFeatures,
    pub base_score: f64,
    pub learned_score: f64,
    pub learned_source: ScoreSource,
    pub priority_score: f64,
    pub final_score: f64,
    /// 策略微调后的组内排序分（optimal 策略下等于 final_score）
    pub rank_score: f64,
}

impl ScoredCandidate {
    pub fn worker_id(&self) -> &str {
        &self.features.worker_id
    }

    pub fn gender(&self) -> Gender {
        self.features.gender
    }
}
