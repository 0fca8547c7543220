// ==========================================
// 人员调配系统 - 排序模型预测接口
// ==========================================
// 模型训练与存储不在本系统内，这里只约定预测契约
// 失败/未训练时由 ScoreBlender 走确定性兜底公式
// ==========================================

use crate::config::scoring_profile::RankingModelParams;
use crate::domain::candidate::ModelFeatureRow;
use thiserror::Error;

/// 模型特征维度（与 ModelFeatureRow::as_vector 一致）
pub const MODEL_FEATURE_DIM: usize = 9;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("模型未训练")]
    NotTrained,

    #[error("模型系数维度不匹配: expected={expected}, got={got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("模型预测失败: {0}")]
    Prediction(String),
}

// ==========================================
// RankingModel Trait
// ==========================================
pub trait RankingModel: Send + Sync {
    fn is_model_trained(&self) -> bool;

    /// 逐行预测；返回值应与输入等长，取值 [0,1]
    fn predict(&self, rows: &[ModelFeatureRow]) -> Result<Vec<f64>, ModelError>;

    fn model_version(&self) -> Option<&str> {
        None
    }
}

// ==========================================
// UntrainedModel - 无模型占位
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct UntrainedModel;

impl RankingModel for UntrainedModel {
    fn is_model_trained(&self) -> bool {
        false
    }

    fn predict(&self, _rows: &[ModelFeatureRow]) -> Result<Vec<f64>, ModelError> {
        Err(ModelError::NotTrained)
    }
}

// ==========================================
// LogisticRankingModel - 系数驱动的逻辑回归模型
// ==========================================
// 系数来自 config_kv（key='ranking_model'）
#[derive(Debug, Clone)]
pub struct LogisticRankingModel {
    params: RankingModelParams,
}

impl LogisticRankingModel {
    /// 由配置构造（校验系数维度与数值）
    pub fn from_params(params: RankingModelParams) -> Result<Self, ModelError> {
        if params.coefficients.len() != MODEL_FEATURE_DIM {
            return Err(ModelError::DimensionMismatch {
                expected: MODEL_FEATURE_DIM,
                got: params.coefficients.len(),
            });
        }
        if !params.intercept.is_finite() || params.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ModelError::Prediction(format!(
                "non-finite coefficient in model {}",
                params.model_version
            )));
        }
        Ok(Self { params })
    }

    fn score_row(&self, row: &ModelFeatureRow) -> f64 {
        let z = row
            .as_vector()
            .iter()
            .zip(self.params.coefficients.iter())
            .fold(self.params.intercept, |acc, (x, w)| acc + x * w);
        1.0 / (1.0 + (-z).exp())
    }
}

impl RankingModel for LogisticRankingModel {
    fn is_model_trained(&self) -> bool {
        self.params.trained
    }

    fn predict(&self, rows: &[ModelFeatureRow]) -> Result<Vec<f64>, ModelError> {
        if !self.params.trained {
            return Err(ModelError::NotTrained);
        }
        Ok(rows.iter().map(|r| self.score_row(r)).collect())
    }

    fn model_version(&self) -> Option<&str> {
        Some(&self.params.model_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ModelFeatureRow {
        ModelFeatureRow {
            work_days_30: 2.0,
            average_rating: 4.0,
            qualification_points: 5.0,
            is_male: 1.0,
            is_permanent: 0.0,
            is_exact_unit: 1.0,
            is_same_section: 0.0,
            workload_intensity_14: 1.0 / 14.0,
            shift_rotation_priority: 0.8,
        }
    }

    fn params(coefficients: Vec<f64>, trained: bool) -> RankingModelParams {
        RankingModelParams {
            model_version: "v-test".to_string(),
            intercept: 0.0,
            coefficients,
            trained,
        }
    }

    #[test]
    fn test_untrained_model_refuses() {
        let m = UntrainedModel;
        assert!(!m.is_model_trained());
        assert_eq!(m.predict(&[row()]), Err(ModelError::NotTrained));
    }

    #[test]
    fn test_logistic_prediction_in_unit_range() {
        let m = LogisticRankingModel::from_params(params(vec![0.0; 9], true)).unwrap();
        let out = m.predict(&[row(), row()]).unwrap();
        assert_eq!(out, vec![0.5, 0.5]);

        let m = LogisticRankingModel::from_params(params(
            vec![-0.1, 0.3, 0.1, 0.0, 0.2, 0.5, 0.2, -1.0, 0.4],
            true,
        ))
        .unwrap();
        let p = m.predict(&[row()]).unwrap()[0];
        assert!(p > 0.5 && p < 1.0);
        assert_eq!(m.model_version(), Some("v-test"));
    }

    #[test]
    fn test_rejects_wrong_dimension() {
        assert_eq!(
            LogisticRankingModel::from_params(params(vec![1.0; 3], true)).unwrap_err(),
            ModelError::DimensionMismatch {
                expected: 9,
                got: 3
            }
        );
        let m = LogisticRankingModel::from_params(params(vec![0.0; 9], false)).unwrap();
        assert!(!m.is_model_trained());
    }
}
