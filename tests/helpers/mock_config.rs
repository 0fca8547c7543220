// ==========================================
// Mock 配置与模型实现 - 用于集成测试
// ==========================================

#![allow(dead_code)]

use async_trait::async_trait;
use staffing_fulfillment::config::scoring_profile::{
    BaseWeights, BlendWeights, FallbackWeights, FeatureParams, ScoringProfile, StrategyTuning,
};
use staffing_fulfillment::config::FulfillmentConfigReader;
use staffing_fulfillment::domain::candidate::ModelFeatureRow;
use staffing_fulfillment::domain::types::QuotaPolicy;
use staffing_fulfillment::engine::{ModelError, RankingModel};
use std::error::Error;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Mock 配置结构（固定评分参数）
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub profile: ScoringProfile,
}

impl MockConfig {
    /// 创建默认配置
    pub fn default() -> Self {
        Self {
            profile: ScoringProfile::standard(),
        }
    }

    /// 配额不足时告警继续
    pub fn warn_and_proceed() -> Self {
        let mut config = Self::default();
        config.profile.quota_policy = QuotaPolicy::WarnAndProceed;
        config
    }

    pub fn with_error_cap(cap: usize) -> Self {
        let mut config = Self::default();
        config.profile.batch_error_cap = cap;
        config
    }
}

#[async_trait]
impl FulfillmentConfigReader for MockConfig {
    async fn get_blend_weights(&self) -> Result<BlendWeights, Box<dyn Error>> {
        Ok(self.profile.blend)
    }

    async fn get_base_weights(&self) -> Result<BaseWeights, Box<dyn Error>> {
        Ok(self.profile.base)
    }

    async fn get_fallback_weights(&self) -> Result<FallbackWeights, Box<dyn Error>> {
        Ok(self.profile.fallback)
    }

    async fn get_feature_params(&self) -> Result<FeatureParams, Box<dyn Error>> {
        Ok(self.profile.features.clone())
    }

    async fn get_strategy_tuning(&self) -> Result<StrategyTuning, Box<dyn Error>> {
        Ok(self.profile.tuning)
    }

    async fn get_quota_policy(&self) -> Result<QuotaPolicy, Box<dyn Error>> {
        Ok(self.profile.quota_policy)
    }

    async fn get_batch_error_cap(&self) -> Result<usize, Box<dyn Error>> {
        Ok(self.profile.batch_error_cap)
    }
}

// ==========================================
// Mock 排序模型
// ==========================================

/// 声称已训练但每次预测都失败的模型
pub struct FailingModel {
    pub calls: AtomicUsize,
}

impl FailingModel {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl RankingModel for FailingModel {
    fn is_model_trained(&self) -> bool {
        true
    }

    fn predict(&self, _rows: &[ModelFeatureRow]) -> Result<Vec<f64>, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ModelError::Prediction("predictor offline".to_string()))
    }
}

/// 对所有行返回同一分值的模型
pub struct ConstantModel(pub f64);

impl RankingModel for ConstantModel {
    fn is_model_trained(&self) -> bool {
        true
    }

    fn predict(&self, rows: &[ModelFeatureRow]) -> Result<Vec<f64>, ModelError> {
        Ok(vec![self.0; rows.len()])
    }

    fn model_version(&self) -> Option<&str> {
        Some("constant")
    }
}
