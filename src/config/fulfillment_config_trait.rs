// ==========================================
// 人员调配系统 - 调配配置读取 Trait
// ==========================================
// 职责: 定义调配引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::scoring_profile::{
    BaseWeights, BlendWeights, FallbackWeights, FeatureParams, ScoringProfile, StrategyTuning,
};
use crate::domain::types::QuotaPolicy;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// FulfillmentConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait FulfillmentConfigReader: Send + Sync {
    /// 最终分混合权重
    ///
    /// # 默认值
    /// - learned=0.6, base=0.3, priority=0.1
    async fn get_blend_weights(&self) -> Result<BlendWeights, Box<dyn Error>>;

    /// 规则基础分权重
    ///
    /// # 默认值
    /// - workload=0.5, qualification=0.3, rating=0.2
    async fn get_base_weights(&self) -> Result<BaseWeights, Box<dyn Error>>;

    /// 兜底公式权重
    async fn get_fallback_weights(&self) -> Result<FallbackWeights, Box<dyn Error>>;

    /// 特征提取参数（负荷阶梯、资质分、中性评分、班次序列等）
    async fn get_feature_params(&self) -> Result<FeatureParams, Box<dyn Error>>;

    /// 策略微调参数
    async fn get_strategy_tuning(&self) -> Result<StrategyTuning, Box<dyn Error>>;

    /// 性别配额不满足时的处理策略
    ///
    /// # 默认值
    /// - Reject
    async fn get_quota_policy(&self) -> Result<QuotaPolicy, Box<dyn Error>>;

    /// 批量结果中保留的错误条数上限
    ///
    /// # 默认值
    /// - 50
    async fn get_batch_error_cap(&self) -> Result<usize, Box<dyn Error>>;

    /// 组装一次运行使用的完整参数快照
    async fn load_scoring_profile(&self) -> Result<ScoringProfile, Box<dyn Error>> {
        let blend = self.get_blend_weights().await?;
        let base = self.get_base_weights().await?;
        let fallback = self.get_fallback_weights().await?;
        let features = self.get_feature_params().await?;
        let tuning = self.get_strategy_tuning().await?;
        let quota_policy = self.get_quota_policy().await?;
        let batch_error_cap = self.get_batch_error_cap().await?;

        Ok(ScoringProfile {
            blend,
            base,
            fallback,
            features,
            tuning,
            quota_policy,
            batch_error_cap,
        })
    }
}
