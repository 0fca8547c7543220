// ==========================================
// 人员调配系统 - 配置层
// ==========================================
// 职责: 调配评分/选择参数管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod fulfillment_config_trait;
pub mod scoring_profile;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use fulfillment_config_trait::FulfillmentConfigReader;
pub use scoring_profile::{
    BaseWeights, BlendWeights, FallbackWeights, FeatureParams, RankingModelParams, ScoringProfile,
    StrategyTuning,
};
