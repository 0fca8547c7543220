// ==========================================
// 人员调配系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::fulfillment_config_trait::FulfillmentConfigReader;
use crate::config::scoring_profile::{
    BaseWeights, BlendWeights, FallbackWeights, FeatureParams, RankingModelParams, ScoringProfile,
    StrategyTuning,
};
use crate::db::open_sqlite_connection;
use crate::domain::types::QuotaPolicy;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 以 JSON 写入结构化配置
    pub fn set_global_config_json<T: Serialize>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), Box<dyn Error>> {
        let raw = serde_json::to_string(value)?;
        self.set_global_config_value(key, &raw)
    }

    /// 读取 JSON 配置；不存在或格式错误时返回默认值（格式错误记 warn）
    fn get_json_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: DeserializeOwned,
    {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(v) => Ok(v),
            Err(e) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    error = %e,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 读取排序模型系数
    ///
    /// # 返回
    /// - Some(params): 已配置
    /// - None: 未配置或格式错误
    pub fn get_ranking_model_params(&self) -> Result<Option<RankingModelParams>, Box<dyn Error>> {
        let raw = match self.get_config_value(config_keys::RANKING_MODEL)? {
            Some(v) => v,
            None => return Ok(None),
        };

        match serde_json::from_str::<RankingModelParams>(&raw) {
            Ok(p) => Ok(Some(p)),
            Err(e) => {
                tracing::warn!(error = %e, "排序模型系数格式错误，视为未训练");
                Ok(None)
            }
        }
    }
}

// ==========================================
// FulfillmentConfigReader Trait 实现
// ==========================================
#[async_trait]
impl FulfillmentConfigReader for ConfigManager {
    async fn get_blend_weights(&self) -> Result<BlendWeights, Box<dyn Error>> {
        let weights = self.get_json_or_default(config_keys::BLEND_WEIGHTS, BlendWeights::default())?;
        if [weights.learned, weights.base, weights.priority]
            .iter()
            .any(|w| !w.is_finite() || *w < 0.0)
        {
            tracing::warn!(?weights, "混合权重非法，使用默认值");
            return Ok(BlendWeights::default());
        }
        Ok(weights)
    }

    async fn get_base_weights(&self) -> Result<BaseWeights, Box<dyn Error>> {
        self.get_json_or_default(config_keys::BASE_WEIGHTS, BaseWeights::default())
    }

    async fn get_fallback_weights(&self) -> Result<FallbackWeights, Box<dyn Error>> {
        let weights =
            self.get_json_or_default(config_keys::FALLBACK_WEIGHTS, FallbackWeights::default())?;
        // 兜底公式要求权重合计为 1
        if (weights.sum() - 1.0).abs() > 1e-6 {
            tracing::warn!(sum = weights.sum(), "兜底权重合计不为 1，使用默认值");
            return Ok(FallbackWeights::default());
        }
        Ok(weights)
    }

    async fn get_feature_params(&self) -> Result<FeatureParams, Box<dyn Error>> {
        let mut params =
            self.get_json_or_default(config_keys::FEATURE_PARAMS, FeatureParams::default())?;
        if params.workload_steps.is_empty() {
            params.workload_steps = FeatureParams::default().workload_steps;
        }
        if params.priority_points_cap <= 0.0 {
            params.priority_points_cap = FeatureParams::default().priority_points_cap;
        }
        Ok(params)
    }

    async fn get_strategy_tuning(&self) -> Result<StrategyTuning, Box<dyn Error>> {
        self.get_json_or_default(config_keys::STRATEGY_TUNING, StrategyTuning::default())
    }

    async fn get_quota_policy(&self) -> Result<QuotaPolicy, Box<dyn Error>> {
        let value = self.get_config_value(config_keys::QUOTA_POLICY)?;
        Ok(value
            .as_deref()
            .and_then(QuotaPolicy::from_db_str)
            .unwrap_or_default())
    }

    async fn get_batch_error_cap(&self) -> Result<usize, Box<dyn Error>> {
        let value = self.get_config_value(config_keys::BATCH_ERROR_CAP)?;
        Ok(value
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|cap| *cap > 0)
            .unwrap_or(ScoringProfile::DEFAULT_BATCH_ERROR_CAP))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 评分
    pub const BLEND_WEIGHTS: &str = "blend_weights"; // JSON
    pub const BASE_WEIGHTS: &str = "base_weights"; // JSON
    pub const FALLBACK_WEIGHTS: &str = "fallback_weights"; // JSON
    pub const FEATURE_PARAMS: &str = "feature_params"; // JSON
    pub const STRATEGY_TUNING: &str = "strategy_tuning"; // JSON

    // 选择与批量
    pub const QUOTA_POLICY: &str = "quota_policy";
    pub const BATCH_ERROR_CAP: &str = "batch_error_cap";

    // 排序模型
    pub const RANKING_MODEL: &str = "ranking_model"; // JSON
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_empty() {
        let cfg = manager();
        let profile = cfg.load_scoring_profile().await.unwrap();
        assert_eq!(profile, ScoringProfile::standard());
        assert!(cfg.get_ranking_model_params().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overrides_and_invalid_values() {
        let cfg = manager();
        cfg.set_global_config_json(
            config_keys::BLEND_WEIGHTS,
            &BlendWeights {
                learned: 0.5,
                base: 0.4,
                priority: 0.1,
            },
        )
        .unwrap();
        cfg.set_global_config_value(config_keys::QUOTA_POLICY, "warn_and_proceed")
            .unwrap();
        cfg.set_global_config_value(config_keys::BATCH_ERROR_CAP, "abc")
            .unwrap();
        cfg.set_global_config_value(config_keys::FALLBACK_WEIGHTS, "{not json")
            .unwrap();

        let profile = cfg.load_scoring_profile().await.unwrap();
        assert_eq!(profile.blend.learned, 0.5);
        assert_eq!(profile.quota_policy, QuotaPolicy::WarnAndProceed);
        assert_eq!(profile.batch_error_cap, 50);
        assert_eq!(profile.fallback, FallbackWeights::default());
    }
}
