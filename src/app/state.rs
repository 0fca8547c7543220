// ==========================================
// 人员调配系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{FulfillmentApi, ImportApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::types::PoolScope;
use crate::engine::{
    BulkAssignmentCoordinator, FulfillmentRepositories, LogisticRankingModel, RankingModel,
    UntrainedModel,
};
use crate::importer::RosterImporter;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "STAFFING_FULFILLMENT_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 调配API
    pub fulfillment_api: Arc<FulfillmentApi>,

    /// 花名册导入API
    pub import_api: Arc<ImportApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 仓储集合（供测试与维护脚本直接访问）
    pub repos: FulfillmentRepositories,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并确保表结构
    /// 2. 加载排序模型（未配置时使用兜底公式）
    /// 3. 创建所有API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        Self::from_connection(db_path, Arc::new(Mutex::new(conn)), PoolScope::All)
    }

    /// 基于已有连接创建（连接会被确保表结构）
    pub fn from_connection(
        db_path: String,
        conn: Arc<Mutex<Connection>>,
        pool_scope: PoolScope,
    ) -> Result<Self, String> {
        {
            let guard = conn.lock().map_err(|e| format!("数据库锁获取失败: {}", e))?;
            ensure_schema(&guard).map_err(|e| format!("表结构初始化失败: {}", e))?;
        }

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let model = load_ranking_model(&config_manager);

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let repos = FulfillmentRepositories::from_connection(conn);

        // ==========================================
        // 初始化Engine层与API层
        // ==========================================
        let coordinator = Arc::new(
            BulkAssignmentCoordinator::new(config_manager.clone(), repos.clone(), model)
                .with_pool_scope(pool_scope),
        );
        let fulfillment_api = Arc::new(FulfillmentApi::new(
            coordinator,
            repos.request_repo.clone(),
            repos.assignment_repo.clone(),
            repos.action_log_repo.clone(),
        ));
        let import_api = Arc::new(ImportApi::new(Arc::new(RosterImporter::new(
            repos.worker_repo.clone(),
            repos.action_log_repo.clone(),
        ))));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            fulfillment_api,
            import_api,
            config_manager,
            repos,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

/// 加载排序模型：读取失败或未配置时退回兜底公式
fn load_ranking_model(config_manager: &ConfigManager) -> Arc<dyn RankingModel> {
    match config_manager.get_ranking_model_params() {
        Ok(Some(params)) => match LogisticRankingModel::from_params(params) {
            Ok(model) => {
                tracing::info!(version = ?model.model_version(), trained = model.is_model_trained(), "排序模型已加载");
                Arc::new(model)
            }
            Err(e) => {
                tracing::warn!(error = %e, "排序模型系数无效，使用兜底公式");
                Arc::new(UntrainedModel)
            }
        },
        Ok(None) => {
            tracing::info!("未配置排序模型，使用兜底公式");
            Arc::new(UntrainedModel)
        }
        Err(e) => {
            tracing::warn!(error = %e, "读取排序模型失败，使用兜底公式");
            Arc::new(UntrainedModel)
        }
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 STAFFING_FULFILLMENT_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./staffing_fulfillment.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("staffing-fulfillment");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("staffing_fulfillment.db");
        }
    }

    path.to_string_lossy().to_string()
}
