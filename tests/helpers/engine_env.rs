// ==========================================
// 引擎集成测试环境
// ==========================================

#![allow(dead_code)]

#[path = "../test_helpers.rs"]
pub mod test_helpers;

use rusqlite::Connection;
use staffing_fulfillment::engine::{
    BulkAssignmentCoordinator, FulfillmentRepositories, RankingModel, UntrainedModel,
};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

use super::mock_config::MockConfig;

/// 引擎测试环境
///
/// 持有临时数据库文件，Drop 时自动删除
pub struct EngineTestEnv {
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub conn: Arc<Mutex<Connection>>,
    pub repos: FulfillmentRepositories,
    pub coordinator: BulkAssignmentCoordinator<MockConfig>,
}

impl EngineTestEnv {
    /// 默认配置 + 未训练模型
    pub fn new() -> Self {
        Self::with(MockConfig::default(), Arc::new(UntrainedModel))
    }

    pub fn with(config: MockConfig, model: Arc<dyn RankingModel>) -> Self {
        staffing_fulfillment::logging::init_test();
        let (temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
        let conn = test_helpers::open_shared(&db_path).expect("打开测试数据库失败");
        let repos = FulfillmentRepositories::from_connection(conn.clone());
        let coordinator = BulkAssignmentCoordinator::new(Arc::new(config), repos.clone(), model);

        Self {
            _temp_file: temp_file,
            db_path,
            conn,
            repos,
            coordinator,
        }
    }
}
