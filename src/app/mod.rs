// ==========================================
// 人员调配系统 - 应用层
// ==========================================
// 职责: 组装数据库连接、仓储、引擎与API
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
