// ==========================================
// 人员调配系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供管理流程/命令行调用
// ==========================================

pub mod error;
pub mod fulfillment_api;
pub mod import_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use fulfillment_api::{FulfillResponse, FulfillmentApi};
pub use import_api::ImportApi;
