// ==========================================
// 人员调配系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 用工需求自动满足（排名 + 性别配额 + 原子提交）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 花名册
pub mod importer;

// 配置层 - 评分参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    ActionLog, ActionType, Assignment, CandidateFeatures, ScoredCandidate, StaffingRequest,
};

// 引擎
pub use engine::{
    BatchFulfillmentResult, BatchPreview, BulkAssignmentCoordinator, ExplicitSelection,
    FulfillmentError, FulfillmentFailure, FulfillmentStrategy, RankingModel, RequestOutcome,
    SlotOverride,
};

// API
pub use api::{FulfillResponse, FulfillmentApi, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "人员调配系统";
