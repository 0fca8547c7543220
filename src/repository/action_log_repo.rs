// ==========================================
// 人员调配系统 - 操作日志数据仓储
// ==========================================
// 对齐: action_log 表
// 红线: 所有调配写入必须记录
// ==========================================

mod core;
mod queries;


pub use core::ActionLogRepository;
pub(crate) use core::insert_log;
