// ==========================================
// 人员调配系统 - 导入层
// ==========================================
// 职责: 外部花名册导入（CSV）
// ==========================================

pub mod error;
pub mod roster_importer;

pub use error::{ImportError, ImportResult};
pub use roster_importer::{RosterImportSummary, RosterImporter, RosterRowError};
