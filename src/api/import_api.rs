// ==========================================
// 人员调配系统 - 花名册导入 API
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::importer::{ImportError, RosterImportSummary, RosterImporter};

/// 导入API
pub struct ImportApi {
    importer: Arc<RosterImporter>,
}

impl ImportApi {
    pub fn new(importer: Arc<RosterImporter>) -> Self {
        Self { importer }
    }

    /// 导入花名册
    ///
    /// # 返回
    /// - Ok(RosterImportSummary): 有效行已落库，行级错误在 errors 中
    /// - Err(ApiError): 文件级错误（不存在/格式不支持/缺列/落库失败）
    pub fn import_roster(&self, file_path: &str, actor: &str) -> ApiResult<RosterImportSummary> {
        if file_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件路径不能为空".to_string()));
        }

        self.importer
            .import_csv(file_path, actor)
            .map_err(|e| match e {
                ImportError::Repository(repo) => ApiError::from(repo),
                other => ApiError::ImportError(other.to_string()),
            })
    }
}
