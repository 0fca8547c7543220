// ==========================================
// 人员调配系统 - 用工需求领域模型
// ==========================================
// 红线: required_male + required_female <= required_total
// ==========================================

use crate::domain::types::{Gender, RequestStatus};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// StaffingRequest - 用工需求
// ==========================================
// 对齐: staffing_request 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffingRequest {
    pub request_id: String,
    pub unit_id: String,
    /// 上级工段（由 organizational_unit 关联得出）
    pub section_id: String,
    pub work_date: NaiveDate,
    /// 班次代码（可选，用于轮班特征）
    pub shift_code: Option<String>,
    pub required_total: u32,
    pub required_male: u32,
    pub required_female: u32,
    pub status: RequestStatus,
    pub fulfilled_by: Option<String>,
    pub fulfilled_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl StaffingRequest {
    /// 校验性别配额不变量
    ///
    /// # 返回
    /// - Ok(()): 合法
    /// - Err(String): 违规原因
    pub fn validate_quota(&self) -> Result<(), String> {
        if self.required_total == 0 {
            return Err(format!(
                "request {} has required_total=0",
                self.request_id
            ));
        }
        let gendered = self.required_male.saturating_add(self.required_female);
        if gendered > self.required_total {
            return Err(format!(
                "request {}: required_male({}) + required_female({}) > required_total({})",
                self.request_id, self.required_male, self.required_female, self.required_total
            ));
        }
        Ok(())
    }

    /// 指定性别的最低配额
    pub fn required_for(&self, gender: Gender) -> u32 {
        match gender {
            Gender::Male => self.required_male,
            Gender::Female => self.required_female,
        }
    }

    /// 该性别是否被需求显式要求
    pub fn needs_gender(&self, gender: Gender) -> bool {
        self.required_for(gender) > 0
    }

    pub fn is_fulfilled(&self) -> bool {
        self.status == RequestStatus::Fulfilled
    }
}
