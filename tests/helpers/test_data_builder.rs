// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use staffing_fulfillment::domain::request::StaffingRequest;
use staffing_fulfillment::domain::types::{AvailabilityState, EmploymentType, Gender, RequestStatus};
use staffing_fulfillment::domain::worker::{OrganizationalUnit, UnitMembership, Worker};
use staffing_fulfillment::engine::FulfillmentRepositories;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn ts() -> NaiveDateTime {
    date(2026, 6, 1).and_hms_opt(8, 0, 0).unwrap()
}

/// 默认工作日
pub fn work_day() -> NaiveDate {
    date(2026, 7, 2)
}

pub fn unit(unit_id: &str, section_id: &str) -> OrganizationalUnit {
    OrganizationalUnit {
        unit_id: unit_id.to_string(),
        section_id: section_id.to_string(),
        unit_name: format!("班组{}", unit_id),
    }
}

// ==========================================
// Worker 构建器
// ==========================================

pub struct WorkerBuilder {
    worker_id: String,
    gender: Gender,
    employment_type: EmploymentType,
    availability_state: AvailabilityState,
    leave_flag: bool,
    memberships: Vec<UnitMembership>,
}

impl WorkerBuilder {
    pub fn new(worker_id: &str, gender: Gender) -> Self {
        Self {
            worker_id: worker_id.to_string(),
            gender,
            employment_type: EmploymentType::Permanent,
            availability_state: AvailabilityState::Available,
            leave_flag: false,
            memberships: Vec::new(),
        }
    }

    pub fn male(worker_id: &str) -> Self {
        Self::new(worker_id, Gender::Male)
    }

    pub fn female(worker_id: &str) -> Self {
        Self::new(worker_id, Gender::Female)
    }

    pub fn daily(mut self) -> Self {
        self.employment_type = EmploymentType::Daily;
        self
    }

    pub fn member_of(mut self, unit_id: &str, section_id: &str) -> Self {
        self.memberships.push(UnitMembership {
            unit_id: unit_id.to_string(),
            section_id: section_id.to_string(),
            dedicated: false,
        });
        self
    }

    pub fn dedicated_to(mut self, unit_id: &str, section_id: &str) -> Self {
        self.memberships.push(UnitMembership {
            unit_id: unit_id.to_string(),
            section_id: section_id.to_string(),
            dedicated: true,
        });
        self
    }

    pub fn on_leave(mut self) -> Self {
        self.leave_flag = true;
        self
    }

    pub fn build(self) -> Worker {
        Worker {
            display_name: format!("人员{}", self.worker_id),
            worker_id: self.worker_id,
            gender: self.gender,
            employment_type: self.employment_type,
            availability_state: self.availability_state,
            leave_flag: self.leave_flag,
            memberships: self.memberships,
            updated_at: ts(),
        }
    }
}

// ==========================================
// StaffingRequest 构建器
// ==========================================

pub struct RequestBuilder {
    request_id: String,
    unit_id: String,
    section_id: String,
    work_date: NaiveDate,
    shift_code: Option<String>,
    required_total: u32,
    required_male: u32,
    required_female: u32,
}

impl RequestBuilder {
    pub fn new(request_id: &str, unit_id: &str, section_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            unit_id: unit_id.to_string(),
            section_id: section_id.to_string(),
            work_date: work_day(),
            shift_code: None,
            required_total: 1,
            required_male: 0,
            required_female: 0,
        }
    }

    pub fn on(mut self, work_date: NaiveDate) -> Self {
        self.work_date = work_date;
        self
    }

    pub fn shift(mut self, code: &str) -> Self {
        self.shift_code = Some(code.to_string());
        self
    }

    pub fn needs(mut self, total: u32, male: u32, female: u32) -> Self {
        self.required_total = total;
        self.required_male = male;
        self.required_female = female;
        self
    }

    pub fn build(self) -> StaffingRequest {
        StaffingRequest {
            request_id: self.request_id,
            unit_id: self.unit_id,
            section_id: self.section_id,
            work_date: self.work_date,
            shift_code: self.shift_code,
            required_total: self.required_total,
            required_male: self.required_male,
            required_female: self.required_female,
            status: RequestStatus::Pending,
            fulfilled_by: None,
            fulfilled_at: None,
            created_at: ts(),
            updated_at: ts(),
        }
    }
}

// ==========================================
// 场景写入
// ==========================================

/// 写入班组、人员与需求
pub fn seed(
    repos: &FulfillmentRepositories,
    units: &[OrganizationalUnit],
    workers: Vec<Worker>,
    requests: Vec<StaffingRequest>,
) {
    for u in units {
        repos.worker_repo.upsert_unit(u).unwrap();
    }
    repos.worker_repo.upsert_workers(&workers).unwrap();
    for r in &requests {
        repos.request_repo.insert(r).unwrap();
    }
}

/// 标准组织结构: S1 工段下 U1/U2，S2 工段下 U3
pub fn standard_units() -> Vec<OrganizationalUnit> {
    vec![unit("U1", "S1"), unit("U2", "S1"), unit("U3", "S2")]
}
