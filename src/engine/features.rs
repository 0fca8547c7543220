// ==========================================
// 人员调配系统 - 特征提取
// ==========================================
// 职责: 为每个候选人计算不可变的特征记录
// 红线: 每个候选人独立计算，不做依赖候选池整体的归一化
// ==========================================

use crate::config::scoring_profile::FeatureParams;
use crate::domain::candidate::{CandidateFeatures, ShiftRecord};
use crate::domain::request::StaffingRequest;
use crate::domain::types::LocalityTier;
use crate::domain::worker::{Worker, WorkerSignals};
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeSet, HashMap};

/// 无历史班次时的轮转优先级（新人不受惩罚）
pub const ROTATION_NO_HISTORY: f64 = 0.8;
/// 需求班次未知或无法比较
pub const ROTATION_NEUTRAL: f64 = 0.5;
/// 连续同一班次
pub const ROTATION_SAME_SHIFT: f64 = 0.2;
/// 正向轮转一档
pub const ROTATION_FORWARD_ONE: f64 = 1.0;
/// 正向轮转两档
pub const ROTATION_FORWARD_TWO: f64 = 0.9;

// ==========================================
// FeatureExtractor - 特征提取器
// ==========================================
pub struct FeatureExtractor {
    params: FeatureParams,
}

impl FeatureExtractor {
    pub fn new(params: FeatureParams) -> Self {
        Self { params }
    }

    /// 批量提取（保持候选人输入顺序）
    ///
    /// 缺少信号的人员按“无任何历史”处理
    pub fn extract_all(
        &self,
        request: &StaffingRequest,
        candidates: &[Worker],
        signals: &HashMap<String, WorkerSignals>,
    ) -> Vec<CandidateFeatures> {
        let empty = WorkerSignals::default();
        candidates
            .iter()
            .map(|w| self.extract(request, w, signals.get(&w.worker_id).unwrap_or(&empty)))
            .collect()
    }

    /// 提取单个候选人的特征
    pub fn extract(
        &self,
        request: &StaffingRequest,
        worker: &Worker,
        signals: &WorkerSignals,
    ) -> CandidateFeatures {
        let last_shifts = self.last_shifts(signals, request.work_date);

        CandidateFeatures {
            worker_id: worker.worker_id.clone(),
            gender: worker.gender,
            employment_type: worker.employment_type,
            workload_points: self.workload_points(signals),
            qualification_points: self.qualification_points(signals),
            average_rating: self.average_rating(signals),
            work_days_14: work_days_in_window(signals, request.work_date, 14),
            work_days_30: work_days_in_window(signals, request.work_date, 30),
            shift_rotation_priority: self
                .shift_rotation_priority(&last_shifts, request.shift_code.as_deref()),
            last_shifts,
            locality_tier: locality_tier(worker, request),
            dedicated_in_section: worker
                .dedicated_membership()
                .map(|m| m.section_id == request.section_id)
                .unwrap_or(false),
            priority_points: self.priority_points(signals, &request.unit_id),
        }
    }

    // ==========================================
    // 单项特征
    // ==========================================

    /// 负荷分: 周出勤次数查阶梯表；无快照取最高档
    pub fn workload_points(&self, signals: &WorkerSignals) -> f64 {
        let steps = &self.params.workload_steps;
        match (&signals.latest_weekly_load, steps.last()) {
            (Some(load), Some(last)) => steps
                .get(load.work_count as usize)
                .copied()
                .unwrap_or(*last),
            _ => self.params.max_workload_points(),
        }
    }

    pub fn qualification_points(&self, signals: &WorkerSignals) -> f64 {
        match &signals.latest_assessment {
            Some(a) if a.passed => self.params.qualification_points,
            _ => 0.0,
        }
    }

    pub fn average_rating(&self, signals: &WorkerSignals) -> f64 {
        if signals.ratings.is_empty() {
            return self.params.neutral_rating;
        }
        let sum: f64 = signals.ratings.iter().map(|r| r.score).sum();
        sum / signals.ratings.len() as f64
    }

    /// 最近的班次记录（最新在前，最多 max_last_shifts 条；无班次代码的出勤不计入）
    pub fn last_shifts(&self, signals: &WorkerSignals, before: NaiveDate) -> Vec<ShiftRecord> {
        let mut history: Vec<_> = signals
            .history
            .iter()
            .filter(|h| h.work_date < before)
            .filter_map(|h| h.shift_code.as_ref().map(|code| (h.work_date, code)))
            .collect();
        // 日期降序；同日按班次代码保证稳定
        history.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));

        history
            .into_iter()
            .take(self.params.max_last_shifts)
            .map(|(work_date, code)| ShiftRecord {
                work_date,
                shift_code: code.clone(),
                ordinal: self.shift_ordinal(code),
            })
            .collect()
    }

    /// 轮转优先级 ∈ [0,1]
    ///
    /// - 无历史班次 → 0.8
    /// - 需求班次缺失/不在序列中 → 0.5
    /// - 同班次 → 0.2；正向一档 → 1.0；正向两档 → 0.9；后退等不规则轮换 → 0.5
    pub fn shift_rotation_priority(
        &self,
        last_shifts: &[ShiftRecord],
        requested_shift: Option<&str>,
    ) -> f64 {
        let last = match last_shifts.first() {
            Some(s) => s,
            None => return ROTATION_NO_HISTORY,
        };
        let requested = match requested_shift.and_then(|s| self.shift_ordinal(s)) {
            Some(o) => o,
            None => return ROTATION_NEUTRAL,
        };
        let previous = match last.ordinal {
            Some(o) => o,
            None => return ROTATION_NEUTRAL,
        };

        let n = self.params.shift_sequence.len();
        let forward = (requested + n - previous) % n;
        match forward {
            0 => ROTATION_SAME_SHIFT,
            1 => ROTATION_FORWARD_ONE,
            // 序列不超过 3 档时，跨序列尾部的两档与后退一档无法区分，按不规则处理
            2 if n > 3 || requested > previous => ROTATION_FORWARD_TWO,
            _ => ROTATION_NEUTRAL,
        }
    }

    /// 适用的人工加权之和（封顶）
    pub fn priority_points(&self, signals: &WorkerSignals, unit_id: &str) -> f64 {
        let sum: f64 = signals
            .overrides
            .iter()
            .filter(|o| o.applies_to(unit_id))
            .map(|o| o.weight_multiplier)
            .sum();
        sum.min(self.params.priority_points_cap)
    }

    fn shift_ordinal(&self, code: &str) -> Option<usize> {
        let code = code.trim();
        self.params
            .shift_sequence
            .iter()
            .position(|s| s.eq_ignore_ascii_case(code))
    }
}

/// 窗口 [work_date - days, work_date) 内的不同出勤日期数
pub fn work_days_in_window(signals: &WorkerSignals, work_date: NaiveDate, days: i64) -> u32 {
    let start = work_date - Duration::days(days);
    let dates: BTreeSet<NaiveDate> = signals
        .history
        .iter()
        .map(|h| h.work_date)
        .filter(|d| *d >= start && *d < work_date)
        .collect();
    dates.len() as u32
}

/// 组织就近层级
pub fn locality_tier(worker: &Worker, request: &StaffingRequest) -> LocalityTier {
    if worker.belongs_to_unit(&request.unit_id) {
        LocalityTier::ExactUnit
    } else if worker.belongs_to_section(&request.section_id) {
        LocalityTier::SameSection
    } else {
        LocalityTier::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{AvailabilityState, EmploymentType, Gender, RequestStatus};
    use crate::domain::worker::{
        AssessmentResult, PriorityOverride, RatingRecord, UnitMembership, WeeklyWorkload,
        WorkHistoryRecord,
    };

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, day).unwrap()
    }

    fn request(shift: Option<&str>) -> StaffingRequest {
        let ts = d(1).and_hms_opt(0, 0, 0).unwrap();
        StaffingRequest {
            request_id: "R1".to_string(),
            unit_id: "U1".to_string(),
            section_id: "S1".to_string(),
            work_date: d(30),
            shift_code: shift.map(|s| s.to_string()),
            required_total: 1,
            required_male: 0,
            required_female: 0,
            status: RequestStatus::Pending,
            fulfilled_by: None,
            fulfilled_at: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    fn worker(memberships: Vec<UnitMembership>) -> Worker {
        Worker {
            worker_id: "W1".to_string(),
            display_name: "W1".to_string(),
            gender: Gender::Female,
            employment_type: EmploymentType::Daily,
            availability_state: AvailabilityState::Available,
            leave_flag: false,
            memberships,
            updated_at: d(1).and_hms_opt(0, 0, 0).unwrap(),
        }
    }

    fn membership(unit: &str, section: &str, dedicated: bool) -> UnitMembership {
        UnitMembership {
            unit_id: unit.to_string(),
            section_id: section.to_string(),
            dedicated,
        }
    }

    fn history(day: u32, request_id: &str, shift: Option<&str>) -> WorkHistoryRecord {
        WorkHistoryRecord {
            worker_id: "W1".to_string(),
            work_date: d(day),
            request_id: request_id.to_string(),
            shift_code: shift.map(|s| s.to_string()),
        }
    }

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new(FeatureParams::default())
    }

    #[test]
    fn test_defaults_without_signals() {
        let f = extractor().extract(
            &request(Some("MORNING")),
            &worker(vec![]),
            &WorkerSignals::default(),
        );
        assert_eq!(f.workload_points, 5.0);
        assert_eq!(f.qualification_points, 0.0);
        assert_eq!(f.average_rating, 2.5);
        assert_eq!(f.work_days_14, 0);
        assert_eq!(f.work_days_30, 0);
        assert!(f.last_shifts.is_empty());
        assert_eq!(f.shift_rotation_priority, ROTATION_NO_HISTORY);
        assert_eq!(f.locality_tier, LocalityTier::Other);
        assert_eq!(f.priority_points, 0.0);
    }

    #[test]
    fn test_workload_steps_and_signals() {
        let ts = d(1).and_hms_opt(9, 0, 0).unwrap();
        let signals = WorkerSignals {
            history: vec![
                history(29, "R9", Some("MORNING")),
                history(20, "R8", None),
                history(20, "R7", None),
                history(5, "R6", Some("NIGHT")),
            ],
            latest_weekly_load: Some(WeeklyWorkload {
                worker_id: "W1".to_string(),
                week_start: d(22),
                work_count: 7,
            }),
            latest_assessment: Some(AssessmentResult {
                worker_id: "W1".to_string(),
                assessed_at: ts,
                passed: true,
            }),
            ratings: vec![
                RatingRecord {
                    worker_id: "W1".to_string(),
                    score: 4.0,
                    rated_at: ts,
                },
                RatingRecord {
                    worker_id: "W1".to_string(),
                    score: 3.0,
                    rated_at: ts,
                },
            ],
            overrides: vec![],
        };

        let f = extractor().extract(&request(Some("AFTERNOON")), &worker(vec![]), &signals);
        // 超出阶梯表长度取最后一档
        assert_eq!(f.workload_points, 0.0);
        assert_eq!(f.qualification_points, 5.0);
        assert_eq!(f.average_rating, 3.5);
        // d29, d20（同日两条只计一次）
        assert_eq!(f.work_days_14, 2);
        // 加上 d5 仍在 30 天窗口内
        assert_eq!(f.work_days_30, 3);
        assert_eq!(f.last_shifts.len(), 2);
        assert_eq!(f.last_shifts[0].shift_code, "MORNING");
        assert_eq!(f.last_shifts[0].ordinal, Some(0));
        assert_eq!(f.shift_rotation_priority, ROTATION_FORWARD_ONE);
    }

    #[test]
    fn test_shift_rotation_table() {
        let ex = extractor();
        let last = |code: &str| {
            vec![ShiftRecord {
                work_date: d(29),
                shift_code: code.to_string(),
                ordinal: ex.shift_ordinal(code),
            }]
        };
        assert_eq!(ex.shift_rotation_priority(&last("MORNING"), Some("morning")), 0.2);
        assert_eq!(ex.shift_rotation_priority(&last("MORNING"), Some("AFTERNOON")), 1.0);
        assert_eq!(ex.shift_rotation_priority(&last("MORNING"), Some("NIGHT")), 0.9);
        assert_eq!(ex.shift_rotation_priority(&last("NIGHT"), Some("MORNING")), 1.0);
        assert_eq!(ex.shift_rotation_priority(&last("AFTERNOON"), Some("MORNING")), 0.5);
        assert_eq!(ex.shift_rotation_priority(&last("NIGHT"), Some("AFTERNOON")), 0.5);
        assert_eq!(ex.shift_rotation_priority(&last("MORNING"), None), 0.5);
        assert_eq!(ex.shift_rotation_priority(&last("SPLIT"), Some("NIGHT")), 0.5);
    }

    #[test]
    fn test_locality_dedicated_and_priority_cap() {
        let w = worker(vec![membership("U2", "S1", true), membership("U7", "S3", false)]);
        let signals = WorkerSignals {
            overrides: vec![
                PriorityOverride {
                    override_id: "O1".to_string(),
                    worker_id: "W1".to_string(),
                    weight_multiplier: 2.0,
                    unit_scope: vec![],
                },
                PriorityOverride {
                    override_id: "O2".to_string(),
                    worker_id: "W1".to_string(),
                    weight_multiplier: 1.5,
                    unit_scope: vec!["U1".to_string()],
                },
                PriorityOverride {
                    override_id: "O3".to_string(),
                    worker_id: "W1".to_string(),
                    weight_multiplier: 9.0,
                    unit_scope: vec!["U5".to_string()],
                },
            ],
            ..WorkerSignals::default()
        };

        let f = extractor().extract(&request(None), &w, &signals);
        assert_eq!(f.locality_tier, LocalityTier::SameSection);
        assert!(f.dedicated_in_section);
        // 2.0 + 1.5 = 3.5 → 封顶 3.0；O3 不适用
        assert_eq!(f.priority_points, 3.0);
        assert!(f.has_priority_override());
    }
}
