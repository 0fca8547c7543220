// ==========================================
// 人员调配系统 - 性别配额选择
// ==========================================
// 算法:
// (a) 按排名取男性至 required_male
// (b) 按排名取女性至 required_female
// (c) 剩余名额按排名从未入选者中补足（不限性别）
// 红线: 配额不足必须显式报告，不得用其他性别凑数
// ==========================================

use crate::domain::candidate::ScoredCandidate;
use crate::domain::request::StaffingRequest;
use crate::domain::types::Gender;
use crate::engine::error::FulfillmentFailure;
use std::collections::HashSet;

// ==========================================
// Selection - 选择结果
// ==========================================
#[derive(Debug, Clone)]
pub struct Selection {
    /// 入选人员（保持排名顺序）
    pub selected: Vec<ScoredCandidate>,
    pub male_count: u32,
    pub female_count: u32,
    /// 不满足时的原因；None 表示可行
    pub infeasibility: Option<FulfillmentFailure>,
}

impl Selection {
    pub fn is_feasible(&self) -> bool {
        self.infeasibility.is_none()
    }

    pub fn worker_ids(&self) -> Vec<String> {
        self.selected.iter().map(|c| c.worker_id().to_string()).collect()
    }
}

// ==========================================
// GenderQuotaSelector - 配额选择器
// ==========================================
pub struct GenderQuotaSelector {
    // 无状态引擎
}

impl GenderQuotaSelector {
    pub fn new() -> Self {
        Self {}
    }

    /// 从已排序候选人中选择
    ///
    /// # 参数
    /// - `ranked`: PriorityTierSorter 输出（排名顺序）
    /// - `request`: 需求（总数与性别配额）
    pub fn select(&self, ranked: &[ScoredCandidate], request: &StaffingRequest) -> Selection {
        let total = request.required_total as usize;
        let mut chosen: HashSet<usize> = HashSet::new();

        // (a)(b) 性别配额
        for (gender, quota) in [
            (Gender::Male, request.required_male),
            (Gender::Female, request.required_female),
        ] {
            ranked
                .iter()
                .enumerate()
                .filter(|(_, c)| c.gender() == gender)
                .take(quota as usize)
                .for_each(|(idx, _)| {
                    chosen.insert(idx);
                });
        }

        // (c) 按排名补足
        for idx in 0..ranked.len() {
            if chosen.len() >= total {
                break;
            }
            chosen.insert(idx);
        }

        let selected: Vec<ScoredCandidate> = ranked
            .iter()
            .enumerate()
            .filter(|(idx, _)| chosen.contains(idx))
            .map(|(_, c)| c.clone())
            .collect();
        let male_count = count_gender(&selected, Gender::Male);
        let female_count = count_gender(&selected, Gender::Female);

        let infeasibility = Self::infeasibility(request, selected.len() as u32, male_count, female_count);

        Selection {
            selected,
            male_count,
            female_count,
            infeasibility,
        }
    }

    /// 判定配额是否满足（显式人选校验同样复用）
    ///
    /// 优先报告性别短缺（男性先于女性），其次报告总数短缺
    pub fn infeasibility(
        request: &StaffingRequest,
        selected: u32,
        male_count: u32,
        female_count: u32,
    ) -> Option<FulfillmentFailure> {
        if male_count < request.required_male {
            return Some(FulfillmentFailure::QuotaInfeasible {
                gender: Some(Gender::Male),
                required: request.required_male,
                found: male_count,
            });
        }
        if female_count < request.required_female {
            return Some(FulfillmentFailure::QuotaInfeasible {
                gender: Some(Gender::Female),
                required: request.required_female,
                found: female_count,
            });
        }
        if selected < request.required_total {
            return Some(FulfillmentFailure::QuotaInfeasible {
                gender: None,
                required: request.required_total,
                found: selected,
            });
        }
        None
    }
}

impl Default for GenderQuotaSelector {
    fn default() -> Self {
        Self::new()
    }
}

fn count_gender(selected: &[ScoredCandidate], gender: Gender) -> u32 {
    selected.iter().filter(|c| c.gender() == gender).count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::candidate::CandidateFeatures;
    use crate::domain::types::{EmploymentType, LocalityTier, RequestStatus, ScoreSource};
    use chrono::NaiveDate;

    fn request(total: u32, male: u32, female: u32) -> StaffingRequest {
        let ts = NaiveDate::from_ymd_opt(2026, 7, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        StaffingRequest {
            request_id: "R1".to_string(),
            unit_id: "U1".to_string(),
            section_id: "S1".to_string(),
            work_date: NaiveDate::from_ymd_opt(2026, 7, 2).unwrap(),
            shift_code: None,
            required_total: total,
            required_male: male,
            required_female: female,
            status: RequestStatus::Pending,
            fulfilled_by: None,
            fulfilled_at: None,
            created_at: ts,
            updated_at: ts,
        }
    }

    fn candidate(id: &str, gender: Gender) -> ScoredCandidate {
        ScoredCandidate {
            features: CandidateFeatures {
                worker_id: id.to_string(),
                gender,
                employment_type: EmploymentType::Permanent,
                workload_points: 5.0,
                qualification_points: 0.0,
                average_rating: 2.5,
                work_days_14: 0,
                work_days_30: 0,
                last_shifts: vec![],
                shift_rotation_priority: 0.8,
                locality_tier: LocalityTier::ExactUnit,
                dedicated_in_section: false,
                priority_points: 0.0,
            },
            base_score: 0.0,
            learned_score: 0.0,
            learned_source: ScoreSource::Fallback,
            priority_score: 0.0,
            final_score: 0.0,
            rank_score: 0.0,
        }
    }

    #[test]
    fn test_example_scenario_selects_a_d_c() {
        // 排序后: A(男,exact) D(女,exact) B(女,section) C(男,other)
        let ranked = vec![
            candidate("A", Gender::Male),
            candidate("D", Gender::Female),
            candidate("B", Gender::Female),
            candidate("C", Gender::Male),
        ];
        let sel = GenderQuotaSelector::new().select(&ranked, &request(3, 2, 1));
        assert!(sel.is_feasible());
        assert_eq!(sel.worker_ids(), vec!["A", "D", "C"]);
        assert_eq!(sel.male_count, 2);
        assert_eq!(sel.female_count, 1);
    }

    #[test]
    fn test_fill_remainder_by_rank() {
        let ranked = vec![
            candidate("F1", Gender::Female),
            candidate("F2", Gender::Female),
            candidate("M1", Gender::Male),
            candidate("F3", Gender::Female),
        ];
        let sel = GenderQuotaSelector::new().select(&ranked, &request(3, 1, 0));
        assert_eq!(sel.worker_ids(), vec!["F1", "F2", "M1"]);
        assert!(sel.is_feasible());
    }

    #[test]
    fn test_female_shortfall_is_reported_without_padding() {
        let ranked = vec![
            candidate("M1", Gender::Male),
            candidate("F1", Gender::Female),
            candidate("M2", Gender::Male),
            candidate("M3", Gender::Male),
        ];
        let sel = GenderQuotaSelector::new().select(&ranked, &request(4, 0, 3));
        // 仍然选满 4 人，但只有 1 名女性
        assert_eq!(sel.female_count, 1);
        assert_eq!(
            sel.infeasibility.map(|f| f.to_string()),
            Some("QUOTA_INFEASIBLE: insufficient female employees: required 3, found 1".to_string())
        );
    }

    #[test]
    fn test_small_pool_reports_total_shortfall() {
        let ranked = vec![candidate("M1", Gender::Male)];
        let sel = GenderQuotaSelector::new().select(&ranked, &request(2, 0, 0));
        assert_eq!(sel.selected.len(), 1);
        assert_eq!(
            sel.infeasibility,
            Some(FulfillmentFailure::QuotaInfeasible {
                gender: None,
                required: 2,
                found: 1
            })
        );
    }
}
