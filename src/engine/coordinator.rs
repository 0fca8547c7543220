// ==========================================
// 人员调配系统 - 批量调配协调器
// ==========================================
// 流程（逐需求，按调用方顺序）:
// 候选池(扣除本批已占用) → 特征提取 → 评分混合 → 层级排序 → 配额选择 → 提交 → 更新占用集合
// 红线: 单个需求失败不中断批次；只有输入非法才整体报错（在处理任何需求之前检出）
// 红线: 同一批次内同一人员至多出现在一个需求的调配中
// ==========================================

use crate::config::scoring_profile::ScoringProfile;
use crate::config::FulfillmentConfigReader;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::assignment::RevisionReceipt;
use crate::domain::request::StaffingRequest;
use crate::domain::types::{Gender, PoolScope, QuotaPolicy};
use crate::domain::worker::Worker;
use crate::engine::candidate_pool::{CandidatePool, CandidatePoolBuilder};
use crate::engine::committer::AssignmentCommitter;
use crate::engine::error::{FulfillmentError, FulfillmentFailure, FulfillmentResult};
use crate::engine::features::FeatureExtractor;
use crate::engine::outcome::{
    BatchFulfillmentResult, BatchPreview, ExplicitSelection, PreviewCandidate, PreviewSummary,
    RequestOutcome, RequestOutcomeStatus, RequestPreview, SlotOverride,
};
use crate::engine::priority::PriorityTierSorter;
use crate::engine::quota_selector::{GenderQuotaSelector, Selection};
use crate::engine::ranking_model::RankingModel;
use crate::engine::repositories::FulfillmentRepositories;
use crate::engine::scoring::ScoreBlender;
use crate::engine::strategy::FulfillmentStrategy;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// 预览中每个需求附带的后备人选条数
pub const PREVIEW_ALTERNATES: usize = 10;

/// 单个需求的计算结果（未提交）
struct RequestPlan {
    pool: CandidatePool,
    selection: Selection,
    ranked_len: usize,
    alternates: Vec<PreviewCandidate>,
}

// ==========================================
// BulkAssignmentCoordinator - 批量调配协调器
// ==========================================
pub struct BulkAssignmentCoordinator<C>
where
    C: FulfillmentConfigReader,
{
    config: Arc<C>,
    repos: FulfillmentRepositories,
    model: Arc<dyn RankingModel>,
    committer: AssignmentCommitter,
    pool_builder: CandidatePoolBuilder,
    selector: GenderQuotaSelector,
    pool_scope: PoolScope,
}

impl<C> BulkAssignmentCoordinator<C>
where
    C: FulfillmentConfigReader,
{
    /// 创建协调器
    ///
    /// # 参数
    /// - config: 配置读取器（每次运行开始时加载一次评分参数）
    /// - repos: 仓储集合
    /// - model: 排序模型（未训练时走兜底公式）
    pub fn new(config: Arc<C>, repos: FulfillmentRepositories, model: Arc<dyn RankingModel>) -> Self {
        Self {
            committer: AssignmentCommitter::new(repos.assignment_repo.clone()),
            config,
            repos,
            model,
            pool_builder: CandidatePoolBuilder::new(),
            selector: GenderQuotaSelector::new(),
            pool_scope: PoolScope::All,
        }
    }

    /// 设置候选池组织范围预过滤
    pub fn with_pool_scope(mut self, scope: PoolScope) -> Self {
        self.pool_scope = scope;
        self
    }

    pub fn pool_scope(&self) -> PoolScope {
        self.pool_scope
    }

    // ==========================================
    // 对外入口
    // ==========================================

    /// 单需求调配
    ///
    /// # 返回
    /// - Ok(RequestOutcome): 满足或失败（失败原因在 outcome.failure）
    /// - Err: 需求不存在/配额定义非法/配置读取失败
    #[instrument(skip(self), fields(strategy = %strategy))]
    pub async fn fulfill_one(
        &self,
        request_id: &str,
        strategy: FulfillmentStrategy,
        actor: &str,
    ) -> FulfillmentResult<RequestOutcome> {
        let profile = self.load_profile().await?;
        let mut requests = self.load_requests(&[request_id.to_string()])?;
        let request = requests.pop().ok_or_else(|| FulfillmentError::NotFound {
            entity: "StaffingRequest".to_string(),
            id: request_id.to_string(),
        })?;

        let mut excluded = HashSet::new();
        Ok(self.process_request(&request, strategy, &profile, actor, &mut excluded))
    }

    /// 批量调配
    #[instrument(skip(self, request_ids), fields(strategy = %strategy, requests_count = request_ids.len()))]
    pub async fn bulk_fulfill(
        &self,
        request_ids: &[String],
        strategy: FulfillmentStrategy,
        actor: &str,
    ) -> FulfillmentResult<BatchFulfillmentResult> {
        let profile = self.load_profile().await?;
        let requests = self.load_requests(request_ids)?;

        info!(requests_count = requests.len(), "开始批量调配");

        let mut excluded: HashSet<String> = HashSet::new();
        let outcomes: Vec<RequestOutcome> = requests
            .iter()
            .map(|r| self.process_request(r, strategy, &profile, actor, &mut excluded))
            .collect();

        let result = BatchFulfillmentResult::from_outcomes(outcomes, profile.batch_error_cap);
        self.log_batch(actor, "auto", Some(strategy), &result);

        info!(
            fulfilled = result.fulfilled_count,
            failed = result.failed_count,
            claimed_workers = excluded.len(),
            "批量调配完成"
        );
        Ok(result)
    }

    /// 批量预览（不提交）
    ///
    /// 与 bulk_fulfill 使用相同的占用集合规则：会被提交的需求，其入选人员对后续需求不可见
    #[instrument(skip(self, request_ids), fields(strategy = %strategy, requests_count = request_ids.len()))]
    pub async fn preview_bulk(
        &self,
        request_ids: &[String],
        strategy: FulfillmentStrategy,
    ) -> FulfillmentResult<BatchPreview> {
        let profile = self.load_profile().await?;
        let requests = self.load_requests(request_ids)?;

        let mut excluded: HashSet<String> = HashSet::new();
        let mut previews = Vec::with_capacity(requests.len());

        for request in &requests {
            let preview = match self.plan_request(request, strategy, &profile, &excluded) {
                Ok(plan) => {
                    let decision = Self::decide(request, &plan, &profile);
                    if let Ok((ids, _)) = &decision {
                        excluded.extend(ids.iter().cloned());
                    }
                    Self::build_preview(request, plan, decision)
                }
                Err(failure) => Self::empty_preview(request, failure),
            };
            previews.push(preview);
        }

        let summary = Self::summarize(&previews);
        info!(
            committable = summary.committable_count,
            blocked = summary.blocked_count,
            total_workers = summary.total_workers,
            "批量预览完成"
        );

        Ok(BatchPreview {
            strategy,
            requests: previews,
            summary,
        })
    }

    /// 人工改派：把逐槽位修改应用到预览结果，得到显式人选
    ///
    /// # 规则
    /// - request_id 必须在预览中
    /// - slot < required_total；slot 等于当前人数时追加
    pub fn apply_slot_overrides(
        preview: &BatchPreview,
        overrides: &[SlotOverride],
    ) -> FulfillmentResult<Vec<ExplicitSelection>> {
        let mut selections: Vec<ExplicitSelection> = preview
            .requests
            .iter()
            .map(|r| ExplicitSelection {
                request_id: r.request_id.clone(),
                worker_ids: r.selected_worker_ids(),
            })
            .collect();
        let index: HashMap<&str, usize> = preview
            .requests
            .iter()
            .enumerate()
            .map(|(i, r)| (r.request_id.as_str(), i))
            .collect();

        for o in overrides {
            let idx = *index.get(o.request_id.as_str()).ok_or_else(|| {
                FulfillmentError::InvalidInput(format!(
                    "slot override references request {} which is not in the preview",
                    o.request_id
                ))
            })?;
            let required_total = preview.requests[idx].required_total as usize;
            if o.slot >= required_total {
                return Err(FulfillmentError::InvalidInput(format!(
                    "request {} has {} slot(s); slot {} is out of range",
                    o.request_id, required_total, o.slot
                )));
            }

            let ids = &mut selections[idx].worker_ids;
            if o.slot < ids.len() {
                ids[o.slot] = o.worker_id.clone();
            } else if o.slot == ids.len() {
                ids.push(o.worker_id.clone());
            } else {
                return Err(FulfillmentError::InvalidInput(format!(
                    "request {}: slot {} skips open slot {}",
                    o.request_id,
                    o.slot,
                    ids.len()
                )));
            }
        }

        debug!(overrides = overrides.len(), "人工改派已应用");
        Ok(selections)
    }

    /// 按显式人选提交
    ///
    /// # 硬错误（任何提交之前检出）
    /// - 需求不存在/重复/配额定义非法
    /// - 同一人员出现在多个人选中
    /// - 人选数量超过 required_total
    ///
    /// # 逐需求失败
    /// - 人员不可调配 → StructuralIneligibility
    /// - 人数/性别不足 → QuotaInfeasible（WarnAndProceed 时仅告警）
    /// - 提交复核失败 → CommitConflict
    #[instrument(skip(self, selections), fields(selections_count = selections.len()))]
    pub async fn commit_selections(
        &self,
        selections: &[ExplicitSelection],
        actor: &str,
    ) -> FulfillmentResult<BatchFulfillmentResult> {
        let profile = self.load_profile().await?;
        let ids: Vec<String> = selections.iter().map(|s| s.request_id.clone()).collect();
        let requests = self.load_requests(&ids)?;

        let mut seen_workers: HashSet<&str> = HashSet::new();
        for (selection, request) in selections.iter().zip(requests.iter()) {
            if selection.worker_ids.len() > request.required_total as usize {
                return Err(FulfillmentError::InvalidInput(format!(
                    "request {} requires {} worker(s) but {} were selected",
                    request.request_id,
                    request.required_total,
                    selection.worker_ids.len()
                )));
            }
            for w in &selection.worker_ids {
                if !seen_workers.insert(w.as_str()) {
                    return Err(FulfillmentError::InvalidInput(format!(
                        "worker {} is selected more than once",
                        w
                    )));
                }
            }
        }

        let mut excluded: HashSet<String> = HashSet::new();
        let outcomes: Vec<RequestOutcome> = selections
            .iter()
            .zip(requests.iter())
            .map(|(selection, request)| {
                self.commit_explicit(request, &selection.worker_ids, &profile, actor, &mut excluded)
            })
            .collect();

        let result = BatchFulfillmentResult::from_outcomes(outcomes, profile.batch_error_cap);
        self.log_batch(actor, "explicit", None, &result);

        info!(
            fulfilled = result.fulfilled_count,
            failed = result.failed_count,
            "显式人选提交完成"
        );
        Ok(result)
    }

    /// 需求修订
    pub async fn request_revision(
        &self,
        request_id: &str,
        actor: &str,
    ) -> FulfillmentResult<RevisionReceipt> {
        self.committer.revise(request_id, actor)
    }

    // ==========================================
    // 单需求处理
    // ==========================================

    /// 计算 + 提交单个需求；成功后把入选人员加入占用集合
    fn process_request(
        &self,
        request: &StaffingRequest,
        strategy: FulfillmentStrategy,
        profile: &ScoringProfile,
        actor: &str,
        excluded: &mut HashSet<String>,
    ) -> RequestOutcome {
        let plan = match self.plan_request(request, strategy, profile, excluded) {
            Ok(p) => p,
            Err(failure) => return Self::fail(request, failure),
        };
        let (worker_ids, warnings) = match Self::decide(request, &plan, profile) {
            Ok(d) => d,
            Err(failure) => return Self::fail(request, failure),
        };

        let context = json!({
            "mode": "auto",
            "strategy": strategy.as_str(),
            "candidates": plan.ranked_len,
            "warnings": warnings,
        });
        match self.committer.commit(request, &worker_ids, actor, context) {
            Ok(receipt) => {
                excluded.extend(worker_ids.iter().cloned());
                info!(
                    request_id = %request.request_id,
                    assigned = worker_ids.len(),
                    male = plan.selection.male_count,
                    female = plan.selection.female_count,
                    "需求已满足"
                );
                RequestOutcome {
                    request_id: request.request_id.clone(),
                    status: RequestOutcomeStatus::Fulfilled,
                    assigned_worker_ids: worker_ids,
                    male_count: plan.selection.male_count,
                    female_count: plan.selection.female_count,
                    warnings,
                    failure: None,
                    restored_worker_ids: receipt.restored_worker_ids,
                }
            }
            Err(failure) => Self::fail(request, failure),
        }
    }

    /// 执行 候选池 → 特征 → 评分 → 排序 → 选择
    fn plan_request(
        &self,
        request: &StaffingRequest,
        strategy: FulfillmentStrategy,
        profile: &ScoringProfile,
        excluded: &HashSet<String>,
    ) -> Result<RequestPlan, FulfillmentFailure> {
        let pool = self.build_pool(request, excluded)?;
        let names: HashMap<&str, &str> = pool
            .eligible
            .iter()
            .map(|w| (w.worker_id.as_str(), w.display_name.as_str()))
            .collect();

        let ids: Vec<String> = pool.eligible.iter().map(|w| w.worker_id.clone()).collect();
        let signals = self
            .repos
            .signal_repo
            .load_signals(&ids, request.work_date)
            .map_err(FulfillmentFailure::from)?;

        let features =
            FeatureExtractor::new(profile.features.clone()).extract_all(request, &pool.eligible, &signals);
        let scored = ScoreBlender::new(profile).score_all(features, self.model.as_ref());
        let ranked = PriorityTierSorter::new(profile.tuning).sort(scored, request, strategy);
        let selection = self.selector.select(&ranked, request);

        let chosen: HashSet<&str> = selection.selected.iter().map(|c| c.worker_id()).collect();
        let alternates: Vec<PreviewCandidate> = ranked
            .iter()
            .filter(|c| !chosen.contains(c.worker_id()))
            .take(PREVIEW_ALTERNATES)
            .map(|c| PreviewCandidate::from_scored(c, names.get(c.worker_id()).copied().unwrap_or("")))
            .collect();

        debug!(
            request_id = %request.request_id,
            candidates_count = ranked.len(),
            selected = selection.selected.len(),
            feasible = selection.is_feasible(),
            "需求计算完成"
        );

        Ok(RequestPlan {
            ranked_len: ranked.len(),
            pool,
            selection,
            alternates,
        })
    }

    fn build_pool(
        &self,
        request: &StaffingRequest,
        excluded: &HashSet<String>,
    ) -> Result<CandidatePool, FulfillmentFailure> {
        let workers: Vec<Worker> = self
            .repos
            .worker_repo
            .list_all()
            .map_err(FulfillmentFailure::from)?;
        let same_date = self
            .repos
            .assignment_repo
            .find_by_date(request.work_date)
            .map_err(FulfillmentFailure::from)?;
        Ok(self
            .pool_builder
            .build(request, &workers, &same_date, excluded, self.pool_scope))
    }

    /// 根据选择结果与配额策略决定是否提交
    ///
    /// # 返回
    /// - Ok((入选人员, 告警))
    /// - Err: 候选池为空 → StructuralIneligibility；配额不足且策略为 Reject → QuotaInfeasible
    fn decide(
        request: &StaffingRequest,
        plan: &RequestPlan,
        profile: &ScoringProfile,
    ) -> Result<(Vec<String>, Vec<String>), FulfillmentFailure> {
        if plan.selection.selected.is_empty() {
            return Err(FulfillmentFailure::StructuralIneligibility {
                reason: format!(
                    "no eligible candidates for request {} ({} worker(s) rejected)",
                    request.request_id,
                    plan.pool.rejected.len()
                ),
            });
        }

        let mut warnings = Vec::new();
        if let Some(infeasible) = &plan.selection.infeasibility {
            match profile.quota_policy {
                QuotaPolicy::Reject => return Err(infeasible.clone()),
                QuotaPolicy::WarnAndProceed => {
                    warn!(request_id = %request.request_id, reason = %infeasible, "配额不足，按策略继续提交");
                    warnings.push(infeasible.to_string());
                }
            }
        }
        Ok((plan.selection.worker_ids(), warnings))
    }

    /// 显式人选的校验与提交
    fn commit_explicit(
        &self,
        request: &StaffingRequest,
        worker_ids: &[String],
        profile: &ScoringProfile,
        actor: &str,
        excluded: &mut HashSet<String>,
    ) -> RequestOutcome {
        if worker_ids.is_empty() {
            return Self::fail(
                request,
                FulfillmentFailure::StructuralIneligibility {
                    reason: format!("no workers selected for request {}", request.request_id),
                },
            );
        }

        let pool = match self.build_pool(request, excluded) {
            Ok(p) => p,
            Err(failure) => return Self::fail(request, failure),
        };

        let mut male_count = 0;
        let mut female_count = 0;
        for worker_id in worker_ids {
            match pool.find(worker_id) {
                Some(w) => match w.gender {
                    Gender::Male => male_count += 1,
                    Gender::Female => female_count += 1,
                },
                None => {
                    let reason = match pool.rejection_for(worker_id) {
                        Some(r) => format!("worker {} is not eligible: {}", worker_id, r),
                        None => format!("worker {} does not exist", worker_id),
                    };
                    return Self::fail(request, FulfillmentFailure::StructuralIneligibility { reason });
                }
            }
        }

        let mut warnings = Vec::new();
        if let Some(infeasible) = GenderQuotaSelector::infeasibility(
            request,
            worker_ids.len() as u32,
            male_count,
            female_count,
        ) {
            match profile.quota_policy {
                QuotaPolicy::Reject => return Self::fail(request, infeasible),
                QuotaPolicy::WarnAndProceed => warnings.push(infeasible.to_string()),
            }
        }

        let context = json!({ "mode": "explicit", "warnings": warnings });
        match self.committer.commit(request, worker_ids, actor, context) {
            Ok(receipt) => {
                excluded.extend(worker_ids.iter().cloned());
                RequestOutcome {
                    request_id: request.request_id.clone(),
                    status: RequestOutcomeStatus::Fulfilled,
                    assigned_worker_ids: worker_ids.to_vec(),
                    male_count,
                    female_count,
                    warnings,
                    failure: None,
                    restored_worker_ids: receipt.restored_worker_ids,
                }
            }
            Err(failure) => Self::fail(request, failure),
        }
    }

    fn fail(request: &StaffingRequest, failure: FulfillmentFailure) -> RequestOutcome {
        warn!(request_id = %request.request_id, reason = %failure, "需求未满足");
        RequestOutcome::failed(&request.request_id, failure)
    }

    // ==========================================
    // 加载与校验
    // ==========================================

    async fn load_profile(&self) -> FulfillmentResult<ScoringProfile> {
        let profile = self
            .config
            .load_scoring_profile()
            .await
            .map_err(|e| FulfillmentError::Config(e.to_string()))?;
        debug!(
            quota_policy = ?profile.quota_policy,
            model_trained = self.model.is_model_trained(),
            "评分参数已加载"
        );
        Ok(profile)
    }

    /// 加载并校验需求（保持调用方顺序）
    fn load_requests(&self, request_ids: &[String]) -> FulfillmentResult<Vec<StaffingRequest>> {
        let mut seen = HashSet::new();
        for id in request_ids {
            if !seen.insert(id.as_str()) {
                return Err(FulfillmentError::InvalidInput(format!(
                    "duplicate request id {}",
                    id
                )));
            }
        }

        let mut found = self.repos.request_repo.find_by_ids(request_ids)?;
        let mut requests = Vec::with_capacity(request_ids.len());
        for id in request_ids {
            let request = found.remove(id).ok_or_else(|| FulfillmentError::NotFound {
                entity: "StaffingRequest".to_string(),
                id: id.clone(),
            })?;
            request.validate_quota().map_err(FulfillmentError::InvalidInput)?;
            requests.push(request);
        }
        Ok(requests)
    }

    /// 批次审计日志（失败只告警）
    fn log_batch(
        &self,
        actor: &str,
        mode: &str,
        strategy: Option<FulfillmentStrategy>,
        result: &BatchFulfillmentResult,
    ) {
        let log = ActionLog::new(
            ActionType::BulkFulfill,
            actor,
            None,
            Some(json!({
                "mode": mode,
                "strategy": strategy.map(|s| s.as_str()),
                "per_request_status": result.per_request_status,
                "fulfilled_count": result.fulfilled_count,
                "failed_count": result.failed_count,
            })),
            Some(format!(
                "batch {}: {} fulfilled, {} failed",
                mode, result.fulfilled_count, result.failed_count
            )),
        );
        if let Err(e) = self.repos.action_log_repo.insert(&log) {
            warn!(error = %e, "批次日志写入失败");
        }
    }

    // ==========================================
    // 预览组装
    // ==========================================

    fn build_preview(
        request: &StaffingRequest,
        plan: RequestPlan,
        decision: Result<(Vec<String>, Vec<String>), FulfillmentFailure>,
    ) -> RequestPreview {
        let names: HashMap<&str, &str> = plan
            .pool
            .eligible
            .iter()
            .map(|w| (w.worker_id.as_str(), w.display_name.as_str()))
            .collect();
        let selected = plan
            .selection
            .selected
            .iter()
            .map(|c| PreviewCandidate::from_scored(c, names.get(c.worker_id()).copied().unwrap_or("")))
            .collect();
        let (would_commit, failure, warnings) = match decision {
            Ok((_, warnings)) => (true, None, warnings),
            Err(f) => (false, Some(f), Vec::new()),
        };

        let mut rejected_counts: BTreeMap<String, usize> = BTreeMap::new();
        for r in &plan.pool.rejected {
            *rejected_counts.entry(r.reason.code().to_string()).or_insert(0) += 1;
        }

        RequestPreview {
            selected,
            alternates: plan.alternates,
            male_count: plan.selection.male_count,
            female_count: plan.selection.female_count,
            would_commit,
            failure,
            warnings,
            rejected_counts,
            rejected: plan.pool.rejected,
            ..Self::empty_preview_shell(request)
        }
    }

    fn empty_preview(request: &StaffingRequest, failure: FulfillmentFailure) -> RequestPreview {
        RequestPreview {
            failure: Some(failure),
            ..Self::empty_preview_shell(request)
        }
    }

    fn empty_preview_shell(request: &StaffingRequest) -> RequestPreview {
        RequestPreview {
            request_id: request.request_id.clone(),
            unit_id: request.unit_id.clone(),
            section_id: request.section_id.clone(),
            work_date: request.work_date,
            shift_code: request.shift_code.clone(),
            required_total: request.required_total,
            required_male: request.required_male,
            required_female: request.required_female,
            selected: Vec::new(),
            alternates: Vec::new(),
            male_count: 0,
            female_count: 0,
            would_commit: false,
            failure: None,
            warnings: Vec::new(),
            rejected_counts: BTreeMap::new(),
            rejected: Vec::new(),
        }
    }

    /// 汇总: 只统计会被提交的需求的人员
    fn summarize(previews: &[RequestPreview]) -> PreviewSummary {
        let committable: Vec<&RequestPreview> = previews.iter().filter(|p| p.would_commit).collect();
        let units: BTreeSet<String> = committable.iter().map(|p| p.unit_id.clone()).collect();

        PreviewSummary {
            request_count: previews.len(),
            committable_count: committable.len(),
            blocked_count: previews.len() - committable.len(),
            total_workers: committable.iter().map(|p| p.selected.len()).sum(),
            male_workers: committable.iter().map(|p| p.male_count as usize).sum(),
            female_workers: committable.iter().map(|p| p.female_count as usize).sum(),
            unique_units: units.into_iter().collect(),
        }
    }
}
