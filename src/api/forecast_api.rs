// ==========================================
// 物资预测对账引擎 - 预测对账 API
// ==========================================
// 职责: 嵌入层调用的门面
// - 刷新 (外部数据源 → 原子发布新状态)
// - 单项目视图 (当前月份解析 + 对账指标 + 可浏览月份)
// - 登记新预测 (仅创建,重复月份报冲突)
// - 录入实际值 (预演 → 外部落库 → 提交到当前状态,串行执行)
// - 驾驶舱聚合 (趋势/状态计数/重点物资/整体准确度)
// ==========================================
// 架构: API 层 → Engine 层 (纯计算) + Services 层 (I/O 与状态)
// ==========================================

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::api::dto::{ActualsReceipt, DashboardSummary, ProjectForecastView};
use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::config::reconcile_config::ReconcileConfig;
use crate::domain::forecast::{ForecastRecord, MaterialQuantities};
use crate::domain::metrics::{
    AccuracySummary, MaterialEstimate, ResolvedMetrics, StatusCounts, TrendPoint,
};
use crate::domain::period::{Clock, PeriodKey, SharedClock};
use crate::engine::{
    ActualsMerger, AggregationEngine, ForecastError, MaterialProjection, MetricsCalculator,
    PeriodResolver,
};
use crate::perf::PerfGuard;
use crate::services::refresh::{RefreshReport, RefreshService};
use crate::services::source::{ActualsSink, ForecastSource, ProjectDirectory};
use crate::services::state::{EngineState, EngineStateHandle};

// ==========================================
// ForecastApi - 预测对账 API
// ==========================================
pub struct ForecastApi {
    handle: Arc<EngineStateHandle>,
    refresher: RefreshService,
    sink: Arc<dyn ActualsSink>,
    clock: SharedClock,
    config: ReconcileConfig,
    resolver: PeriodResolver,
    merger: ActualsMerger,
    metrics: MetricsCalculator,
    aggregation: AggregationEngine,
    // 实际值录入串行化: 预演 → 落库 → 提交 在同一把锁内完成
    actuals_gate: Mutex<()>,
}

impl ForecastApi {
    /// 创建新的 ForecastApi 实例
    ///
    /// # 参数
    /// - source: 预测数据源
    /// - sink: 实际值落库
    /// - directory: 项目目录
    /// - clock: 时间源 (决定"当前月份")
    /// - config: 对账配置
    pub fn new(
        source: Arc<dyn ForecastSource>,
        sink: Arc<dyn ActualsSink>,
        directory: Arc<dyn ProjectDirectory>,
        clock: SharedClock,
        config: ReconcileConfig,
    ) -> Self {
        let handle = Arc::new(EngineStateHandle::default());
        Self {
            refresher: RefreshService::new(source, directory, Arc::clone(&handle)),
            handle,
            sink,
            resolver: PeriodResolver::new(Arc::clone(&clock)),
            merger: ActualsMerger::new(Arc::clone(&clock)),
            metrics: MetricsCalculator::from_config(&config),
            aggregation: AggregationEngine::from_config(&config),
            actuals_gate: Mutex::new(()),
            clock,
            config,
        }
    }

    /// 从配置库加载配置后创建
    pub fn from_config_manager(
        source: Arc<dyn ForecastSource>,
        sink: Arc<dyn ActualsSink>,
        directory: Arc<dyn ProjectDirectory>,
        clock: SharedClock,
        manager: &ConfigManager,
    ) -> ApiResult<Self> {
        let config = manager.load_reconcile_config()?;
        Ok(Self::new(source, sink, directory, clock, config))
    }

    /// 替换重点物资投影 (如接入真实的分物资预测)
    pub fn with_material_projection(mut self, projection: Box<dyn MaterialProjection>) -> Self {
        self.aggregation = AggregationEngine::new(&self.config, projection);
        self
    }

    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// 当前状态快照
    pub fn snapshot(&self) -> ApiResult<Arc<EngineState>> {
        Ok(self.handle.snapshot()?)
    }

    /// 状态句柄 (供嵌入层自行编排刷新)
    pub fn state_handle(&self) -> Arc<EngineStateHandle> {
        Arc::clone(&self.handle)
    }

    // ==========================================
    // 刷新
    // ==========================================

    /// 从外部数据源整体重建
    ///
    /// 并发触发时,较早的刷新若晚于较新的刷新完成,其结果被丢弃
    /// (report.published = false)
    pub async fn refresh(&self) -> ApiResult<RefreshReport> {
        Ok(self.refresher.refresh().await?)
    }

    // ==========================================
    // 单项目视图
    // ==========================================

    /// 项目当前视图 (当月优先,否则最近月份)
    ///
    /// # 返回
    /// - Ok(None): 项目没有任何有效预测
    pub fn project_view(&self, project_id: &str) -> ApiResult<Option<ProjectForecastView>> {
        let state = self.handle.snapshot()?;
        let view = self
            .resolver
            .resolve_active(&state.store, project_id)
            .map(|record| self.build_view(&state, record));
        Ok(view)
    }

    /// 浏览指定月份 (纯查询,不重新解析)
    ///
    /// # 参数
    /// - period: YYYY-MM
    pub fn period_view(&self, project_id: &str, period: &str) -> ApiResult<ProjectForecastView> {
        let period = PeriodKey::parse(period)?;
        let state = self.handle.snapshot()?;
        let record = self
            .resolver
            .select_period(&state.store, project_id, period)
            .ok_or_else(|| {
                ApiError::NotFound(format!(
                    "预测记录(project_id={}, period={})不存在",
                    project_id, period
                ))
            })?;
        Ok(self.build_view(&state, record))
    }

    /// 项目可浏览月份 (降序)
    pub fn available_periods(&self, project_id: &str) -> ApiResult<Vec<PeriodKey>> {
        let state = self.handle.snapshot()?;
        Ok(self.resolver.available_periods(&state.store, project_id))
    }

    /// 全部项目的当前视图 (按 project_id 升序)
    pub fn active_views(&self) -> ApiResult<Vec<ProjectForecastView>> {
        let state = self.handle.snapshot()?;
        Ok(self
            .resolver
            .resolve_all(&state.store)
            .into_iter()
            .map(|record| self.build_view(&state, record))
            .collect())
    }

    /// 直接计算对账指标
    pub fn compute_metrics(
        &self,
        predictions: &MaterialQuantities,
        actuals: &MaterialQuantities,
    ) -> ResolvedMetrics {
        self.metrics.compute(predictions, actuals)
    }

    fn build_view(&self, state: &EngineState, record: &ForecastRecord) -> ProjectForecastView {
        ProjectForecastView {
            project_id: record.project_id.clone(),
            period: record.period,
            period_label: record.period.label(),
            is_current_period: record.period == self.resolver.current_period(),
            record: record.clone(),
            metrics: self.metrics.compute_record(record),
            available_periods: self
                .resolver
                .available_periods(&state.store, &record.project_id),
        }
    }

    // ==========================================
    // 写入: 登记预测 / 录入实际值
    // ==========================================

    /// 登记上游新生成的预测 (仅创建)
    ///
    /// # 返回
    /// - Err(Conflict): 该月份已有预测
    /// - Err(InvalidInput): 月份非法或 predictions 为空
    pub fn register_forecast(
        &self,
        project_id: &str,
        period: &str,
        predictions: MaterialQuantities,
    ) -> ApiResult<ForecastRecord> {
        let period = PeriodKey::parse(period)?;
        let mut record = ForecastRecord::new(project_id, period, predictions);
        record.created_at = Some(self.clock.now());

        let record = self
            .handle
            .update(|state| -> ApiResult<ForecastRecord> {
                let stored = state.store.upsert(record)?;
                Ok(stored.clone())
            })?;

        info!(
            project_id,
            period = %period,
            materials = record.predictions.len(),
            total_forecast = record.total_forecast(),
            "登记新预测"
        );
        Ok(record)
    }

    /// 录入实际值
    ///
    /// # 参数
    /// - period: None 时使用项目当前解析出的月份
    ///
    /// # 流程 (多次录入串行执行)
    /// 1. 在当前快照上预演合并 (校验预测存在)
    /// 2. 交给 ActualsSink 落库
    /// 3. 落库成功后把预演结果提交到当前状态
    ///
    /// # 返回
    /// - Err(PreconditionFailed): 该月份没有预测
    /// - Err(Upstream): 落库失败,当前状态不变
    pub async fn record_actuals(
        &self,
        project_id: &str,
        period: Option<&str>,
        values: &MaterialQuantities,
    ) -> ApiResult<ActualsReceipt> {
        let _gate = self.actuals_gate.lock().await;

        let merged = {
            let state = self.handle.snapshot()?;
            let period = match period {
                Some(raw) => PeriodKey::parse(raw)?,
                None => self
                    .resolver
                    .resolve_active(&state.store, project_id)
                    .map(|record| record.period)
                    .ok_or_else(|| ForecastError::NoSuchForecast {
                        project_id: project_id.to_string(),
                        period: self.resolver.current_period(),
                    })?,
            };
            self.merger.preview(&state.store, project_id, period, values)?
        };

        self.sink.persist_actuals(&merged).await?;

        let record = self
            .handle
            .update(|state| -> ApiResult<ForecastRecord> {
                Ok(self.merger.commit(&mut state.store, merged)?)
            })?;

        Ok(ActualsReceipt {
            metrics: self.metrics.compute_record(&record),
            record,
        })
    }

    // ==========================================
    // 驾驶舱聚合
    // ==========================================

    /// 月度趋势
    pub fn monthly_trend(&self, project_id: Option<&str>) -> ApiResult<Vec<TrendPoint>> {
        let state = self.handle.snapshot()?;
        Ok(self
            .aggregation
            .monthly_trend(&state.store, project_id))
    }

    /// 项目状态计数
    pub fn status_counts(&self) -> ApiResult<StatusCounts> {
        let state = self.handle.snapshot()?;
        Ok(self.aggregation.status_counts(&state.projects))
    }

    /// 重点物资 (展示用启发式)
    pub fn top_materials(&self, n: Option<usize>) -> ApiResult<Vec<MaterialEstimate>> {
        let state = self.handle.snapshot()?;
        Ok(self.aggregation.top_materials(&state.store, n))
    }

    /// 整体预测准确度
    pub fn overall_accuracy(&self) -> ApiResult<AccuracySummary> {
        let state = self.handle.snapshot()?;
        Ok(self.aggregation.overall_accuracy(&state.store))
    }

    /// 驾驶舱汇总 (同一快照上计算,各项口径一致)
    pub fn dashboard(&self) -> ApiResult<DashboardSummary> {
        let _perf = PerfGuard::new("dashboard");
        let state = self.handle.snapshot()?;

        Ok(DashboardSummary {
            generated_at: self.clock.now(),
            state_generation: state.generation,
            monthly_trend: self.aggregation.monthly_trend(&state.store, None),
            status_counts: self.aggregation.status_counts(&state.projects),
            top_materials: self.aggregation.top_materials(&state.store, None),
            accuracy: self.aggregation.overall_accuracy(&state.store),
        })
    }
}
