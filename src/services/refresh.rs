// ==========================================
// 物资预测对账引擎 - 刷新服务
// ==========================================
// 职责: 从外部数据源整体重建引擎状态并原子发布
// 流程: 领票 → 并发拉取 (预测记录 + 项目目录) → 转换/建索引 → 发布
// ==========================================
// 规则:
// - 非法月份的源记录跳过并告警,不中断刷新
// - 拉取失败时不发布,保留旧状态
// - 过期的刷新结果丢弃 (见 EngineStateHandle::publish)
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::forecast::{ForecastRecord, RawForecastRecord};
use crate::domain::project::ProjectRef;
use crate::engine::store::{ForecastStore, IndexStats};
use crate::perf::PerfGuard;
use crate::services::source::{ForecastSource, ProjectDirectory, SourceError};
use crate::services::state::{EngineState, EngineStateHandle, StateLockError};

/// 源记录被跳过的原因
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub project_id: String,
    pub forecast_month: String,
    pub reason: String,
}

/// 刷新报告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshReport {
    pub refresh_id: String,
    pub generation: u64,
    pub published: bool, // false = 结果已过期被丢弃
    pub source_records: usize,
    pub skipped: Vec<SkippedRecord>,
    pub index: IndexStats,
    pub projects: usize,
}

/// 刷新错误
#[derive(thiserror::Error, Debug)]
pub enum RefreshError {
    #[error("刷新拉取失败: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    State(#[from] StateLockError),
}

/// 将源记录转换为引擎状态
///
/// # 返回
/// (未发布的新状态, 被跳过的源记录)
pub fn build_state(
    raw_records: Vec<RawForecastRecord>,
    projects: Vec<ProjectRef>,
) -> (EngineState, Vec<SkippedRecord>) {
    let mut skipped = Vec::new();
    let mut records: Vec<ForecastRecord> = Vec::with_capacity(raw_records.len());

    for raw in raw_records {
        let project_id = raw.project_id.clone();
        let forecast_month = raw.forecast_month.clone();
        match ForecastRecord::try_from(raw) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(
                    project_id = %project_id,
                    forecast_month = %forecast_month,
                    error = %e,
                    "源记录月份非法,跳过"
                );
                skipped.push(SkippedRecord {
                    project_id,
                    forecast_month,
                    reason: e.to_string(),
                });
            }
        }
    }

    let store = ForecastStore::index(records);
    (EngineState::new(store, projects), skipped)
}

// ==========================================
// RefreshService - 刷新服务
// ==========================================
pub struct RefreshService {
    source: Arc<dyn ForecastSource>,
    directory: Arc<dyn ProjectDirectory>,
    handle: Arc<EngineStateHandle>,
}

impl RefreshService {
    pub fn new(
        source: Arc<dyn ForecastSource>,
        directory: Arc<dyn ProjectDirectory>,
        handle: Arc<EngineStateHandle>,
    ) -> Self {
        Self {
            source,
            directory,
            handle,
        }
    }

    /// 执行一次完整刷新
    pub async fn refresh(&self) -> Result<RefreshReport, RefreshError> {
        let ticket = self.handle.begin_refresh();

        let (raw_records, projects) =
            futures::try_join!(self.source.fetch_records(), self.directory.list_projects())
                .map_err(|e| {
                    warn!(
                        refresh_id = %ticket.refresh_id,
                        error = %e,
                        "刷新拉取失败,保留旧状态"
                    );
                    e
                })?;

        let source_records = raw_records.len();
        let project_count = projects.len();

        // 只统计同步段: 建索引 + 发布
        let (skipped, index, published) = {
            let _perf = PerfGuard::new("refresh_build");
            let (state, skipped) = build_state(raw_records, projects);
            let index = state.store.stats();
            let published = self.handle.publish(&ticket, state)?;
            (skipped, index, published)
        };

        info!(
            refresh_id = %ticket.refresh_id,
            source_records,
            indexed = index.indexed_records,
            excluded_empty = index.excluded_empty,
            skipped = skipped.len(),
            published,
            "刷新完成"
        );

        Ok(RefreshReport {
            refresh_id: ticket.refresh_id,
            generation: ticket.generation,
            published,
            source_records,
            skipped,
            index,
            projects: project_count,
        })
    }
}
