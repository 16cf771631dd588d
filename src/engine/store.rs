// ==========================================
// 物资预测对账引擎 - 预测记录索引 (Forecast Store)
// ==========================================
// 职责: 以 (project_id, period) 为键索引外部数据源提供的预测记录
// 红线: 每个 (project_id, period) 至多一条记录
// 红线: predictions 为空的记录在建索引时剔除 (不是错误)
// ==========================================
// 刷新策略: 每次刷新整体重建,不做增量 diff
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::domain::forecast::ForecastRecord;
use crate::domain::period::PeriodKey;
use crate::engine::error::{EngineResult, ForecastError};

/// 建索引统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub input_records: usize,       // 输入条数
    pub indexed_records: usize,     // 入索引条数
    pub excluded_empty: usize,      // predictions 为空被剔除
    pub duplicates_replaced: usize, // 同键重复 (后者覆盖前者)
}

// ==========================================
// ForecastStore - 预测记录索引
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ForecastStore {
    // project_id -> (period -> record)
    by_project: HashMap<String, BTreeMap<PeriodKey, ForecastRecord>>,
    stats: IndexStats,
}

impl ForecastStore {
    /// 空索引
    pub fn new() -> Self {
        Self::default()
    }

    /// 由记录列表构建索引
    ///
    /// # 规则
    /// - predictions 为空的记录剔除
    /// - 同一 (project_id, period) 出现多次时,以后出现者为准
    pub fn index<I>(records: I) -> Self
    where
        I: IntoIterator<Item = ForecastRecord>,
    {
        let mut store = Self::new();

        for record in records {
            store.stats.input_records += 1;

            if !record.has_predictions() {
                debug!(
                    project_id = %record.project_id,
                    period = %record.period,
                    "predictions 为空,不入索引"
                );
                store.stats.excluded_empty += 1;
                continue;
            }

            let periods = store.by_project.entry(record.project_id.clone()).or_default();
            if let Some(previous) = periods.insert(record.period, record) {
                warn!(
                    project_id = %previous.project_id,
                    period = %previous.period,
                    "同一项目同一月份存在多条预测,后者覆盖前者"
                );
                store.stats.duplicates_replaced += 1;
            }
        }

        store.stats.indexed_records = store.len();
        store
    }

    /// 建索引统计
    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    /// 项目的全部有效记录 (按月份升序)
    pub fn records_for(&self, project_id: &str) -> Vec<&ForecastRecord> {
        self.by_project
            .get(project_id)
            .map(|periods| periods.values().collect())
            .unwrap_or_default()
    }

    /// 项目已有预测的月份 (升序)
    pub fn periods_for(&self, project_id: &str) -> Vec<PeriodKey> {
        self.by_project
            .get(project_id)
            .map(|periods| periods.keys().copied().collect())
            .unwrap_or_default()
    }

    /// 按键查询
    pub fn get(&self, project_id: &str, period: PeriodKey) -> Option<&ForecastRecord> {
        self.by_project.get(project_id)?.get(&period)
    }

    pub(crate) fn get_mut(
        &mut self,
        project_id: &str,
        period: PeriodKey,
    ) -> Option<&mut ForecastRecord> {
        self.by_project.get_mut(project_id)?.get_mut(&period)
    }

    pub fn contains(&self, project_id: &str, period: PeriodKey) -> bool {
        self.get(project_id, period).is_some()
    }

    /// 写入一条新记录 (仅创建)
    ///
    /// 已有记录的实际值合并走 ActualsMerger
    ///
    /// # 返回
    /// - `Err(DuplicatePeriod)`: 键已存在
    /// - `Err(EmptyPredictions)`: predictions 为空
    /// - `Ok(&ForecastRecord)`: 写入后的记录
    pub fn upsert(&mut self, record: ForecastRecord) -> EngineResult<&ForecastRecord> {
        let project_id = record.project_id.clone();
        let period = record.period;

        if self.contains(&project_id, period) {
            return Err(ForecastError::DuplicatePeriod { project_id, period });
        }
        if !record.has_predictions() {
            return Err(ForecastError::EmptyPredictions { project_id, period });
        }

        debug!(project_id = %project_id, period = %period, "新增预测记录");
        self.stats.indexed_records += 1;
        let stored: &ForecastRecord = self
            .by_project
            .entry(project_id)
            .or_default()
            .entry(period)
            .or_insert(record);
        Ok(stored)
    }

    /// 全部记录 (项目无序,项目内按月份升序)
    pub fn iter(&self) -> impl Iterator<Item = &ForecastRecord> {
        self.by_project.values().flat_map(|periods| periods.values())
    }

    /// 有记录的项目ID (升序)
    pub fn project_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.by_project.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// 全部出现过的月份 (升序去重)
    pub fn periods(&self) -> BTreeSet<PeriodKey> {
        self.by_project
            .values()
            .flat_map(|periods| periods.keys().copied())
            .collect()
    }

    /// 最近的月份
    pub fn latest_period(&self) -> Option<PeriodKey> {
        self.periods().into_iter().next_back()
    }

    pub fn len(&self) -> usize {
        self.by_project.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
