// ==========================================
// 物资预测对账引擎 - 实际值合并 (Actuals Merger)
// ==========================================
// 职责: 将实际值按物资键浅合并到指定 (project_id, period) 的记录
// 红线: 没有预测的月份不能录入实际值 (NoSuchForecast)
// 红线: 合并不修改 predictions
// ==========================================
// 注: 合并后不触发聚合重算,由调用方按需重跑
// ==========================================

use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::forecast::{sanitize_quantities, ForecastRecord, MaterialQuantities};
use crate::domain::period::{PeriodKey, SharedClock, SystemClock};
use crate::engine::error::{EngineResult, ForecastError};
use crate::engine::store::ForecastStore;

// ==========================================
// ActualsMerger - 实际值合并引擎
// ==========================================
pub struct ActualsMerger {
    clock: SharedClock, // 用于 updated_at 时间戳
}

impl ActualsMerger {
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }

    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// 预演合并 (不修改 store)
    ///
    /// # 返回
    /// - `Err(NoSuchForecast)`: 该键无预测
    /// - `Ok(record)`: 合并后的记录副本
    pub fn preview(
        &self,
        store: &ForecastStore,
        project_id: &str,
        period: PeriodKey,
        values: &MaterialQuantities,
    ) -> EngineResult<ForecastRecord> {
        let existing = store
            .get(project_id, period)
            .ok_or_else(|| ForecastError::NoSuchForecast {
                project_id: project_id.to_string(),
                period,
            })?;

        let mut merged = existing.clone();
        self.apply(&mut merged, values);
        Ok(merged)
    }

    /// 合并实际值
    ///
    /// 未出现在 `values` 中的物资键保留原值,便于按物资逐步录入
    ///
    /// # 返回
    /// - `Err(NoSuchForecast)`: 该键无预测
    /// - `Ok(record)`: 合并后的记录副本 (供调用方立即重算指标)
    pub fn merge(
        &self,
        store: &mut ForecastStore,
        project_id: &str,
        period: PeriodKey,
        values: &MaterialQuantities,
    ) -> EngineResult<ForecastRecord> {
        let record = store
            .get_mut(project_id, period)
            .ok_or_else(|| ForecastError::NoSuchForecast {
                project_id: project_id.to_string(),
                period,
            })?;

        self.apply(record, values);

        info!(
            project_id,
            period = %period,
            materials = values.len(),
            total_actual = record.total_actual(),
            "实际值已合并"
        );
        Ok(record.clone())
    }

    /// 提交已预演且已落库的合并结果
    ///
    /// 当前记录按预演结果覆写实际值与 updated_at
    /// 若期间刷新移除了该记录,按预演结果补回
    ///
    /// # 返回
    /// - `Ok(record)`: 提交后当前状态中的记录副本
    pub fn commit(
        &self,
        store: &mut ForecastStore,
        merged: ForecastRecord,
    ) -> EngineResult<ForecastRecord> {
        let project_id = merged.project_id.clone();
        let period = merged.period;

        let committed = match store.get_mut(&project_id, period) {
            Some(record) => {
                record.actual_values.extend(merged.actual_values);
                record.updated_at = merged.updated_at;
                record.clone()
            }
            None => {
                debug!(
                    project_id = %project_id,
                    period = %period,
                    "记录已被刷新移除,按预演结果补回"
                );
                store.upsert(merged)?.clone()
            }
        };

        info!(
            project_id = %project_id,
            period = %period,
            total_actual = committed.total_actual(),
            "实际值已提交"
        );
        Ok(committed)
    }

    fn apply(&self, record: &mut ForecastRecord, values: &MaterialQuantities) {
        let accepted = sanitize_quantities(values.clone());
        if accepted.len() < values.len() {
            debug!(
                project_id = %record.project_id,
                period = %record.period,
                dropped = values.len() - accepted.len(),
                "部分实际值非法,已忽略"
            );
        }
        record.actual_values.extend(accepted);
        record.updated_at = Some(self.clock.now());
    }
}
