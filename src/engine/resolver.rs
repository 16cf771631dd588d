// ==========================================
// 物资预测对账引擎 - 月份解析器 (Period Resolver)
// ==========================================
// 职责: 为项目确定"当前"预测记录
// 规则: 当月存在则取当月,否则取最近的月份 (最大月份)
// 红线: 不取"最近的未来月份",也不取"最早月份"
// ==========================================
// 注: 浏览其他月份是纯查询 (select_period),不重新走解析流程
// ==========================================

use std::sync::Arc;
use tracing::debug;

use crate::domain::forecast::ForecastRecord;
use crate::domain::period::{Clock, PeriodKey, SharedClock, SystemClock};
use crate::engine::store::ForecastStore;

// ==========================================
// PeriodResolver - 月份解析器
// ==========================================
pub struct PeriodResolver {
    clock: SharedClock,
}

impl PeriodResolver {
    /// 使用注入的时间源创建
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }

    /// 使用系统时钟创建
    pub fn with_system_clock() -> Self {
        Self::new(Arc::new(SystemClock))
    }

    /// 当前月份
    pub fn current_period(&self) -> PeriodKey {
        self.clock.current_period()
    }

    /// 解析项目的当前记录
    ///
    /// # 返回
    /// - `None`: 项目没有任何有效预测
    /// - `Some(record)`: 当月记录,否则为月份最大的记录
    pub fn resolve_active<'a>(
        &self,
        store: &'a ForecastStore,
        project_id: &str,
    ) -> Option<&'a ForecastRecord> {
        let current = self.current_period();
        let candidates = store.records_for(project_id);

        if let Some(record) = candidates.iter().find(|r| r.period == current) {
            debug!(project_id, period = %current, "命中当月预测");
            return Some(*record);
        }

        let fallback = candidates.into_iter().max_by_key(|r| r.period);
        if let Some(record) = fallback {
            debug!(
                project_id,
                current = %current,
                resolved = %record.period,
                "当月无预测,回退到最近月份"
            );
        }
        fallback
    }

    /// 为每个项目解析一条当前记录 (按 project_id 升序)
    pub fn resolve_all<'a>(&self, store: &'a ForecastStore) -> Vec<&'a ForecastRecord> {
        store
            .project_ids()
            .into_iter()
            .filter_map(|project_id| self.resolve_active(store, project_id))
            .collect()
    }

    /// 项目可浏览的月份 (降序)
    pub fn available_periods(&self, store: &ForecastStore, project_id: &str) -> Vec<PeriodKey> {
        let mut periods = store.periods_for(project_id);
        periods.sort_unstable_by(|a, b| b.cmp(a));
        periods
    }

    /// 浏览指定月份 (纯查询)
    pub fn select_period<'a>(
        &self,
        store: &'a ForecastStore,
        project_id: &str,
        period: PeriodKey,
    ) -> Option<&'a ForecastRecord> {
        store.get(project_id, period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::forecast::MaterialQuantities;
    use crate::domain::period::FixedClock;

    fn p(raw: &str) -> PeriodKey {
        PeriodKey::parse(raw).unwrap()
    }

    fn record(project_id: &str, period: &str) -> ForecastRecord {
        let predictions: MaterialQuantities = [("steel".to_string(), 10.0)].into_iter().collect();
        ForecastRecord::new(project_id, p(period), predictions)
    }

    fn resolver_at(period: &str) -> PeriodResolver {
        PeriodResolver::new(Arc::new(FixedClock::in_period(p(period))))
    }

    #[test]
    fn test_prefers_current_month() {
        let store = ForecastStore::index(vec![
            record("P1", "2024-05"),
            record("P1", "2024-07"),
            record("P1", "2024-09"),
        ]);

        let resolved = resolver_at("2024-07").resolve_active(&store, "P1").unwrap();
        assert_eq!(resolved.period, p("2024-07"));
    }

    #[test]
    fn test_falls_back_to_most_recent() {
        let store = ForecastStore::index(vec![record("P1", "2024-05"), record("P1", "2024-06")]);

        let resolver = resolver_at("2024-07");
        let resolved = resolver.resolve_active(&store, "P1").unwrap();
        assert_eq!(resolved.period, p("2024-06"));

        // 重复调用结果一致
        let again = resolver.resolve_active(&store, "P1").unwrap();
        assert_eq!(again.period, resolved.period);
    }

    #[test]
    fn test_fallback_takes_maximum_even_if_future() {
        // 当月缺失时取最大月份
        let store = ForecastStore::index(vec![record("P1", "2024-03"), record("P1", "2024-12")]);
        let resolved = resolver_at("2024-07").resolve_active(&store, "P1").unwrap();
        assert_eq!(resolved.period, p("2024-12"));
    }

    #[test]
    fn test_no_candidates() {
        let store = ForecastStore::index(vec![record("P1", "2024-05")]);
        assert!(resolver_at("2024-07").resolve_active(&store, "P2").is_none());
    }

    #[test]
    fn test_available_periods_descending_and_browse() {
        let store = ForecastStore::index(vec![
            record("P1", "2024-05"),
            record("P1", "2024-07"),
            record("P1", "2024-06"),
        ]);
        let resolver = resolver_at("2024-07");

        assert_eq!(
            resolver.available_periods(&store, "P1"),
            vec![p("2024-07"), p("2024-06"), p("2024-05")]
        );
        let browsed = resolver.select_period(&store, "P1", p("2024-05")).unwrap();
        assert_eq!(browsed.period, p("2024-05"));
        assert!(resolver.select_period(&store, "P1", p("2024-01")).is_none());
    }

    #[test]
    fn test_resolve_all_one_per_project() {
        let store = ForecastStore::index(vec![
            record("P1", "2024-05"),
            record("P1", "2024-07"),
            record("P2", "2024-04"),
        ]);

        let resolved = resolver_at("2024-07").resolve_all(&store);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].project_id, "P1");
        assert_eq!(resolved[0].period, p("2024-07"));
        assert_eq!(resolved[1].project_id, "P2");
        assert_eq!(resolved[1].period, p("2024-04"));
    }
}
