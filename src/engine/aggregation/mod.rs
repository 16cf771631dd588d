// ==========================================
// 物资预测对账引擎 - 聚合引擎 (Aggregation Engine)
// ==========================================
// 职责: 驾驶舱的跨项目/跨月份只读投影
// - 月度趋势 (平均预测总量 / 平均实际总量)
// - 项目状态计数
// - 重点物资展示投影
// - 整体预测准确度
// ==========================================
// 红线: 聚合不报错,数据缺口按零/中性值处理
// 红线: 有预测无实际的月份仍输出一行 (actual_avg = 0)
// 红线: 趋势与准确度覆盖索引中的全部记录,项目目录只用于状态计数
// ==========================================

mod materials;

#[cfg(test)]
mod tests;

pub use materials::{
    ConfidenceSampler, FixedConfidence, MaterialProjection, RandomConfidence,
    WeightedCatalogProjection,
};

use std::collections::BTreeMap;
use tracing::debug;

use crate::config::reconcile_config::ReconcileConfig;
use crate::domain::forecast::ForecastRecord;
use crate::domain::metrics::{AccuracySummary, MaterialEstimate, StatusCounts, TrendPoint};
use crate::domain::period::PeriodKey;
use crate::domain::project::{ProjectRef, ProjectStatus};
use crate::domain::types::round_to;
use crate::engine::store::ForecastStore;

/// 单月累加器
#[derive(Debug, Default, Clone, Copy)]
struct MonthAccumulator {
    forecast_total: f64,
    actual_total: f64,
    forecast_count: usize,
    actual_count: usize,
}

impl MonthAccumulator {
    fn add(&mut self, record: &ForecastRecord) {
        if record.has_predictions() {
            self.forecast_total += record.total_forecast();
            self.forecast_count += 1;
        }
        if record.has_actuals() {
            self.actual_total += record.total_actual();
            self.actual_count += 1;
        }
    }

    fn forecast_avg(&self) -> f64 {
        if self.forecast_count > 0 {
            self.forecast_total / self.forecast_count as f64
        } else {
            0.0
        }
    }

    fn actual_avg(&self) -> f64 {
        if self.actual_count > 0 {
            self.actual_total / self.actual_count as f64
        } else {
            0.0
        }
    }
}

/// 按月份累加 (月份升序)
fn accumulate_by_month<'a, I>(records: I) -> BTreeMap<PeriodKey, MonthAccumulator>
where
    I: IntoIterator<Item = &'a ForecastRecord>,
{
    let mut months: BTreeMap<PeriodKey, MonthAccumulator> = BTreeMap::new();
    for record in records {
        months.entry(record.period).or_default().add(record);
    }
    months
}

// ==========================================
// AggregationEngine - 聚合引擎
// ==========================================
pub struct AggregationEngine {
    decimals: u32,
    default_top_n: usize,
    projection: Box<dyn MaterialProjection>,
}

impl AggregationEngine {
    pub fn new(config: &ReconcileConfig, projection: Box<dyn MaterialProjection>) -> Self {
        Self {
            decimals: config.percent_decimals,
            default_top_n: config.top_materials_n,
            projection,
        }
    }

    /// 按配置构造 (目录比例分摊 + 随机置信度)
    pub fn from_config(config: &ReconcileConfig) -> Self {
        Self::new(
            config,
            Box::new(WeightedCatalogProjection::from_config(config)),
        )
    }

    // ==========================================
    // 月度趋势
    // ==========================================

    /// 月度趋势
    ///
    /// # 参数
    /// - `store`: 预测记录索引
    /// - `project_id`: 可选的单项目过滤
    ///
    /// # 返回
    /// 每个出现过的月份一行 (升序),无实际值的月份 actual_avg = 0
    pub fn monthly_trend(
        &self,
        store: &ForecastStore,
        project_id: Option<&str>,
    ) -> Vec<TrendPoint> {
        let records = store
            .iter()
            .filter(|r| project_id.map_or(true, |id| r.project_id == id));

        let points: Vec<TrendPoint> = accumulate_by_month(records)
            .into_iter()
            .map(|(period, acc)| TrendPoint {
                period,
                label: period.month_abbr().to_string(),
                forecast_avg: round_to(acc.forecast_avg(), self.decimals),
                actual_avg: round_to(acc.actual_avg(), self.decimals),
                forecast_count: acc.forecast_count,
                actual_count: acc.actual_count,
            })
            .collect();

        debug!(
            project_filter = ?project_id,
            months = points.len(),
            "月度趋势计算完成"
        );
        points
    }

    // ==========================================
    // 项目状态计数
    // ==========================================

    /// 项目状态计数 (未识别状态忽略,仅计入 unrecognized)
    pub fn status_counts(&self, projects: &[ProjectRef]) -> StatusCounts {
        status_counts(projects)
    }

    // ==========================================
    // 重点物资
    // ==========================================

    /// 重点物资展示投影
    ///
    /// 种子 = 最近月份的平均预测总量 (全量记录,不做项目过滤)
    ///
    /// # 参数
    /// - `n`: 条数,None 时使用配置默认值
    pub fn top_materials(&self, store: &ForecastStore, n: Option<usize>) -> Vec<MaterialEstimate> {
        let n = n.unwrap_or(self.default_top_n);
        let months = accumulate_by_month(store.iter());

        let Some((period, acc)) = months.iter().next_back() else {
            debug!("无预测记录,重点物资为空");
            return Vec::new();
        };

        let seed = acc.forecast_avg();
        debug!(period = %period, seed, n, "重点物资投影种子");
        self.projection.project(seed, n)
    }

    // ==========================================
    // 整体预测准确度
    // ==========================================

    /// 整体预测准确度
    ///
    /// 参与记录: 至少一项实际值且预测总量 > 0
    /// 单条准确度: (1 - |actual - forecast| / forecast) * 100
    /// 无参与记录时为 0
    pub fn overall_accuracy(&self, store: &ForecastStore) -> AccuracySummary {
        let accuracies: Vec<f64> = store
            .iter()
            .filter(|r| r.has_actuals())
            .filter_map(|r| {
                let forecast = r.total_forecast();
                if forecast > 0.0 {
                    Some((1.0 - (r.total_actual() - forecast).abs() / forecast) * 100.0)
                } else {
                    None
                }
            })
            .collect();

        let forecast_accuracy = if accuracies.is_empty() {
            0.0
        } else {
            round_to(
                accuracies.iter().sum::<f64>() / accuracies.len() as f64,
                self.decimals,
            )
        };

        AccuracySummary {
            forecast_accuracy,
            contributing_records: accuracies.len(),
        }
    }
}

/// 项目状态计数
pub fn status_counts(projects: &[ProjectRef]) -> StatusCounts {
    let mut counts = StatusCounts::default();
    for project in projects {
        match project.parsed_status() {
            Some(ProjectStatus::InProgress) => counts.in_progress += 1,
            Some(ProjectStatus::Completed) => counts.completed += 1,
            Some(ProjectStatus::Planned) => counts.planned += 1,
            None => {
                debug!(
                    project_id = %project.project_id,
                    status = %project.status,
                    "未识别的项目状态,忽略"
                );
                counts.unrecognized += 1;
            }
        }
    }
    counts
}
