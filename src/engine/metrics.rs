// ==========================================
// 物资预测对账引擎 - 指标计算 (Metrics Calculator)
// ==========================================
// 职责: 单条记录的预测/实际对账指标
// 输入: predictions + actual_values
// 输出: ResolvedMetrics
// ==========================================
// 红线: total_forecast == 0 时百分比为 0,不产生 NaN/Infinity
// 红线: 百分比按 half-away-from-zero 四舍五入 (默认 1 位小数)
// ==========================================

use crate::config::reconcile_config::{AccuracyThresholds, ReconcileConfig};
use crate::domain::forecast::{total_quantity, ForecastRecord, MaterialQuantities};
use crate::domain::metrics::ResolvedMetrics;
use crate::domain::types::round_to;

// ==========================================
// MetricsCalculator - 指标计算器
// ==========================================
// 无状态: 阈值与小数位在构造时确定
#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    thresholds: AccuracyThresholds,
    decimals: u32,
}

impl Default for MetricsCalculator {
    fn default() -> Self {
        Self::from_config(&ReconcileConfig::default())
    }
}

impl MetricsCalculator {
    pub fn new(thresholds: AccuracyThresholds, decimals: u32) -> Self {
        Self {
            thresholds,
            decimals,
        }
    }

    pub fn from_config(config: &ReconcileConfig) -> Self {
        Self::new(config.thresholds, config.percent_decimals)
    }

    /// 计算对账指标
    ///
    /// 对两侧键的并集求和,缺失的一侧按 0 计
    pub fn compute(
        &self,
        predictions: &MaterialQuantities,
        actuals: &MaterialQuantities,
    ) -> ResolvedMetrics {
        let total_forecast = total_quantity(predictions);
        let total_actual = total_quantity(actuals);
        let variance = total_actual - total_forecast;

        let (accuracy_percentage, variance_percentage) = if total_forecast > 0.0 {
            (
                round_to(total_actual / total_forecast * 100.0, self.decimals),
                round_to(variance / total_forecast * 100.0, self.decimals),
            )
        } else {
            (0.0, 0.0)
        };

        ResolvedMetrics {
            total_forecast,
            total_actual,
            accuracy_percentage,
            variance,
            variance_percentage,
            status: self.thresholds.classify(accuracy_percentage),
        }
    }

    /// 针对一条记录计算
    pub fn compute_record(&self, record: &ForecastRecord) -> ResolvedMetrics {
        self.compute(&record.predictions, &record.actual_values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::AccuracyStatus;

    fn quantities(pairs: &[(&str, f64)]) -> MaterialQuantities {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_steel_copper_reconciliation() {
        let metrics = MetricsCalculator::default().compute(
            &quantities(&[("steel", 100.0), ("copper", 10.0)]),
            &quantities(&[("steel", 95.0), ("copper", 11.0)]),
        );

        assert_eq!(metrics.total_forecast, 110.0);
        assert_eq!(metrics.total_actual, 106.0);
        assert_eq!(metrics.accuracy_percentage, 96.4);
        assert_eq!(metrics.variance, -4.0);
        assert_eq!(metrics.variance_percentage, -3.6);
        assert_eq!(metrics.status, AccuracyStatus::Excellent);
    }

    #[test]
    fn test_zero_forecast_is_poor_without_nan() {
        let metrics = MetricsCalculator::default().compute(
            &quantities(&[("steel", 0.0)]),
            &quantities(&[("steel", 12.0)]),
        );

        assert_eq!(metrics.accuracy_percentage, 0.0);
        assert_eq!(metrics.variance_percentage, 0.0);
        assert_eq!(metrics.variance, 12.0);
        assert_eq!(metrics.status, AccuracyStatus::Poor);

        let empty = MetricsCalculator::default()
            .compute(&MaterialQuantities::new(), &MaterialQuantities::new());
        assert_eq!(empty.accuracy_percentage, 0.0);
        assert_eq!(empty.status, AccuracyStatus::Poor);
    }

    #[test]
    fn test_asymmetric_keys() {
        // 有预测无实际 / 有实际无预测都按 0 计
        let metrics = MetricsCalculator::default().compute(
            &quantities(&[("steel", 50.0), ("cable", 50.0)]),
            &quantities(&[("steel", 45.0), ("bolts", 3.0)]),
        );

        assert_eq!(metrics.total_forecast, 100.0);
        assert_eq!(metrics.total_actual, 48.0);
        assert_eq!(metrics.accuracy_percentage, 48.0);
        assert_eq!(metrics.variance_percentage, -52.0);
        assert_eq!(metrics.status, AccuracyStatus::Poor);
    }

    #[test]
    fn test_status_boundaries() {
        let calc = MetricsCalculator::default();
        let forecast = quantities(&[("steel", 100.0)]);

        let status_for = |actual: f64| {
            calc.compute(&forecast, &quantities(&[("steel", actual)])).status
        };
        assert_eq!(status_for(95.0), AccuracyStatus::Excellent);
        assert_eq!(status_for(94.96), AccuracyStatus::Excellent); // 四舍五入到 95.0
        assert_eq!(status_for(94.9), AccuracyStatus::Good);
        assert_eq!(status_for(90.0), AccuracyStatus::Good);
        assert_eq!(status_for(80.0), AccuracyStatus::Fair);
        assert_eq!(status_for(79.9), AccuracyStatus::Poor);
        assert_eq!(status_for(130.0), AccuracyStatus::Excellent);
    }

    #[test]
    fn test_custom_thresholds_and_decimals() {
        let calc = MetricsCalculator::new(
            AccuracyThresholds {
                excellent: 98.0,
                good: 92.0,
                fair: 85.0,
            },
            2,
        );
        let metrics = calc.compute(
            &quantities(&[("steel", 3.0)]),
            &quantities(&[("steel", 2.9)]),
        );
        assert_eq!(metrics.accuracy_percentage, 96.67);
        assert_eq!(metrics.status, AccuracyStatus::Good);
    }
}
