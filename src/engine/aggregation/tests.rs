use super::*;
use crate::domain::forecast::MaterialQuantities;

// ==========================================
// 测试辅助函数
// ==========================================

fn p(raw: &str) -> PeriodKey {
    PeriodKey::parse(raw).unwrap()
}

fn quantities(pairs: &[(&str, f64)]) -> MaterialQuantities {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn forecast(project_id: &str, period: &str, total: f64) -> ForecastRecord {
    ForecastRecord::new(project_id, p(period), quantities(&[("steel", total)]))
}

fn forecast_with_actual(project_id: &str, period: &str, total: f64, actual: f64) -> ForecastRecord {
    forecast(project_id, period, total).with_actuals(quantities(&[("steel", actual)]))
}

fn projects(ids: &[(&str, &str)]) -> Vec<ProjectRef> {
    ids.iter()
        .map(|(id, status)| ProjectRef::new(*id, *status))
        .collect()
}

fn engine() -> AggregationEngine {
    let config = ReconcileConfig::default();
    AggregationEngine::new(
        &config,
        Box::new(WeightedCatalogProjection::new(
            config.material_catalog.clone(),
            Box::new(FixedConfidence(90.0)),
        )),
    )
}

// ==========================================
// 月度趋势
// ==========================================

#[test]
fn test_trend_averages_per_month() {
    let store = ForecastStore::index(vec![
        forecast_with_actual("P1", "2024-05", 100.0, 90.0),
        forecast("P2", "2024-05", 200.0),
        forecast_with_actual("P1", "2024-06", 120.0, 130.0),
        forecast_with_actual("P2", "2024-06", 80.0, 70.0),
    ]);
    let trend = engine().monthly_trend(&store, None);
    assert_eq!(trend.len(), 2);

    let may = &trend[0];
    assert_eq!(may.period, p("2024-05"));
    assert_eq!(may.label, "May");
    assert_eq!(may.forecast_avg, 150.0);
    assert_eq!(may.forecast_count, 2);
    // 只有 P1 录入了实际值
    assert_eq!(may.actual_avg, 90.0);
    assert_eq!(may.actual_count, 1);

    let june = &trend[1];
    assert_eq!(june.forecast_avg, 100.0);
    assert_eq!(june.actual_avg, 100.0);
    assert_eq!(june.actual_count, 2);
}

#[test]
fn test_trend_keeps_months_without_actuals() {
    let store = ForecastStore::index(vec![
        forecast("P1", "2024-03", 10.0),
        forecast_with_actual("P1", "2024-04", 10.0, 9.0),
        forecast("P1", "2024-05", 10.0),
    ]);
    let trend = engine().monthly_trend(&store, None);
    let periods: Vec<PeriodKey> = trend.iter().map(|t| t.period).collect();
    assert_eq!(periods, vec![p("2024-03"), p("2024-04"), p("2024-05")]);

    assert_eq!(trend[0].actual_avg, 0.0);
    assert_eq!(trend[0].actual_count, 0);
    assert_eq!(trend[2].actual_avg, 0.0);
    assert_eq!(trend[2].forecast_count, 1);
}

#[test]
fn test_trend_project_filter() {
    let store = ForecastStore::index(vec![
        forecast("P1", "2024-05", 100.0),
        forecast("P2", "2024-05", 300.0),
        forecast("P3", "2024-06", 50.0),
    ]);

    let all = engine().monthly_trend(&store, None);
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].forecast_avg, 200.0);
    assert_eq!(all[1].forecast_avg, 50.0);

    let single = engine().monthly_trend(&store, Some("P2"));
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].forecast_avg, 300.0);
    assert_eq!(single[0].forecast_count, 1);

    assert!(engine().monthly_trend(&store, Some("P9")).is_empty());
}

#[test]
fn test_trend_rounding() {
    let store = ForecastStore::index(vec![
        forecast("P1", "2024-05", 10.0),
        forecast("P2", "2024-05", 10.0),
        forecast("P3", "2024-05", 11.0),
    ]);
    let trend = engine().monthly_trend(&store, None);
    // 31 / 3 = 10.333..
    assert_eq!(trend[0].forecast_avg, 10.3);
}

// ==========================================
// 项目状态计数
// ==========================================

#[test]
fn test_status_counts_ignore_unknown() {
    let dir = projects(&[("P1", "IN PROGRESS"), ("P2", "COMPLETED"), ("P3", "FOO")]);
    let counts = engine().status_counts(&dir);

    assert_eq!(counts.in_progress, 1);
    assert_eq!(counts.completed, 1);
    assert_eq!(counts.planned, 0);
    assert_eq!(counts.unrecognized, 1);
    assert_eq!(counts.total(), 3);
}

#[test]
fn test_status_counts_empty_directory() {
    assert_eq!(status_counts(&[]), StatusCounts::default());
}

// ==========================================
// 重点物资
// ==========================================

#[test]
fn test_top_materials_uses_latest_month_average() {
    let store = ForecastStore::index(vec![
        forecast("P1", "2024-05", 1000.0),
        forecast("P1", "2024-06", 100.0),
        forecast("P2", "2024-06", 300.0),
    ]);

    let items = engine().top_materials(&store, Some(5));
    assert_eq!(items.len(), 5);
    let sum: f64 = items.iter().map(|m| m.quantity_estimate).sum();
    // 最近月份 2024-06 的平均预测为 200
    assert!((sum - 200.0).abs() < 0.05);
    assert!(items.iter().all(|m| m.confidence_estimate == 90.0));
}

#[test]
fn test_top_materials_default_n() {
    let store = ForecastStore::index(vec![forecast("P1", "2024-06", 100.0)]);
    assert_eq!(engine().top_materials(&store, None).len(), 4);
    assert_eq!(engine().top_materials(&store, Some(2)).len(), 2);
}

#[test]
fn test_top_materials_empty_store() {
    assert!(engine().top_materials(&ForecastStore::new(), None).is_empty());
}

// ==========================================
// 整体准确度
// ==========================================

#[test]
fn test_overall_accuracy() {
    let store = ForecastStore::index(vec![
        forecast_with_actual("P1", "2024-05", 100.0, 90.0), // 90
        forecast_with_actual("P2", "2024-05", 100.0, 105.0), // 95
        forecast("P3", "2024-05", 100.0),                   // 无实际值,不参与
        forecast_with_actual("P1", "2024-06", 0.0, 5.0),    // 预测为 0,不参与
    ]);
    let summary = engine().overall_accuracy(&store);
    assert_eq!(summary.contributing_records, 2);
    assert_eq!(summary.forecast_accuracy, 92.5);
}

#[test]
fn test_overall_accuracy_without_actuals_is_zero() {
    let store = ForecastStore::index(vec![forecast("P1", "2024-05", 100.0)]);
    let summary = engine().overall_accuracy(&store);
    assert_eq!(summary.forecast_accuracy, 0.0);
    assert_eq!(summary.contributing_records, 0);
}
