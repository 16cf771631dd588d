// ==========================================
// 物资预测对账引擎 - 派生指标 (不持久化)
// ==========================================
// 单项目: ResolvedMetrics
// 多项目驾驶舱: TrendPoint / StatusCounts / MaterialEstimate / AccuracySummary
// ==========================================

use serde::{Deserialize, Serialize};

use super::period::PeriodKey;
use super::types::AccuracyStatus;

// ==========================================
// ResolvedMetrics - 单条记录的预测/实际对账指标
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMetrics {
    pub total_forecast: f64,
    pub total_actual: f64,
    /// round(total_actual / total_forecast * 100); total_forecast == 0 时为 0
    pub accuracy_percentage: f64,
    /// total_actual - total_forecast
    pub variance: f64,
    /// round(variance / total_forecast * 100); total_forecast == 0 时为 0
    pub variance_percentage: f64,
    pub status: AccuracyStatus,
}

// ==========================================
// TrendPoint - 月度趋势行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub period: PeriodKey,
    pub label: String,         // 月份简称 (Jan..Dec)
    pub forecast_avg: f64,     // 预测总量均值
    pub actual_avg: f64,       // 实际总量均值 (无实际值时为 0)
    pub forecast_count: usize, // 预测均值分母
    pub actual_count: usize,   // 实际均值分母 (至少有一项实际值的记录数)
}

// ==========================================
// StatusCounts - 项目状态计数
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub in_progress: usize,
    pub completed: usize,
    pub planned: usize,
    /// 未识别状态条数 (仅诊断用,不报错)
    pub unrecognized: usize,
}

impl StatusCounts {
    /// 已识别项目总数
    pub fn recognized_total(&self) -> usize {
        self.in_progress + self.completed + self.planned
    }

    /// 项目目录总数
    pub fn total(&self) -> usize {
        self.recognized_total() + self.unrecognized
    }
}

// ==========================================
// MaterialEstimate - 驾驶舱"重点物资"展示条目
// ==========================================
// 注意: 展示用启发式结果,不是统计估计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialEstimate {
    pub material: String,
    pub unit: String,
    pub quantity_estimate: f64,
    pub confidence_estimate: f64,
}

// ==========================================
// AccuracySummary - 整体预测准确度 (驾驶舱 KPI)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracySummary {
    /// 平均准确度 (1 - |actual - forecast| / forecast) * 100
    pub forecast_accuracy: f64,
    /// 参与计算的记录数
    pub contributing_records: usize,
}
