// ==========================================
// 物资预测对账引擎 - API 数据传输对象
// ==========================================
// 序列化: camelCase,与驾驶舱前端字段保持一致
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::forecast::ForecastRecord;
use crate::domain::metrics::{
    AccuracySummary, MaterialEstimate, ResolvedMetrics, StatusCounts, TrendPoint,
};
use crate::domain::period::PeriodKey;

/// 单项目单月视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectForecastView {
    pub project_id: String,
    pub period: PeriodKey,
    pub period_label: String,          // "Jun 2024"
    pub is_current_period: bool,       // 是否为时钟所在月份
    pub record: ForecastRecord,
    pub metrics: ResolvedMetrics,
    pub available_periods: Vec<PeriodKey>, // 降序,供浏览其他月份
}

/// 实际值录入回执
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActualsReceipt {
    pub record: ForecastRecord,
    pub metrics: ResolvedMetrics,
}

/// 驾驶舱汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub generated_at: DateTime<Utc>,
    pub state_generation: u64,
    pub monthly_trend: Vec<TrendPoint>,
    pub status_counts: StatusCounts,
    pub top_materials: Vec<MaterialEstimate>,
    pub accuracy: AccuracySummary,
}
