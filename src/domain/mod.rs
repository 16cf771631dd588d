// ==========================================
// 物资预测对账引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、值类型、派生指标结构
// 红线: 不含引擎逻辑,不含外部数据访问
// ==========================================

pub mod forecast;
pub mod metrics;
pub mod period;
pub mod project;
pub mod types;

// 重导出核心类型
pub use forecast::{
    coerce_quantities, sanitize_quantities, total_quantity, ForecastRecord, MaterialQuantities,
    RawForecastRecord,
};
pub use metrics::{AccuracySummary, MaterialEstimate, ResolvedMetrics, StatusCounts, TrendPoint};
pub use period::{Clock, FixedClock, PeriodKey, SharedClock, SystemClock};
pub use project::{ProjectRef, ProjectStatus};
pub use types::{round_to, AccuracyStatus};
