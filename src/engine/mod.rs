// ==========================================
// 物资预测对账引擎 - 引擎层
// ==========================================
// 职责: 预测记录索引、月份解析、实际值合并、指标计算、驾驶舱聚合
// 红线: Engine 不做 I/O,不持锁,不重试
// 红线: 所有操作都是内存数据上的纯函数或近纯函数
// ==========================================

pub mod actuals;
pub mod aggregation;
pub mod error;
pub mod metrics;
pub mod resolver;
pub mod store;

// 重导出核心引擎
pub use actuals::ActualsMerger;
pub use aggregation::{
    status_counts, AggregationEngine, ConfidenceSampler, FixedConfidence, MaterialProjection,
    RandomConfidence, WeightedCatalogProjection,
};
pub use error::{EngineResult, ForecastError};
pub use metrics::MetricsCalculator;
pub use resolver::PeriodResolver;
pub use store::{ForecastStore, IndexStats};
