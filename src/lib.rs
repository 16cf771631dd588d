// ==========================================
// 物资预测对账引擎 - 核心库
// ==========================================
// 职责: 项目月度物资预测与实际值的调和、指标计算、驾驶舱聚合
// 技术栈: Rust + Tokio + SQLite (仅配置存储)
// 系统定位: 纯计算引擎,持久化与传输由外部协作方负责
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 对账计算
pub mod engine;

// 配置层 - 对账常量
pub mod config;

// 服务层 - 外部协作方边界与状态刷新
pub mod services;

// API 层 - 业务接口
pub mod api;

// 数据库基础设施（配置库连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    AccuracyStatus, Clock, FixedClock, ForecastRecord, MaterialQuantities, PeriodKey, ProjectRef,
    ProjectStatus, RawForecastRecord, ResolvedMetrics, SharedClock, SystemClock,
};

// 引擎
pub use engine::{
    ActualsMerger, AggregationEngine, ForecastError, ForecastStore, MetricsCalculator,
    PeriodResolver,
};

// 配置
pub use config::{ConfigManager, ReconcileConfig};

// 服务
pub use services::{
    ActualsSink, EngineState, EngineStateHandle, ForecastSource, ProjectDirectory, SourceError,
};

// API
pub use api::{ApiError, ApiResult, ForecastApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "物资预测对账引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
