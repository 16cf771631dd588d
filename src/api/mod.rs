// ==========================================
// 物资预测对账引擎 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供嵌入层 (HTTP/桌面壳) 调用
// ==========================================

pub mod dto;
pub mod error;
pub mod forecast_api;

// 重导出核心类型
pub use dto::{ActualsReceipt, DashboardSummary, ProjectForecastView};
pub use error::{ApiError, ApiResult};
pub use forecast_api::ForecastApi;
