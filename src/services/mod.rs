// ==========================================
// 物资预测对账引擎 - 服务层
// ==========================================
// 职责: 外部协作方边界 + 引擎状态的刷新与原子替换
// ==========================================

pub mod refresh;
pub mod source;
pub mod state;

pub use refresh::{build_state, RefreshError, RefreshReport, RefreshService, SkippedRecord};
pub use source::{ActualsSink, ForecastSource, ProjectDirectory, SourceError, SourceResult};
pub use state::{EngineState, EngineStateHandle, RefreshTicket, StateLockError};
