// ==========================================
// 物资预测对账引擎 - 外部协作方接口
// ==========================================
// 职责: 定义预测数据源、实际值落库、项目目录的 trait
// 说明: Engine 只消费/产出纯数据,I/O 全部在这些边界上发生
// 红线: 重试/退避属于协作方实现,不在本 crate 内
// ==========================================

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::forecast::{ForecastRecord, RawForecastRecord};
use crate::domain::project::ProjectRef;

/// 外部协作方错误类型
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("外部数据源不可用: {0}")]
    Unavailable(String),

    #[error("外部数据源拒绝请求: {0}")]
    Rejected(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SourceResult<T> = Result<T, SourceError>;

// ==========================================
// Trait: ForecastSource - 预测数据源 (读)
// ==========================================
#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// 拉取全部已存在的预测记录 (每条一个 project_id + forecast_month)
    async fn fetch_records(&self) -> SourceResult<Vec<RawForecastRecord>>;
}

// ==========================================
// Trait: ActualsSink - 实际值落库 (写)
// ==========================================
#[async_trait]
pub trait ActualsSink: Send + Sync {
    /// 持久化合并后的记录 (以 project_id + period 为键,载荷为 actual_values)
    async fn persist_actuals(&self, record: &ForecastRecord) -> SourceResult<()>;
}

// ==========================================
// Trait: ProjectDirectory - 项目目录 (读)
// ==========================================
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    async fn list_projects(&self) -> SourceResult<Vec<ProjectRef>>;
}
