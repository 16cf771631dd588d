// ==========================================
// 物资预测对账引擎 - API层错误类型
// ==========================================
// 职责: 将引擎/协作方/配置错误转换为面向用户的错误消息
// 映射:
// - DuplicatePeriod → Conflict ("本月预测已存在,请改为更新")
// - NoSuchForecast  → PreconditionFailed ("请先生成预测")
// - InvalidPeriod / EmptyPredictions → InvalidInput
// - 协作方失败 → Upstream
// ==========================================

use thiserror::Error;

use crate::config::config_manager::ConfigError;
use crate::engine::error::ForecastError;
use crate::services::refresh::RefreshError;
use crate::services::source::SourceError;
use crate::services::state::StateLockError;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("本月预测已存在，请改为更新: {0}")]
    Conflict(String),

    #[error("请先生成预测: {0}")]
    PreconditionFailed(String),

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 外部协作方错误
    // ==========================================
    #[error("外部服务错误: {0}")]
    Upstream(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("配置错误: {0}")]
    Config(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 ForecastError 转换
// ==========================================
impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::DuplicatePeriod { .. } => ApiError::Conflict(err.to_string()),
            ForecastError::NoSuchForecast { .. } => ApiError::PreconditionFailed(err.to_string()),
            ForecastError::InvalidPeriod { .. } | ForecastError::EmptyPredictions { .. } => {
                ApiError::InvalidInput(err.to_string())
            }
        }
    }
}

impl From<SourceError> for ApiError {
    fn from(err: SourceError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<RefreshError> for ApiError {
    fn from(err: RefreshError) -> Self {
        match err {
            RefreshError::Source(e) => e.into(),
            RefreshError::State(e) => e.into(),
        }
    }
}

impl From<StateLockError> for ApiError {
    fn from(err: StateLockError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::Config(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
