// ==========================================
// 物资预测对账引擎 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 以下错误一律返回给直接调用方,不吞掉
// 红线: 聚合引擎不产生这些错误 (缺口按零/中性值处理)
// ==========================================

use thiserror::Error;

use crate::domain::period::PeriodKey;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// 月份字符串不是合法的 YYYY-MM
    #[error("非法月份: '{raw}' (期望格式 YYYY-MM)")]
    InvalidPeriod { raw: String },

    /// 同一项目同一月份重复创建预测
    #[error("预测已存在: project_id={project_id}, period={period}，请改为更新")]
    DuplicatePeriod {
        project_id: String,
        period: PeriodKey,
    },

    /// 对不存在预测的月份录入实际值
    #[error("预测不存在: project_id={project_id}, period={period}，请先生成预测")]
    NoSuchForecast {
        project_id: String,
        period: PeriodKey,
    },

    /// 登记的预测 predictions 为空 (等同于本月无预测)
    #[error("预测内容为空: project_id={project_id}, period={period}")]
    EmptyPredictions {
        project_id: String,
        period: PeriodKey,
    },
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, ForecastError>;
