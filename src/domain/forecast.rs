// ==========================================
// 物资预测对账引擎 - 预测记录领域模型
// ==========================================
// 职责: 月度预测记录 + 物资数量映射 + 外部数据边界转换
// 红线: 每个 (project_id, period) 至多一条记录
// 红线: predictions 为空的记录视为"本月无预测",不参与解析与聚合
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

use super::period::PeriodKey;
use crate::engine::error::ForecastError;

/// 物资数量映射 (material key -> 数量)
///
/// 物资键为开放集合,由上游预测方定义,引擎不假设固定 schema。
/// 使用 BTreeMap 保证遍历顺序确定。
pub type MaterialQuantities = BTreeMap<String, f64>;

/// 求和 (空映射为 0)
pub fn total_quantity(values: &MaterialQuantities) -> f64 {
    values.values().sum()
}

/// 数量是否可接受: 有限且非负
pub fn is_valid_quantity(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// 剔除非法数量 (NaN / 无穷 / 负数)
pub fn sanitize_quantities(values: MaterialQuantities) -> MaterialQuantities {
    values
        .into_iter()
        .filter(|(key, value)| {
            let keep = is_valid_quantity(*value);
            if !keep {
                debug!(material = %key, value = *value, "剔除非法物资数量");
            }
            keep
        })
        .collect()
}

/// 将外部 JSON 对象强制转换为物资数量映射
///
/// # 规则
/// - 数字: 直接取值
/// - 非空字符串: 尝试按数字解析
/// - 其他 (null / bool / 数组 / 对象 / 无法解析的字符串): 丢弃
/// - 结果再经过 `sanitize_quantities` 过滤非有限值与负数
pub fn coerce_quantities(raw: &Map<String, Value>) -> MaterialQuantities {
    let coerced = raw
        .iter()
        .filter_map(|(key, value)| {
            let number = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => {
                    let trimmed = s.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        trimmed.parse::<f64>().ok()
                    }
                }
                _ => None,
            };
            if number.is_none() {
                debug!(
                    material = %key,
                    raw = %value,
                    "物资数量无法转换为数值,已忽略"
                );
            }
            number.map(|n| (key.clone(), n))
        })
        .collect();
    sanitize_quantities(coerced)
}

// ==========================================
// ForecastRecord - 月度预测记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRecord {
    // ===== 主键 =====
    pub project_id: String, // 项目ID (外部实体外键)
    pub period: PeriodKey,  // 预测目标月份

    // ===== 预测值 (上游生成后不可变) =====
    pub predictions: MaterialQuantities,

    // ===== 实际值 (可增量录入) =====
    #[serde(default)]
    pub actual_values: MaterialQuantities,

    // ===== 审计字段 =====
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ForecastRecord {
    /// 创建新的预测记录 (实际值为空)
    pub fn new(
        project_id: impl Into<String>,
        period: PeriodKey,
        predictions: MaterialQuantities,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            period,
            predictions: sanitize_quantities(predictions),
            actual_values: MaterialQuantities::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// 附带实际值 (构造测试数据/回放数据)
    pub fn with_actuals(mut self, actual_values: MaterialQuantities) -> Self {
        self.actual_values = sanitize_quantities(actual_values);
        self
    }

    /// 是否为有效预测 (predictions 非空)
    pub fn has_predictions(&self) -> bool {
        !self.predictions.is_empty()
    }

    /// 是否已录入至少一项实际值
    pub fn has_actuals(&self) -> bool {
        !self.actual_values.is_empty()
    }

    /// 预测总量
    pub fn total_forecast(&self) -> f64 {
        total_quantity(&self.predictions)
    }

    /// 实际总量
    pub fn total_actual(&self) -> f64 {
        total_quantity(&self.actual_values)
    }

    /// 记录键
    pub fn key(&self) -> (&str, PeriodKey) {
        (self.project_id.as_str(), self.period)
    }
}

// ==========================================
// RawForecastRecord - 外部数据源记录
// ==========================================
// 外部预测源提供的原始形状:
// {project_id, forecast_month, predictions, actual_values}
// predictions / actual_values 允许缺失或为 null
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawForecastRecord {
    pub project_id: String,
    pub forecast_month: String,
    #[serde(default)]
    pub predictions: Option<Map<String, Value>>,
    #[serde(default)]
    pub actual_values: Option<Map<String, Value>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<RawForecastRecord> for ForecastRecord {
    type Error = ForecastError;

    /// 边界转换
    ///
    /// # 返回
    /// - `Err(InvalidPeriod)`: forecast_month 不是合法的 YYYY-MM
    /// - `Ok`: 数量已强制转换; predictions 可能为空 (由 Store 负责剔除)
    fn try_from(raw: RawForecastRecord) -> Result<Self, Self::Error> {
        let period = PeriodKey::parse(&raw.forecast_month)?;
        let predictions = raw
            .predictions
            .as_ref()
            .map(coerce_quantities)
            .unwrap_or_default();
        let actual_values = raw
            .actual_values
            .as_ref()
            .map(coerce_quantities)
            .unwrap_or_default();

        Ok(ForecastRecord {
            project_id: raw.project_id,
            period,
            predictions,
            actual_values,
            created_at: raw.created_at,
            updated_at: raw.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("需要 JSON 对象"),
        }
    }

    #[test]
    fn test_coerce_mixed_values() {
        let raw = object(json!({
            "quantity_steel_tons": 120.5,
            "quantity_copper_tons": "14",
            "quantity_cement_bags": " ",
            "quantity_glass": null,
            "quantity_bolts": "n/a",
            "quantity_flag": true,
            "quantity_negative": -3.0
        }));

        let coerced = coerce_quantities(&raw);
        assert_eq!(coerced.len(), 2);
        assert_eq!(coerced["quantity_steel_tons"], 120.5);
        assert_eq!(coerced["quantity_copper_tons"], 14.0);
    }

    #[test]
    fn test_raw_record_conversion() {
        let raw = RawForecastRecord {
            project_id: "P0001".to_string(),
            forecast_month: "2024-06".to_string(),
            predictions: Some(object(json!({"steel": 100, "copper": "10"}))),
            actual_values: None,
            ..Default::default()
        };

        let record = ForecastRecord::try_from(raw).unwrap();
        assert_eq!(record.period.to_string(), "2024-06");
        assert_eq!(record.total_forecast(), 110.0);
        assert!(!record.has_actuals());
    }

    #[test]
    fn test_raw_record_invalid_month() {
        let raw = RawForecastRecord {
            project_id: "P0001".to_string(),
            forecast_month: "June 2024".to_string(),
            ..Default::default()
        };

        let err = ForecastRecord::try_from(raw).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidPeriod { .. }));
    }

    #[test]
    fn test_missing_predictions_yield_empty_record() {
        let raw = RawForecastRecord {
            project_id: "P0002".to_string(),
            forecast_month: "2024-05".to_string(),
            predictions: None,
            ..Default::default()
        };

        let record = ForecastRecord::try_from(raw).unwrap();
        assert!(!record.has_predictions());
    }
}
