// ==========================================
// 物资预测对账引擎 - 对账配置
// ==========================================
// 职责: 可调常量 (准确度阈值、小数位、重点物资目录、置信度区间)
// 说明: 阈值属于展示口径,可经 config_kv 覆写
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::types::AccuracyStatus;

// ==========================================
// AccuracyThresholds - 准确度分级阈值 (百分比)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyThresholds {
    pub excellent: f64,
    pub good: f64,
    pub fair: f64,
}

impl Default for AccuracyThresholds {
    fn default() -> Self {
        Self {
            excellent: 95.0,
            good: 90.0,
            fair: 80.0,
        }
    }
}

impl AccuracyThresholds {
    /// 按阈值分桶 (>= excellent / >= good / >= fair / 其余)
    pub fn classify(&self, accuracy_percentage: f64) -> AccuracyStatus {
        if accuracy_percentage >= self.excellent {
            AccuracyStatus::Excellent
        } else if accuracy_percentage >= self.good {
            AccuracyStatus::Good
        } else if accuracy_percentage >= self.fair {
            AccuracyStatus::Fair
        } else {
            AccuracyStatus::Poor
        }
    }

    /// 阈值必须严格递减且为有限正数
    pub fn validate(&self) -> Result<(), String> {
        let all_finite = [self.excellent, self.good, self.fair]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0);
        if !all_finite {
            return Err(format!("准确度阈值必须为正数: {:?}", self));
        }
        if !(self.excellent > self.good && self.good > self.fair) {
            return Err(format!(
                "准确度阈值必须严格递减: excellent={}, good={}, fair={}",
                self.excellent, self.good, self.fair
            ));
        }
        Ok(())
    }
}

// ==========================================
// MaterialArchetype - 重点物资原型
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialArchetype {
    pub name: String,
    pub unit: String,
    pub weight: f64, // 分摊比例
}

impl MaterialArchetype {
    pub fn new(name: &str, unit: &str, weight: f64) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
            weight,
        }
    }
}

/// 默认物资目录 (输电工程常见物资,比例合计 1.0)
pub fn default_material_catalog() -> Vec<MaterialArchetype> {
    vec![
        MaterialArchetype::new("Steel Tower", "pcs", 0.30),
        MaterialArchetype::new("Conductor Cable", "km", 0.25),
        MaterialArchetype::new("Insulator", "pcs", 0.20),
        MaterialArchetype::new("Transformer", "units", 0.15),
        MaterialArchetype::new("Switchgear", "units", 0.10),
    ]
}

// ==========================================
// ReconcileConfig - 对账配置全集
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub thresholds: AccuracyThresholds,
    /// 百分比小数位
    pub percent_decimals: u32,
    /// 重点物资默认条数
    pub top_materials_n: usize,
    /// 置信度区间 (百分比, 闭区间)
    pub confidence_min: f64,
    pub confidence_max: f64,
    pub material_catalog: Vec<MaterialArchetype>,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            thresholds: AccuracyThresholds::default(),
            percent_decimals: 1,
            top_materials_n: 4,
            confidence_min: 85.0,
            confidence_max: 95.0,
            material_catalog: default_material_catalog(),
        }
    }
}

impl ReconcileConfig {
    /// 配置校验
    ///
    /// # 验证规则
    /// 1. 阈值严格递减
    /// 2. 小数位不超过 6
    /// 3. 置信度区间 0 <= min <= max <= 100
    /// 4. 物资目录非空,比例非负且合计大于 0
    pub fn validate(&self) -> Result<(), String> {
        self.thresholds.validate()?;

        if self.percent_decimals > 6 {
            return Err(format!("小数位过大: {}", self.percent_decimals));
        }

        let range_ok = self.confidence_min.is_finite()
            && self.confidence_max.is_finite()
            && 0.0 <= self.confidence_min
            && self.confidence_min <= self.confidence_max
            && self.confidence_max <= 100.0;
        if !range_ok {
            return Err(format!(
                "置信度区间非法: [{}, {}]",
                self.confidence_min, self.confidence_max
            ));
        }

        if self.material_catalog.is_empty() {
            return Err("物资目录不能为空".to_string());
        }
        for archetype in &self.material_catalog {
            if archetype.name.trim().is_empty() {
                return Err("物资名称不能为空".to_string());
            }
            if !archetype.weight.is_finite() || archetype.weight < 0.0 {
                return Err(format!(
                    "物资比例非法: {}={}",
                    archetype.name, archetype.weight
                ));
            }
        }
        let weight_sum: f64 = self.material_catalog.iter().map(|m| m.weight).sum();
        if weight_sum <= 0.0 {
            return Err("物资比例合计必须大于 0".to_string());
        }

        Ok(())
    }
}
