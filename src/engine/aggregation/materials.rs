// ==========================================
// 物资预测对账引擎 - 重点物资展示投影
// ==========================================
// 注意: 这是展示用启发式,不是统计估计
// - 以最近月份的平均预测总量作为种子
// - 按固定比例分摊到物资原型目录
// - 置信度取有界随机数
// 独立成 trait,后续可替换为真实的分物资预测数据源
// ==========================================

use rand::Rng;

use crate::config::reconcile_config::{MaterialArchetype, ReconcileConfig};
use crate::domain::metrics::MaterialEstimate;
use crate::domain::types::round_to;

/// 数量保留的小数位
const QUANTITY_DECIMALS: u32 = 2;

// ==========================================
// Trait: MaterialProjection
// ==========================================
pub trait MaterialProjection: Send + Sync {
    /// 将种子总量投影为至多 n 条物资估计
    fn project(&self, seed_total: f64, n: usize) -> Vec<MaterialEstimate>;
}

// ==========================================
// Trait: ConfidenceSampler - 置信度来源
// ==========================================
pub trait ConfidenceSampler: Send + Sync {
    fn sample(&self) -> f64;
}

/// 区间内随机整数置信度
#[derive(Debug, Clone, Copy)]
pub struct RandomConfidence {
    min: f64,
    max: f64,
}

impl RandomConfidence {
    /// 区间颠倒时自动交换
    pub fn new(min: f64, max: f64) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }
}

impl ConfidenceSampler for RandomConfidence {
    fn sample(&self) -> f64 {
        rand::thread_rng().gen_range(self.min..=self.max).round()
    }
}

/// 固定置信度 (测试/确定性展示)
#[derive(Debug, Clone, Copy)]
pub struct FixedConfidence(pub f64);

impl ConfidenceSampler for FixedConfidence {
    fn sample(&self) -> f64 {
        self.0
    }
}

// ==========================================
// WeightedCatalogProjection - 按目录比例分摊
// ==========================================
pub struct WeightedCatalogProjection {
    catalog: Vec<MaterialArchetype>, // 按比例降序
    confidence: Box<dyn ConfidenceSampler>,
}

impl WeightedCatalogProjection {
    pub fn new(
        mut catalog: Vec<MaterialArchetype>,
        confidence: Box<dyn ConfidenceSampler>,
    ) -> Self {
        // 稳定排序: 同比例保持目录顺序
        catalog.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        Self {
            catalog,
            confidence,
        }
    }

    /// 按配置构造 (随机置信度)
    pub fn from_config(config: &ReconcileConfig) -> Self {
        Self::new(
            config.material_catalog.clone(),
            Box::new(RandomConfidence::new(
                config.confidence_min,
                config.confidence_max,
            )),
        )
    }

    fn weight_sum(&self) -> f64 {
        self.catalog
            .iter()
            .map(|m| m.weight)
            .filter(|w| w.is_finite() && *w > 0.0)
            .sum()
    }
}

impl MaterialProjection for WeightedCatalogProjection {
    fn project(&self, seed_total: f64, n: usize) -> Vec<MaterialEstimate> {
        let weight_sum = self.weight_sum();
        if weight_sum <= 0.0 || !seed_total.is_finite() {
            return Vec::new();
        }

        self.catalog
            .iter()
            .take(n)
            .map(|archetype| {
                let share = archetype.weight.max(0.0) / weight_sum;
                MaterialEstimate {
                    material: archetype.name.clone(),
                    unit: archetype.unit.clone(),
                    quantity_estimate: round_to(seed_total * share, QUANTITY_DECIMALS),
                    confidence_estimate: self.confidence.sample(),
                }
            })
            .collect()
    }
}
