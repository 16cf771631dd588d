// ==========================================
// 物资预测对账引擎 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 准确度等级 (Accuracy Status)
// ==========================================
// 红线: 等级由 accuracy_percentage 按阈值确定性分桶
// 默认阈值: Excellent >= 95, Good >= 90, Fair >= 80, 其余 Poor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AccuracyStatus {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl AccuracyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccuracyStatus::Excellent => "Excellent",
            AccuracyStatus::Good => "Good",
            AccuracyStatus::Fair => "Fair",
            AccuracyStatus::Poor => "Poor",
        }
    }
}

impl fmt::Display for AccuracyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 四舍五入到指定小数位 (half away from zero)
///
/// `f64::round` 本身即为远离零取整,这里只做缩放
pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
