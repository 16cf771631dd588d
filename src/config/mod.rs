// ==========================================
// 物资预测对账引擎 - 配置层
// ==========================================
// 职责: 对账常量 (阈值/小数位/物资目录) 的默认值与覆写
// 存储: config_kv 表 (global scope)
// ==========================================

pub mod config_manager;
pub mod reconcile_config;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigError, ConfigManager, ConfigResult};
pub use reconcile_config::{
    default_material_catalog, AccuracyThresholds, MaterialArchetype, ReconcileConfig,
};
