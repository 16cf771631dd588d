// ==========================================
// 物资预测对账引擎 - 配置管理器
// ==========================================
// 职责: 从 config_kv 表读取对账配置覆写,叠加到默认值之上
// 存储: config_kv 表 (scope_id + key + value)
// ==========================================
// 规则:
// - 缺失的键使用默认值
// - 无法解析的值使用默认值并告警
// - 叠加后整体校验失败时整体回退到默认配置
// ==========================================

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::config::reconcile_config::{MaterialArchetype, ReconcileConfig};
use crate::db::{configure_sqlite_connection, ensure_config_schema, open_sqlite_connection};

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("配置库锁获取失败: {0}")]
    Lock(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_config_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA 并确保建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ConfigError::Lock(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            ensure_config_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::Lock(e.to_string()))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值 (UPSERT)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::Lock(e.to_string()))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::info!(key, value, "配置已更新");
        Ok(())
    }

    /// 读取 global scope 全部配置
    pub fn get_global_snapshot(&self) -> ConfigResult<HashMap<String, String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::Lock(e.to_string()))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    /// 加载对账配置 (默认值 + config_kv 覆写)
    pub fn load_reconcile_config(&self) -> ConfigResult<ReconcileConfig> {
        let snapshot = self.get_global_snapshot()?;
        let defaults = ReconcileConfig::default();
        let mut config = defaults.clone();

        config.thresholds.excellent = parse_or(
            &snapshot,
            config_keys::ACCURACY_EXCELLENT_PCT,
            defaults.thresholds.excellent,
        );
        config.thresholds.good = parse_or(
            &snapshot,
            config_keys::ACCURACY_GOOD_PCT,
            defaults.thresholds.good,
        );
        config.thresholds.fair = parse_or(
            &snapshot,
            config_keys::ACCURACY_FAIR_PCT,
            defaults.thresholds.fair,
        );
        config.percent_decimals = parse_or(
            &snapshot,
            config_keys::PERCENT_DECIMALS,
            defaults.percent_decimals,
        );
        config.top_materials_n = parse_or(
            &snapshot,
            config_keys::TOP_MATERIALS_N,
            defaults.top_materials_n,
        );
        config.confidence_min = parse_or(
            &snapshot,
            config_keys::CONFIDENCE_MIN_PCT,
            defaults.confidence_min,
        );
        config.confidence_max = parse_or(
            &snapshot,
            config_keys::CONFIDENCE_MAX_PCT,
            defaults.confidence_max,
        );

        if let Some(raw) = snapshot.get(config_keys::MATERIAL_CATALOG) {
            match serde_json::from_str::<Vec<MaterialArchetype>>(raw) {
                Ok(catalog) => config.material_catalog = catalog,
                Err(e) => tracing::warn!(
                    config_key = config_keys::MATERIAL_CATALOG,
                    raw_value = %raw,
                    error = %e,
                    "物资目录配置格式错误，使用默认目录"
                ),
            }
        }

        if let Err(reason) = config.validate() {
            tracing::warn!(
                reason = %reason,
                "对账配置校验失败，整体回退到默认配置"
            );
            return Ok(defaults);
        }

        Ok(config)
    }
}

/// 从快照解析配置值,缺失或非法时使用默认值
fn parse_or<T>(snapshot: &HashMap<String, String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy + std::fmt::Debug,
{
    match snapshot.get(key) {
        None => default,
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            tracing::warn!(
                config_key = key,
                raw_value = %raw,
                default = ?default,
                "配置值无法解析，使用默认值"
            );
            default
        }),
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 准确度分级阈值 (百分比)
    pub const ACCURACY_EXCELLENT_PCT: &str = "accuracy_excellent_pct";
    pub const ACCURACY_GOOD_PCT: &str = "accuracy_good_pct";
    pub const ACCURACY_FAIR_PCT: &str = "accuracy_fair_pct";

    // 百分比小数位
    pub const PERCENT_DECIMALS: &str = "percent_decimals";

    // 驾驶舱重点物资
    pub const TOP_MATERIALS_N: &str = "top_materials_n";
    pub const CONFIDENCE_MIN_PCT: &str = "confidence_min_pct";
    pub const CONFIDENCE_MAX_PCT: &str = "confidence_max_pct";
    pub const MATERIAL_CATALOG: &str = "material_catalog"; // JSON 数组
}
