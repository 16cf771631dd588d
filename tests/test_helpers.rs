// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时配置库、测试数据构造、外部协作方的内存实现
// ==========================================
#![allow(dead_code)]

use async_trait::async_trait;
use forecast_reconcile::db::{ensure_config_schema, open_sqlite_connection};
use forecast_reconcile::domain::{
    FixedClock, ForecastRecord, MaterialQuantities, PeriodKey, ProjectRef, RawForecastRecord,
    SharedClock,
};
use forecast_reconcile::services::{
    ActualsSink, ForecastSource, ProjectDirectory, SourceError, SourceResult,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;

/// 创建临时配置库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_config_schema(&conn)?;

    Ok((temp_file, db_path))
}

// ==========================================
// 测试数据构造
// ==========================================

pub fn p(raw: &str) -> PeriodKey {
    PeriodKey::parse(raw).unwrap()
}

pub fn quantities(pairs: &[(&str, f64)]) -> MaterialQuantities {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

pub fn record(project_id: &str, period: &str, pairs: &[(&str, f64)]) -> ForecastRecord {
    ForecastRecord::new(project_id, p(period), quantities(pairs))
}

/// 外部数据源形状的记录
pub fn raw_record(
    project_id: &str,
    month: &str,
    predictions: Value,
    actual_values: Value,
) -> RawForecastRecord {
    RawForecastRecord {
        project_id: project_id.to_string(),
        forecast_month: month.to_string(),
        predictions: predictions.as_object().cloned(),
        actual_values: actual_values.as_object().cloned(),
        ..RawForecastRecord::default()
    }
}

pub fn project(project_id: &str, status: &str) -> ProjectRef {
    ProjectRef::new(project_id, status)
}

pub fn clock_in(period: &str) -> SharedClock {
    Arc::new(FixedClock::in_period(p(period)))
}

// ==========================================
// 内存预测数据源
// ==========================================

/// 按脚本依次返回的数据源
///
/// 每次拉取弹出一条 (延迟, 记录);脚本耗尽后返回最后一次的数据
pub struct ScriptedSource {
    script: Mutex<VecDeque<(Duration, Vec<RawForecastRecord>)>>,
    last: Mutex<Vec<RawForecastRecord>>,
    fail: AtomicBool,
}

impl ScriptedSource {
    pub fn new(records: Vec<RawForecastRecord>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(records),
            fail: AtomicBool::new(false),
        }
    }

    pub fn push_response(&self, delay: Duration, records: Vec<RawForecastRecord>) {
        self.script.lock().unwrap().push_back((delay, records));
    }

    pub fn set_records(&self, records: Vec<RawForecastRecord>) {
        *self.last.lock().unwrap() = records;
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ForecastSource for ScriptedSource {
    async fn fetch_records(&self) -> SourceResult<Vec<RawForecastRecord>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable("forecast source offline".to_string()));
        }

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some((delay, records)) => {
                tokio::time::sleep(delay).await;
                *self.last.lock().unwrap() = records.clone();
                Ok(records)
            }
            None => Ok(self.last.lock().unwrap().clone()),
        }
    }
}

// ==========================================
// 记录型实际值落库
// ==========================================
#[derive(Default)]
pub struct RecordingSink {
    persisted: Mutex<Vec<ForecastRecord>>,
    fail: AtomicBool,
    delay: Mutex<Duration>, // 模拟慢速落库
}

impl RecordingSink {
    pub fn persisted(&self) -> Vec<ForecastRecord> {
        self.persisted.lock().unwrap().clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }
}

#[async_trait]
impl ActualsSink for RecordingSink {
    async fn persist_actuals(&self, record: &ForecastRecord) -> SourceResult<()> {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(SourceError::Rejected("actuals write refused".to_string()));
        }
        self.persisted.lock().unwrap().push(record.clone());
        Ok(())
    }
}

// ==========================================
// 静态项目目录
// ==========================================
pub struct StaticDirectory {
    projects: Mutex<Vec<ProjectRef>>,
}

impl StaticDirectory {
    pub fn new(projects: Vec<ProjectRef>) -> Self {
        Self {
            projects: Mutex::new(projects),
        }
    }
}

#[async_trait]
impl ProjectDirectory for StaticDirectory {
    async fn list_projects(&self) -> SourceResult<Vec<ProjectRef>> {
        Ok(self.projects.lock().unwrap().clone())
    }
}
