// ==========================================
// 物资预测对账引擎 - 引擎状态句柄
// ==========================================
// 职责: 持有当前生效的 (预测索引 + 项目目录) 快照
// 红线: 读者只能看到完整构建的旧状态或新状态,不暴露半成品
// 红线: 并发刷新按票号丢弃过期结果 (后发布的旧票号不覆盖新状态)
// ==========================================
// 锁: std RwLock,只在替换/克隆 Arc 时短暂持有,不跨 await
// ==========================================

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::project::ProjectRef;
use crate::engine::store::ForecastStore;

/// 状态锁错误
#[derive(Error, Debug)]
#[error("引擎状态锁获取失败: {0}")]
pub struct StateLockError(pub String);

// ==========================================
// EngineState - 一次刷新得到的完整状态
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct EngineState {
    pub store: ForecastStore,
    pub projects: Vec<ProjectRef>,
    pub generation: u64,                      // 发布时的票号,0 = 从未刷新
    pub refresh_id: Option<String>,           // 发布该状态的刷新任务ID
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl EngineState {
    pub fn new(store: ForecastStore, projects: Vec<ProjectRef>) -> Self {
        Self {
            store,
            projects,
            ..Self::default()
        }
    }

    pub fn is_refreshed(&self) -> bool {
        self.generation > 0
    }
}

/// 刷新票据
///
/// 票号单调递增,发布时与当前状态的票号比较
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTicket {
    pub refresh_id: String,
    pub generation: u64,
}

// ==========================================
// EngineStateHandle - 原子替换的状态句柄
// ==========================================
pub struct EngineStateHandle {
    current: RwLock<Arc<EngineState>>,
    issued: AtomicU64,
}

impl Default for EngineStateHandle {
    fn default() -> Self {
        Self::new(EngineState::default())
    }
}

impl EngineStateHandle {
    pub fn new(initial: EngineState) -> Self {
        let issued = initial.generation;
        Self {
            current: RwLock::new(Arc::new(initial)),
            issued: AtomicU64::new(issued),
        }
    }

    /// 当前状态快照 (只克隆 Arc)
    pub fn snapshot(&self) -> Result<Arc<EngineState>, StateLockError> {
        let guard = self
            .current
            .read()
            .map_err(|e| StateLockError(e.to_string()))?;
        Ok(Arc::clone(&guard))
    }

    /// 领取刷新票据
    pub fn begin_refresh(&self) -> RefreshTicket {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let ticket = RefreshTicket {
            refresh_id: Uuid::new_v4().to_string(),
            generation,
        };
        debug!(
            refresh_id = %ticket.refresh_id,
            generation,
            "领取刷新票据"
        );
        ticket
    }

    /// 发布刷新结果
    ///
    /// # 返回
    /// - `Ok(true)`: 已替换为新状态
    /// - `Ok(false)`: 已有更新的刷新发布,本次结果丢弃
    pub fn publish(
        &self,
        ticket: &RefreshTicket,
        mut state: EngineState,
    ) -> Result<bool, StateLockError> {
        let mut guard = self
            .current
            .write()
            .map_err(|e| StateLockError(e.to_string()))?;

        if guard.generation >= ticket.generation {
            warn!(
                refresh_id = %ticket.refresh_id,
                ticket = ticket.generation,
                published = guard.generation,
                "刷新结果已过期,丢弃"
            );
            return Ok(false);
        }

        state.generation = ticket.generation;
        state.refresh_id = Some(ticket.refresh_id.clone());
        state.refreshed_at = Some(Utc::now());

        info!(
            refresh_id = %ticket.refresh_id,
            generation = ticket.generation,
            records = state.store.len(),
            projects = state.projects.len(),
            "引擎状态已发布"
        );
        *guard = Arc::new(state);
        Ok(true)
    }

    /// 在当前状态的副本上执行修改并整体替换 (写时复制)
    ///
    /// 闭包返回错误时不替换状态
    pub fn update<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut EngineState) -> Result<T, E>,
        E: From<StateLockError>,
    {
        let mut guard = self
            .current
            .write()
            .map_err(|e| StateLockError(e.to_string()))?;

        let mut next = EngineState::clone(&guard);
        let output = f(&mut next)?;
        *guard = Arc::new(next);
        Ok(output)
    }
}
