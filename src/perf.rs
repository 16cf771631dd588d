// ==========================================
// 物资预测对账引擎 - 性能统计
// ==========================================
// 职责: 记录操作耗时 (target = "perf"),超过阈值时告警
// 开关:
// - `FORECAST_RECONCILE_PERF=0` 关闭耗时日志 (默认开启)
// - `FORECAST_RECONCILE_SLOW_OP_MS=200` 慢操作阈值 (毫秒)
// 红线: 嵌套深度记在线程局部,Guard 不得跨 .await 持有
// ==========================================

use std::cell::Cell;
use std::sync::OnceLock;
use std::time::Instant;

thread_local! {
    static PERF_DEPTH: Cell<u32> = Cell::new(0);
}

#[derive(Debug, Clone, Copy)]
struct PerfSettings {
    enabled: bool,
    slow_op_ms: u64,
}

static SETTINGS: OnceLock<PerfSettings> = OnceLock::new();

fn is_true(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

fn settings() -> PerfSettings {
    *SETTINGS.get_or_init(|| {
        let enabled = std::env::var("FORECAST_RECONCILE_PERF")
            .map(|v| is_true(&v))
            .unwrap_or(true);
        let slow_op_ms = std::env::var("FORECAST_RECONCILE_SLOW_OP_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 });
        PerfSettings {
            enabled,
            slow_op_ms,
        }
    })
}

/// 当前线程上未结束的 PerfGuard 数量
pub(crate) fn current_depth() -> u32 {
    PERF_DEPTH.with(Cell::get)
}

/// 性能统计 Guard: drop 时记录 elapsed_ms
///
/// 使用方式：
/// ```ignore
/// let _perf = forecast_reconcile::perf::PerfGuard::new("dashboard");
/// // do work...
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    depth: u32, // 嵌套深度,外层为 1
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        let depth = PERF_DEPTH.with(|d| {
            let next = d.get().saturating_add(1);
            d.set(next);
            next
        });
        Self {
            op,
            start: Instant::now(),
            depth,
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));

        let settings = settings();
        if !settings.enabled {
            return;
        }

        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        if settings.slow_op_ms > 0 && elapsed_ms >= settings.slow_op_ms {
            tracing::warn!(
                target: "perf",
                op = self.op,
                elapsed_ms,
                depth = self.depth,
                threshold_ms = settings.slow_op_ms,
                "slow op"
            );
        } else {
            tracing::info!(
                target: "perf",
                op = self.op,
                elapsed_ms,
                depth = self.depth,
                "done"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_true() {
        assert!(is_true(" ON "));
        assert!(is_true("1"));
        assert!(!is_true("0"));
        assert!(!is_true("off"));
    }

    #[test]
    fn test_nested_guards_track_depth() {
        let outer = PerfGuard::new("outer");
        {
            let inner = PerfGuard::new("inner");
            assert_eq!(inner.depth, outer.depth + 1);
        }
        let sibling = PerfGuard::new("sibling");
        assert_eq!(sibling.depth, outer.depth + 1);

        drop(sibling);
        drop(outer);
        assert_eq!(current_depth(), 0);
    }
}
