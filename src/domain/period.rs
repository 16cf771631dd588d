// ==========================================
// 物资预测对账引擎 - 月份键 (Period Key)
// ==========================================
// 职责: 日历月份标识 (YYYY-MM) 的解析、比较与格式化
// 红线: 非法字符串必须报错,不允许静默默认
// ==========================================

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::engine::error::ForecastError;

// ==========================================
// PeriodKey - 月份键
// ==========================================
// 字段顺序 (year, month) 保证派生的 Ord 即为时间顺序,
// 与 YYYY-MM 字符串的字典序一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeriodKey {
    year: i32,
    month: u32,
}

impl PeriodKey {
    /// 由年月构造
    ///
    /// # 返回
    /// - `None`: 年份不在 0000..=9999 或月份不在 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if !(0..=9999).contains(&year) || !(1..=12).contains(&month) {
            return None;
        }
        Some(Self { year, month })
    }

    /// 解析 `YYYY-MM` 字符串
    ///
    /// 严格格式: 4 位年 + '-' + 2 位月,不接受首尾空白或其他分隔符
    pub fn parse(raw: &str) -> Result<Self, ForecastError> {
        let invalid = || ForecastError::InvalidPeriod {
            raw: raw.to_string(),
        };

        let bytes = raw.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(invalid());
        }
        let digits_ok = bytes[..4]
            .iter()
            .chain(bytes[5..].iter())
            .all(|b| b.is_ascii_digit());
        if !digits_ok {
            return Err(invalid());
        }

        let year: i32 = raw[..4].parse().map_err(|_| invalid())?;
        let month: u32 = raw[5..].parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }

    /// 日期所在月份
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// 月份简称 (例如 "Jun"),用于趋势图横轴
    pub fn month_abbr(&self) -> &'static str {
        const ABBR: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        ABBR[(self.month - 1) as usize]
    }

    /// 展示标签 (例如 "Jun 2024")
    pub fn label(&self) -> String {
        format!("{} {:04}", self.month_abbr(), self.year)
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for PeriodKey {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PeriodKey {
    type Error = ForecastError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PeriodKey> for String {
    fn from(value: PeriodKey) -> Self {
        value.to_string()
    }
}

// ==========================================
// Clock - 时间源
// ==========================================
// 当前月份由注入的时间源决定,引擎内部不直接读系统时钟
pub trait Clock: Send + Sync {
    /// 当前时刻 (UTC)
    fn now(&self) -> DateTime<Utc>;

    /// 当前日期 (UTC)
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// 当前月份
    fn current_period(&self) -> PeriodKey {
        PeriodKey::from_date(self.today())
    }
}

/// 系统时钟
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定时钟 (测试/回放)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    instant: DateTime<Utc>,
}

impl FixedClock {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self { instant }
    }

    /// 固定在某月 15 日正午
    pub fn in_period(period: PeriodKey) -> Self {
        let instant = NaiveDate::from_ymd_opt(period.year(), period.month(), 15)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .map(|dt| Utc.from_utc_datetime(&dt))
            .unwrap_or_default();
        Self { instant }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.instant
    }
}

/// 共享时间源
pub type SharedClock = Arc<dyn Clock>;
