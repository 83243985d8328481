use std::cell::Cell;

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Utc};

const WEEKDAYS: [&str; 7] = ["周日", "周一", "周二", "周三", "周四", "周五", "周六"];

/// Source of "now" in epoch milliseconds
pub trait Clock {
    fn now_ms(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to. Used by tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<i64>,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        ManualClock {
            now: Cell::new(start_ms),
        }
    }

    pub fn set(&self, ms: i64) {
        self.now.set(ms);
    }

    pub fn advance(&self, ms: i64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

/// Epoch milliseconds as a local date-time. Out-of-range values fall back to the epoch.
pub fn local_datetime(ms: i64) -> DateTime<Local> {
    Local
        .timestamp_millis_opt(ms)
        .earliest()
        .unwrap_or_else(|| DateTime::<Utc>::default().with_timezone(&Local))
}

/// Archive bucket key: `2025年03月07日` (local calendar day)
pub fn date_key(ms: i64) -> String {
    let d = local_datetime(ms);
    format!("{}年{:02}月{:02}日", d.year(), d.month(), d.day())
}

/// Completion time tag: `09:05` (local time)
pub fn time_tag(ms: i64) -> String {
    let d = local_datetime(ms);
    format!("{:02}:{:02}", d.hour(), d.minute())
}

/// Header clock line: `03-07 周五 09:05:33`
pub fn header_clock(ms: i64) -> String {
    let d = local_datetime(ms);
    let weekday = WEEKDAYS[d.weekday().num_days_from_sunday() as usize];
    format!(
        "{:02}-{:02} {} {:02}:{:02}:{:02}",
        d.month(),
        d.day(),
        weekday,
        d.hour(),
        d.minute(),
        d.second()
    )
}

/// Default export file name: `mytasks_backup_202537.json` (no zero padding)
pub fn backup_file_name(ms: i64) -> String {
    let d = local_datetime(ms);
    format!("mytasks_backup_{}{}{}.json", d.year(), d.month(), d.day())
}
