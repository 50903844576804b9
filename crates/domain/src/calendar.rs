//! UTC 日历与日期键
//!
//! 所有按天分桶都以 UTC 为准，服务器本地时区不影响日界。

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

/// 活跃度窗口固定为 30 天（含今天）
pub const ACTIVITY_WINDOW_DAYS: u64 = 30;

/// 将时间截断到当天 UTC 零点
pub fn floor_to_day(t: DateTime<Utc>) -> DateTime<Utc> {
    t.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// 时间戳对应的 UTC 日期键
pub fn day_key(t: DateTime<Utc>) -> NaiveDate {
    t.date_naive()
}

/// 以某一天结尾的连续日期窗口 `[end - (len-1), end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl ActivityWindow {
    pub fn ending_at(now: DateTime<Utc>) -> Self {
        let end = day_key(now);
        let start = end - Days::new(ACTIVITY_WINDOW_DAYS - 1);
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// 窗口起点对应的 UTC 时刻，用作存储查询的下界
    pub fn start_instant(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// 按升序列出窗口内每一天
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(ACTIVITY_WINDOW_DAYS as usize)
    }

    /// 日期在窗口中的下标，窗口外返回 None
    pub fn index_of(&self, day: NaiveDate) -> Option<usize> {
        if day < self.start || day > self.end {
            return None;
        }
        usize::try_from((day - self.start).num_days()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn test_floor_to_day_zeroes_sub_day_components() {
        let t = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
        let floored = floor_to_day(t);
        assert_eq!(floored, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());
        assert_eq!(floored.hour(), 0);
        assert_eq!(floored.nanosecond(), 0);
    }

    #[test]
    fn test_window_covers_thirty_days_inclusive() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 8, 30, 0).unwrap();
        let window = ActivityWindow::ending_at(now);

        assert_eq!(window.end(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        // 跨越闰年二月
        assert_eq!(window.start(), NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());

        let days: Vec<_> = window.days().collect();
        assert_eq!(days.len(), 30);
        assert_eq!(days.first(), Some(&window.start()));
        assert_eq!(days.last(), Some(&window.end()));
        assert!(days.windows(2).all(|w| w[1] == w[0].succ_opt().unwrap()));
    }

    #[test]
    fn test_start_instant_is_midnight_utc() {
        let now = Utc.with_ymd_and_hms(2025, 1, 5, 0, 0, 1).unwrap();
        let window = ActivityWindow::ending_at(now);
        assert_eq!(
            window.start_instant(),
            Utc.with_ymd_and_hms(2024, 12, 7, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_index_of_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        let window = ActivityWindow::ending_at(now);

        assert_eq!(window.index_of(window.start()), Some(0));
        assert_eq!(window.index_of(window.end()), Some(29));
        assert_eq!(window.index_of(window.start().pred_opt().unwrap()), None);
        assert_eq!(window.index_of(window.end().succ_opt().unwrap()), None);
    }
}
