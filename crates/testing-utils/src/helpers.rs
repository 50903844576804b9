use chrono::{DateTime, Duration, TimeZone, Utc};

/// 测试统一使用的参考时刻：2024-06-15 10:30:00 UTC
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap()
}

pub fn days_ago(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::days(days)
}
