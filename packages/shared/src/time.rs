//! Time-related utilities.

use chrono::{DateTime, FixedOffset, TimeZone, Utc};

const JST_OFFSET_SECS: i32 = 9 * 3600;

fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).expect("JST is UTC+9")
}

/// Get current Unix timestamp (milliseconds)
pub fn get_jst_timestamp() -> i64 {
    let now_jst: DateTime<FixedOffset> = Utc::now().with_timezone(&jst());
    now_jst.timestamp_millis()
}

/// Convert Unix timestamp (milliseconds) to a JST `HH:MM:SS` clock string
pub fn timestamp_to_jst_clock(timestamp_millis: i64) -> String {
    match jst().timestamp_millis_opt(timestamp_millis).single() {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}
