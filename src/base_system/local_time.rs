//! 本地时区偏移缓存。
//!
//! `time` 在多线程进程中拒绝读取本地时区，因此需在启动任何线程之前调用 `init`。

use std::sync::OnceLock;

use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

static LOCAL_OFFSET: OnceLock<UtcOffset> = OnceLock::new();

pub fn init() -> UtcOffset {
    *LOCAL_OFFSET.get_or_init(|| UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC))
}

pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_utc().to_offset(init())
}

/// `2024-05-01 13:45:10`
pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
    .unwrap_or_else(|_| at.to_string())
}
