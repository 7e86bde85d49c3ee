pub mod json;

use std::time::SystemTime;

use chrono::{DateTime, Datelike, Local, NaiveDateTime, Timelike};

/// Folder names for months 1..=12, in order.
pub const MONTH_NAMES: [&str; 12] = [
    "styczeń",
    "luty",
    "marzec",
    "kwiecień",
    "maj",
    "czerwiec",
    "lipiec",
    "sierpień",
    "wrzesień",
    "październik",
    "listopad",
    "grudzień",
];

/// Month folder name for a date.
pub fn month_name(date: &NaiveDateTime) -> &'static str {
    // month0() is always 0..=11
    MONTH_NAMES[date.month0() as usize]
}

/// Convert UTC epoch seconds to a local naive datetime.
pub fn local_from_epoch(epoch: i64) -> Option<NaiveDateTime> {
    let utc = DateTime::from_timestamp(epoch, 0)?;
    Some(utc.with_timezone(&Local).naive_local())
}

/// Convert a filesystem timestamp to a local naive datetime, truncated to whole seconds.
pub fn local_from_system_time(time: SystemTime) -> NaiveDateTime {
    let local: DateTime<Local> = time.into();
    let naive = local.naive_local();
    naive.with_nanosecond(0).unwrap_or(naive)
}
