//! Timestamp utilities

use chrono::{DateTime, Datelike, Utc};

/// Abbreviated month names used in month labels
pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Calendar month of a timestamp as `(year, zero-based month index)`
pub fn month_key(timestamp: &DateTime<Utc>) -> (i32, u32) {
    (timestamp.year(), timestamp.month0())
}

/// Format a month key as `"Mon YYYY"` (e.g. `"Mar 2024"`)
pub fn month_label(year: i32, month0: u32) -> String {
    let name = MONTH_NAMES
        .get(month0 as usize)
        .copied()
        .unwrap_or("???");
    format!("{} {}", name, year)
}
