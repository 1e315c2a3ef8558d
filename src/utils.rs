//! Utility functions
//!
//! Formatting helpers for the end-of-run summary.

use std::time::Duration;

/// Wall-clock time for the summary: "12.3 sec" under a minute, "4 min 7 sec" after
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 60 {
        format!("{:.1} sec", elapsed.as_secs_f64())
    } else {
        format!("{} min {} sec", secs / 60, secs % 60)
    }
}

/// Share of `part` in `total` as a percentage string, "0.00%" when total is zero
pub fn format_percent(part: u64, total: u64) -> String {
    if total == 0 {
        return "0.00%".to_string();
    }
    format!("{:.2}%", 100.0 * part as f64 / total as f64)
}
