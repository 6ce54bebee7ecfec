use std::time::Duration;

pub fn get_utc_iso_datetime() -> String {
    let timestamp = chrono::Utc::now().to_rfc3339();
    return timestamp;
}

/// Seconds with two decimals, e.g. `1.25s`
pub fn format_elapsed(elapsed: Duration) -> String {
    return format!("{:.2}s", elapsed.as_secs_f64());
}
