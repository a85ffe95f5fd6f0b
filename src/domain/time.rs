use chrono::{DateTime, TimeZone, Timelike, Utc};

pub fn to_datetime(timestamp: u64) -> DateTime<Utc> {
    Utc.timestamp_opt(timestamp as i64, 0)
        .single()
        .unwrap_or_default()
}

/// "h:mm:ss a M/D", the order table format.
pub fn format_timestamp(timestamp: u64) -> String {
    to_datetime(timestamp)
        .format("%-I:%M:%S %P %-m/%-d")
        .to_string()
}

/// Start of the hour containing `timestamp`, as a unix timestamp.
pub fn hour_bucket(timestamp: u64) -> u64 {
    let dt = to_datetime(timestamp);
    let start = dt
        .with_minute(0)
        .and_then(|d| d.with_second(0))
        .unwrap_or(dt);
    start.timestamp() as u64
}

pub fn now_ts() -> u64 {
    Utc::now().timestamp().max(0) as u64
}
