//! Relative "created … ago" labels kept fresh by the periodic refresh.

use chrono::{DateTime, Utc};

/// Formats the age of `created_at` relative to `now`.
///
/// Future timestamps (clock skew between client and store) read as `just now`.
pub fn recency_label(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(created_at);
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return plural(minutes, "minute");
    }
    let hours = elapsed.num_hours();
    if hours < 24 {
        return plural(hours, "hour");
    }
    let days = elapsed.num_days();
    if days < 30 {
        return plural(days, "day");
    }
    created_at.format("%Y-%m-%d").to_string()
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}
