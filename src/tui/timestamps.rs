use chrono::{DateTime, Datelike, Utc};

use crate::models::ChatSession;

/// Sidebar label for when a thread was created; empty when the backend value is unparseable
pub fn format_session_time(session: &ChatSession) -> String {
    session.created_at_utc().map(|ts| format_timestamp(&ts, &Utc::now())).unwrap_or_default()
}

/// Format timestamp with tiered display:
/// - Relative for <7 days: "2h ago", "3d ago"
/// - Absolute for ≥7 days: "Jan 15", "Dec 3, 2024"
///
/// Timestamps in the future (clock skew) read as "just now".
pub fn format_timestamp(timestamp: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(*timestamp).num_seconds().max(0);
    let (minutes, hours, days) = (seconds / 60, seconds / 3600, seconds / 86_400);

    match days {
        7.. if timestamp.year() == now.year() => timestamp.format("%b %-d").to_string(),
        7.. => timestamp.format("%b %-d, %Y").to_string(),
        1.. => format!("{}d ago", days),
        _ if hours > 0 => format!("{}h ago", hours),
        _ if minutes > 0 => format!("{}m ago", minutes),
        _ => "just now".to_string(),
    }
}
