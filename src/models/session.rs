use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A conversation thread owned by the authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    #[serde(default)]
    pub title: String,
    /// Creation time exactly as the backend sent it
    #[serde(default)]
    pub created_at: String,
}

impl ChatSession {
    /// Parse `created_at` as RFC 3339, falling back to a naive ISO-8601 timestamp in UTC
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.trim();
        if let Ok(ts) = raw.parse::<DateTime<Utc>>() {
            return Some(ts);
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Title for list views; untitled threads fall back to their id
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() { &self.id } else { &self.title }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn session(created_at: &str) -> ChatSession {
        ChatSession {
            id: "abc".to_string(),
            title: String::new(),
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_created_at_rfc3339() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap();
        assert_eq!(session("2024-05-01T10:30:00Z").created_at_utc(), Some(expected));
    }

    #[test]
    fn test_created_at_naive_python_isoformat() {
        let parsed = session("2024-05-01T10:30:00.123456").created_at_utc().unwrap();
        assert_eq!(parsed.format("%Y-%m-%d %H:%M").to_string(), "2024-05-01 10:30");
    }

    #[test]
    fn test_created_at_garbage() {
        assert!(session("yesterday").created_at_utc().is_none());
    }

    #[test]
    fn test_display_title_falls_back_to_id() {
        assert_eq!(session("").display_title(), "abc");
    }
}
