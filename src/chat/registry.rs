use crate::error::ClientError;
use crate::models::ChatSession;

/// In-memory cache of the user's threads plus the active thread id
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Vec<ChatSession>,
    active_id: Option<String>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Threads in the order the backend returned them
    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn set_active(&mut self, id: impl Into<String>) {
        self.active_id = Some(id.into());
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }

    pub fn clear(&mut self) {
        self.sessions.clear();
        self.active_id = None;
    }

    /// Outcome of `GET /chat/sessions`; the cache is only replaced on success
    pub fn apply_sessions(
        &mut self,
        result: Result<Vec<ChatSession>, ClientError>,
    ) -> Result<&[ChatSession], ClientError> {
        self.sessions = result?;
        Ok(&self.sessions)
    }

    /// Outcome of `GET /chat/new-session`; the new thread becomes active
    pub fn apply_created(
        &mut self,
        result: Result<String, ClientError>,
    ) -> Result<&str, ClientError> {
        let id = result?;
        Ok(self.active_id.insert(id).as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, title: &str) -> ChatSession {
        ChatSession { id: id.to_string(), title: title.to_string(), created_at: String::new() }
    }

    #[test]
    fn test_sessions_keep_server_order() {
        let mut registry = SessionRegistry::new();
        registry.apply_sessions(Ok(vec![session("z", "Last"), session("a", "First")])).unwrap();
        let ids: Vec<&str> = registry.sessions().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a"]);
        assert_eq!(registry.position("a"), Some(1));
        assert_eq!(registry.position("missing"), None);
    }

    #[test]
    fn test_failed_listing_keeps_cache() {
        let mut registry = SessionRegistry::new();
        registry.apply_sessions(Ok(vec![session("a", "A")])).unwrap();

        let err = ClientError::from_status(500, "");
        assert!(registry.apply_sessions(Err(err)).is_err());
        assert_eq!(registry.sessions().len(), 1);
        assert_eq!(registry.sessions()[0].id, "a");
    }

    #[test]
    fn test_created_thread_becomes_active() {
        let mut registry = SessionRegistry::new();
        registry.set_active("old");

        assert_eq!(registry.apply_created(Ok("t-42".to_string())).unwrap(), "t-42");
        assert_eq!(registry.active_id(), Some("t-42"));

        assert!(registry.apply_created(Err(ClientError::from_status(500, ""))).is_err());
        assert_eq!(registry.active_id(), Some("t-42"));
    }

    #[test]
    fn test_clear_drops_active_id() {
        let mut registry = SessionRegistry::new();
        registry.apply_sessions(Ok(vec![session("a", "A")])).unwrap();
        registry.set_active("a");
        registry.clear();
        assert!(registry.sessions().is_empty());
        assert_eq!(registry.active_id(), None);
    }
}
