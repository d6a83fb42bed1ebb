use serde::{Deserialize, Serialize};

/// Author of a transcript entry
///
/// The backend may store other roles; anything that is not `user` is shown as the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Role {
    User,
    Assistant,
}

impl From<String> for Role {
    fn from(role: String) -> Self {
        if role.eq_ignore_ascii_case("user") { Role::User } else { Role::Assistant }
    }
}

/// Citation attached to an assistant reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceNode {
    #[serde(default)]
    pub text: String,
    /// Relevance score as sent by the backend (number or numeric string)
    #[serde(default, deserialize_with = "crate::models::deserializers::deserialize_score")]
    pub score: String,
}

impl SourceNode {
    /// Score rendered with two decimals, or verbatim when it is not numeric
    pub fn display_score(&self) -> String {
        match self.score.trim().parse::<f64>() {
            Ok(value) => format!("{:.2}", value),
            Err(_) => self.score.clone(),
        }
    }
}

/// One entry of a thread transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "crate::models::deserializers::deserialize_nullable_list"
    )]
    pub source_nodes: Vec<SourceNode>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), source_nodes: Vec::new() }
    }

    pub fn assistant(content: impl Into<String>, source_nodes: Vec<SourceNode>) -> Self {
        Self { role: Role::Assistant, content: content.into(), source_nodes }
    }

    pub fn has_sources(&self) -> bool {
        !self.source_nodes.is_empty()
    }
}
