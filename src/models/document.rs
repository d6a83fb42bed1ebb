use serde::{Deserialize, Serialize};

/// A document held by the backend's vector database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manual {
    pub file_name: String,
}
