use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A responsible party. Referenced weakly by entities, never owned by them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub email: String,
    /// Identifier of this person in the external tracker (sync join key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            position: String::new(),
            email: String::new(),
            external_id: None,
        }
    }
}
