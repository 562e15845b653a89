use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A loosely-typed entity record from an external tracker.
///
/// Adapters deal with pagination and authentication; the core only ever sees
/// materialized records keyed by the tracker's own id. Field names follow
/// the catalog's field names (`title`, `status`, `tags`, ...); anything the
/// merge engine does not know is carried along untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalRecord {
    pub external_id: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl ExternalRecord {
    pub fn new(external_id: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// The value of a field, or empty when absent.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// A person record from an external tracker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalPersonRecord {
    pub external_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub email: String,
}
