use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The semantic kind of a relation between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationKind {
    /// Parent/child containment in the functional hierarchy.
    Hierarchy,
    /// Functional dependency between features.
    Functional,
    /// A page contains or uses an element.
    PageElement,
    /// An entity depends on a backend service.
    ServiceDependency,
    /// A test case covers an entity.
    TestCoverage,
    /// A bug is linked to an entity.
    BugLink,
    /// A document describes an entity.
    DocLink,
    /// Anything user-defined.
    Custom,
}

impl std::str::FromStr for RelationKind {
    type Err = crate::catalog::CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hierarchy" => Ok(RelationKind::Hierarchy),
            "functional" => Ok(RelationKind::Functional),
            "page-element" => Ok(RelationKind::PageElement),
            "service-dependency" => Ok(RelationKind::ServiceDependency),
            "test-coverage" => Ok(RelationKind::TestCoverage),
            "bug-link" => Ok(RelationKind::BugLink),
            "doc-link" => Ok(RelationKind::DocLink),
            "custom" => Ok(RelationKind::Custom),
            other => Err(crate::catalog::CatalogError::Validation(format!(
                "unknown relation kind: {other:?}"
            ))),
        }
    }
}

impl RelationKind {
    /// Stable string slug, used in graph output and serialized records.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Hierarchy => "hierarchy",
            RelationKind::Functional => "functional",
            RelationKind::PageElement => "page-element",
            RelationKind::ServiceDependency => "service-dependency",
            RelationKind::TestCoverage => "test-coverage",
            RelationKind::BugLink => "bug-link",
            RelationKind::DocLink => "doc-link",
            RelationKind::Custom => "custom",
        }
    }
}

/// A directed, typed edge between two catalog entities.
///
/// Relations are soft-deleted: `deactivate` clears the `active` flag but the
/// record stays for audit history and safe re-synchronization. At most one
/// active relation may exist per (source, target, kind).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    /// Record id (uuid), distinct from the entity identifiers it connects.
    pub id: String,
    /// Source entity id.
    pub source: String,
    /// Target entity id.
    pub target: String,
    pub kind: RelationKind,
    /// Whether direction is meaningful for consumers.
    #[serde(default = "default_directed")]
    pub directed: bool,
    /// Display/confidence weight.
    #[serde(default = "default_weight")]
    pub weight: f32,
    /// Where this relation came from (user, migration, resolver).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Soft-delete flag.
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_directed() -> bool {
    true
}

fn default_weight() -> f32 {
    1.0
}

fn default_active() -> bool {
    true
}

impl Relation {
    /// Creates a new active relation with default direction and weight.
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        kind: RelationKind,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            source: source.into(),
            target: target.into(),
            kind,
            directed: true,
            weight: 1.0,
            origin: None,
            note: None,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the provenance marker.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}
