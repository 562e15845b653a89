use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::catalog::CatalogError;

/// The kind of a functional entity in the catalog.
///
/// Kinds form the expected hierarchy Module → Epic → Feature → Story, with
/// Page/Element for UI inventory and Service for backend dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Module,
    Epic,
    Feature,
    Story,
    Page,
    Element,
    Service,
}

impl EntityKind {
    /// All kinds, in hierarchy order.
    pub const ALL: &'static [EntityKind] = &[
        EntityKind::Module,
        EntityKind::Epic,
        EntityKind::Feature,
        EntityKind::Story,
        EntityKind::Page,
        EntityKind::Element,
        EntityKind::Service,
    ];

    /// The namespace prefix used in canonical identifiers.
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityKind::Module => "MOD",
            EntityKind::Epic => "EPIC",
            EntityKind::Feature => "FEAT",
            EntityKind::Story => "STORY",
            EntityKind::Page => "PAGE",
            EntityKind::Element => "ELEM",
            EntityKind::Service => "SVC",
        }
    }

    /// Expected number of dot-separated segments in a canonical identifier
    /// of this kind. Deviations are tolerated (legacy data), never rejected.
    pub fn expected_segments(&self) -> usize {
        match self {
            EntityKind::Module | EntityKind::Service => 1,
            EntityKind::Epic | EntityKind::Page => 2,
            EntityKind::Feature | EntityKind::Element => 3,
            EntityKind::Story => 4,
        }
    }

    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Module => "Module",
            EntityKind::Epic => "Epic",
            EntityKind::Feature => "Feature",
            EntityKind::Story => "Story",
            EntityKind::Page => "Page",
            EntityKind::Element => "Element",
            EntityKind::Service => "Service",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for EntityKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "module" | "mod" => Ok(EntityKind::Module),
            "epic" => Ok(EntityKind::Epic),
            "feature" | "feat" => Ok(EntityKind::Feature),
            "story" => Ok(EntityKind::Story),
            "page" => Ok(EntityKind::Page),
            "element" | "elem" => Ok(EntityKind::Element),
            "service" | "svc" => Ok(EntityKind::Service),
            other => Err(CatalogError::Validation(format!(
                "unknown entity kind: {other:?}"
            ))),
        }
    }
}

/// A catalog record representing one unit of product functionality.
///
/// The canonical identifier `id` is the primary key and the stable format
/// contract of the catalog. Ancestry hints (`module_hint`, `epic_hint`,
/// `feature_hint`) are free text naming presumed ancestors by title; they
/// may be stale, absent, or inconsistent with the real graph, and are
/// consumed only by the hierarchy resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionalEntity {
    /// Canonical identifier, unique per catalog (e.g. `FEAT:FRONTEND.AUTH.LOGIN`).
    pub id: String,
    /// Entity kind.
    pub kind: EntityKind,
    /// Display title.
    pub title: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Free-text lifecycle status (e.g. "in development", "released").
    #[serde(default)]
    pub status: String,
    /// Free-text maturity level.
    #[serde(default)]
    pub maturity: String,
    /// Explicit parent entity id, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Ancestry hint: title of the presumed owning module.
    #[serde(default)]
    pub module_hint: String,
    /// Ancestry hint: title of the presumed owning epic.
    #[serde(default)]
    pub epic_hint: String,
    /// Ancestry hint: title of the presumed owning feature.
    #[serde(default)]
    pub feature_hint: String,
    /// Marks business-critical functionality.
    #[serde(default)]
    pub critical: bool,
    /// Marks current testing focus.
    #[serde(default)]
    pub focus: bool,
    /// Comma-separated test-case links.
    #[serde(default)]
    pub test_links: String,
    /// Free-text automation status (e.g. "manual", "automated").
    #[serde(default)]
    pub automation: String,
    /// Comma-separated documentation links.
    #[serde(default)]
    pub doc_links: String,
    /// Weak references to responsible Person records by id.
    #[serde(default)]
    pub owners: Vec<String>,
    /// Comma-separated tag list.
    #[serde(default)]
    pub tags: String,
    /// Comma-separated alternative names.
    #[serde(default)]
    pub aliases: String,
    /// Comma-separated subsystem list.
    #[serde(default)]
    pub subsystems: String,
    /// Identifier of this entity in the external tracker (sync join key).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FunctionalEntity {
    /// Creates a new entity with the given identity and empty attributes.
    pub fn new(id: impl Into<String>, kind: EntityKind, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            description: String::new(),
            status: String::new(),
            maturity: String::new(),
            parent: None,
            module_hint: String::new(),
            epic_hint: String::new(),
            feature_hint: String::new(),
            critical: false,
            focus: false,
            test_links: String::new(),
            automation: String::new(),
            doc_links: String::new(),
            owners: Vec::new(),
            tags: String::new(),
            aliases: String::new(),
            subsystems: String::new(),
            external_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the canonical identifier has the segment count expected for
    /// this kind. Informational only.
    pub fn id_shape_matches(&self) -> bool {
        let body = self.id.split_once(':').map(|(_, b)| b).unwrap_or(&self.id);
        let segments = body.split('.').filter(|s| !s.is_empty()).count();
        segments == self.kind.expected_segments()
    }
}
