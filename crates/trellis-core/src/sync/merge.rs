//! Field-level reconciliation of external records into local entities.
//!
//! All functions here are pure: they read both sides and return a diff
//! (field name → value to set). Applying the diff and persisting are the
//! caller's responsibility, which keeps dry-run previews and per-record
//! atomicity trivial. Conflicts are data, not errors.

use std::collections::BTreeMap;
use std::str::FromStr;

use tracing::warn;

use crate::catalog::CatalogError;
use crate::model::{FunctionalEntity, Person};

use super::record::{ExternalPersonRecord, ExternalRecord};

/// A merge result: fields to set on the local entity.
pub type MergeDiff = BTreeMap<String, String>;

/// Conflicting fields: name → (local value, external value).
pub type ConflictMap = BTreeMap<String, (String, String)>;

/// How external values are folded into local ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Field-class aware merge: local-authoritative fields untouched,
    /// external-fillable fields filled when blank, list fields unioned.
    #[default]
    Smart,
    /// Fill-if-empty applied uniformly to every field.
    LocalPriority,
    /// Overwrite everything except the identifier, timestamps and
    /// local-authoritative fields. Higher risk; explicit request only.
    ExternalPriority,
}

impl FromStr for MergePolicy {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "smart" => Ok(MergePolicy::Smart),
            "local" | "local_priority" => Ok(MergePolicy::LocalPriority),
            "external" | "external_priority" => Ok(MergePolicy::ExternalPriority),
            other => Err(CatalogError::Validation(format!(
                "unknown merge policy: {other:?}"
            ))),
        }
    }
}

/// Merge behavior class of one field under the smart policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldClass {
    /// Never overwritten by external data.
    LocalAuthoritative,
    /// Overwritten only when the local value is blank.
    ExternalFillable,
    /// Merged as a deduplicated, sorted token-set union.
    ListValued,
}

/// Every field the merge engine operates on. The canonical identifier is
/// deliberately absent: it is the catalog's primary key and never merged.
pub const MERGE_FIELDS: &[&str] = &[
    "title",
    "description",
    "status",
    "maturity",
    "module_hint",
    "epic_hint",
    "feature_hint",
    "critical",
    "focus",
    "test_links",
    "automation",
    "doc_links",
    "owners",
    "tags",
    "aliases",
    "subsystems",
];

fn field_class(field: &str) -> FieldClass {
    match field {
        "title" | "description" | "status" | "maturity" | "module_hint" | "epic_hint"
        | "feature_hint" => FieldClass::ExternalFillable,
        "tags" | "aliases" | "subsystems" => FieldClass::ListValued,
        _ => FieldClass::LocalAuthoritative,
    }
}

fn local_value(entity: &FunctionalEntity, field: &str) -> String {
    match field {
        "title" => entity.title.clone(),
        "description" => entity.description.clone(),
        "status" => entity.status.clone(),
        "maturity" => entity.maturity.clone(),
        "module_hint" => entity.module_hint.clone(),
        "epic_hint" => entity.epic_hint.clone(),
        "feature_hint" => entity.feature_hint.clone(),
        "critical" => entity.critical.to_string(),
        "focus" => entity.focus.to_string(),
        "test_links" => entity.test_links.clone(),
        "automation" => entity.automation.clone(),
        "doc_links" => entity.doc_links.clone(),
        "owners" => entity.owners.join(", "),
        "tags" => entity.tags.clone(),
        "aliases" => entity.aliases.clone(),
        "subsystems" => entity.subsystems.clone(),
        _ => String::new(),
    }
}

/// Splits a comma-separated token list, dropping blanks.
fn tokens(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Deduplicated, sorted set union of two comma-separated token lists.
/// Symmetric: argument order does not affect the result.
pub fn merge_token_lists(a: &str, b: &str) -> String {
    let mut union: Vec<String> = tokens(a);
    union.extend(tokens(b));
    union.sort();
    union.dedup();
    union.join(", ")
}

/// Computes the fields to set on `local` when folding in `external` under
/// the given policy. Pure; the caller applies the diff.
pub fn merge(
    local: &FunctionalEntity,
    external: &ExternalRecord,
    policy: MergePolicy,
) -> MergeDiff {
    let mut diff = MergeDiff::new();

    for &field in MERGE_FIELDS {
        let ext = external.field(field).trim();
        if ext.is_empty() {
            continue;
        }
        let loc = local_value(local, field);

        match policy {
            MergePolicy::Smart => match field_class(field) {
                FieldClass::LocalAuthoritative => {}
                FieldClass::ExternalFillable => {
                    if loc.trim().is_empty() {
                        diff.insert(field.to_string(), ext.to_string());
                    }
                }
                FieldClass::ListValued => {
                    // Only a union that actually adds tokens is a change;
                    // compare against the canonicalized local list.
                    let merged = merge_token_lists(&loc, ext);
                    if merged != merge_token_lists(&loc, "") {
                        diff.insert(field.to_string(), merged);
                    }
                }
            },
            MergePolicy::LocalPriority => {
                if loc.trim().is_empty() {
                    diff.insert(field.to_string(), ext.to_string());
                }
            }
            MergePolicy::ExternalPriority => {
                if field_class(field) != FieldClass::LocalAuthoritative && loc.trim() != ext {
                    diff.insert(field.to_string(), ext.to_string());
                }
            }
        }
    }

    diff
}

/// Flags every field where both sides hold different non-empty values.
///
/// Independent of any merge policy and always computable; conflicts are
/// surfaced for human review, never raised.
pub fn detect_conflicts(local: &FunctionalEntity, external: &ExternalRecord) -> ConflictMap {
    let mut conflicts = ConflictMap::new();

    for &field in MERGE_FIELDS {
        let ext = external.field(field).trim();
        if ext.is_empty() {
            continue;
        }
        let loc = local_value(local, field);
        let loc = loc.trim();
        if !loc.is_empty() && loc != ext {
            conflicts.insert(field.to_string(), (loc.to_string(), ext.to_string()));
        }
    }

    conflicts
}

/// Writes a diff back onto an entity. Unknown field names are skipped with
/// a warning; the timestamp is bumped only when something changed.
pub fn apply_diff(entity: &mut FunctionalEntity, diff: &MergeDiff) {
    if diff.is_empty() {
        return;
    }

    for (field, value) in diff {
        match field.as_str() {
            "title" => entity.title = value.clone(),
            "description" => entity.description = value.clone(),
            "status" => entity.status = value.clone(),
            "maturity" => entity.maturity = value.clone(),
            "module_hint" => entity.module_hint = value.clone(),
            "epic_hint" => entity.epic_hint = value.clone(),
            "feature_hint" => entity.feature_hint = value.clone(),
            "critical" => entity.critical = parse_flag(value),
            "focus" => entity.focus = parse_flag(value),
            "test_links" => entity.test_links = value.clone(),
            "automation" => entity.automation = value.clone(),
            "doc_links" => entity.doc_links = value.clone(),
            "owners" => entity.owners = tokens(value),
            "tags" => entity.tags = value.clone(),
            "aliases" => entity.aliases = value.clone(),
            "subsystems" => entity.subsystems = value.clone(),
            other => {
                warn!(field = other, "ignoring unknown field in merge diff");
            }
        }
    }

    entity.updated_at = chrono::Utc::now();
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "yes" | "1")
}

/// Merges an external person record into a local person.
///
/// Name, position and email follow the fill-if-empty rule. The external id
/// is always adopted; it is the join key for future syncs.
pub fn merge_person(local: &Person, external: &ExternalPersonRecord) -> MergeDiff {
    let mut diff = MergeDiff::new();

    let fillable = [
        ("name", local.name.as_str(), external.name.as_str()),
        ("position", local.position.as_str(), external.position.as_str()),
        ("email", local.email.as_str(), external.email.as_str()),
    ];
    for (field, loc, ext) in fillable {
        if loc.trim().is_empty() && !ext.trim().is_empty() {
            diff.insert(field.to_string(), ext.trim().to_string());
        }
    }

    if local.external_id.as_deref() != Some(external.external_id.as_str())
        && !external.external_id.trim().is_empty()
    {
        diff.insert("external_id".to_string(), external.external_id.clone());
    }

    diff
}

/// Writes a person diff back onto a person record.
pub fn apply_person_diff(person: &mut Person, diff: &MergeDiff) {
    for (field, value) in diff {
        match field.as_str() {
            "name" => person.name = value.clone(),
            "position" => person.position = value.clone(),
            "email" => person.email = value.clone(),
            "external_id" => person.external_id = Some(value.clone()),
            other => {
                warn!(field = other, "ignoring unknown field in person diff");
            }
        }
    }
}
