//! Hierarchy inference from denormalized ancestry hints.
//!
//! Ancestry hints are free text naming a presumed ancestor by title. They
//! are edited independently of the real graph and routinely diverge from it;
//! the resolver's job is to tolerate that and still recover structure. A
//! hint that resolves to nothing is a valid outcome, never an error: the
//! entity simply stays a root in the view.

use regex::Regex;
use tracing::trace;

use crate::catalog::ident;
use crate::model::{EntityKind, FunctionalEntity, Relation, RelationKind};

/// Matches a leading bracketed type token such as `[MOD]`, `(Epic)` or
/// `[feature]` in titles and hints.
const TYPE_TOKEN_PATTERN: &str =
    r"(?i)^\s*[\[(](?:mod(?:ule)?|epic|feat(?:ure)?|story|page|elem(?:ent)?|svc|service)[\])]\s*";

/// Resolves ancestor references from free-text hints.
///
/// Matching runs as an ordered cascade; the first tier that produces a match
/// wins and no cross-tier scoring happens. Candidate scans are linear,
/// O(N·M) over entities and hints, which is acceptable at the target scale
/// of low thousands of entities.
pub struct HierarchyResolver {
    type_token: Option<Regex>,
}

impl HierarchyResolver {
    pub fn new() -> Self {
        Self {
            type_token: Regex::new(TYPE_TOKEN_PATTERN).ok(),
        }
    }

    /// Finds the entity a hint most plausibly refers to, among candidates of
    /// the expected kind.
    ///
    /// Cascade, first match wins:
    /// 1. exact case-insensitive title match;
    /// 2. title match after stripping bracketed type tokens from both sides;
    /// 3. normalized hint is a prefix of the candidate's identifier body;
    /// 4. substring containment in either direction (lowest confidence).
    pub fn find_ancestor<'a>(
        &self,
        candidates: &'a [FunctionalEntity],
        hint: &str,
        expected: EntityKind,
    ) -> Option<&'a FunctionalEntity> {
        let hint = hint.trim();
        if hint.is_empty() {
            return None;
        }

        let hint_lower = hint.to_lowercase();
        let pool = || candidates.iter().filter(move |e| e.kind == expected);

        for entity in pool() {
            if entity.title.to_lowercase() == hint_lower {
                trace!(hint, id = %entity.id, "ancestor matched by exact title");
                return Some(entity);
            }
        }

        let bare_hint = self.strip_type_token(hint).to_lowercase();
        if !bare_hint.is_empty() {
            for entity in pool() {
                if self.strip_type_token(&entity.title).to_lowercase() == bare_hint {
                    trace!(hint, id = %entity.id, "ancestor matched after token strip");
                    return Some(entity);
                }
            }
        }

        let normalized = ident::normalize_segment(hint);
        if normalized != ident::PLACEHOLDER_SEGMENT {
            for entity in pool() {
                if ident::id_body(&entity.id).starts_with(&normalized) {
                    trace!(hint, id = %entity.id, "ancestor matched by id prefix");
                    return Some(entity);
                }
            }
        }

        for entity in pool() {
            let title_lower = entity.title.to_lowercase();
            if !title_lower.is_empty()
                && (title_lower.contains(&hint_lower) || hint_lower.contains(&title_lower))
            {
                trace!(hint, id = %entity.id, "ancestor matched by substring");
                return Some(entity);
            }
        }

        None
    }

    /// Recovers the most trustworthy parent for an entity.
    ///
    /// Signal priority: explicit parent reference, then active hierarchy
    /// relations, then ancestry hints from the most specific level down.
    pub fn resolve_parent<'a>(
        &self,
        entity: &FunctionalEntity,
        entities: &'a [FunctionalEntity],
        relations: &[Relation],
    ) -> Option<&'a FunctionalEntity> {
        if let Some(parent_id) = &entity.parent {
            if let Some(parent) = entities.iter().find(|e| &e.id == parent_id) {
                if parent.id != entity.id {
                    return Some(parent);
                }
            }
        }

        for relation in relations {
            if relation.active
                && relation.kind == RelationKind::Hierarchy
                && relation.target == entity.id
            {
                if let Some(parent) = entities.iter().find(|e| e.id == relation.source) {
                    if parent.id != entity.id {
                        return Some(parent);
                    }
                }
            }
        }

        let hint_levels = [
            (&entity.feature_hint, EntityKind::Feature),
            (&entity.epic_hint, EntityKind::Epic),
            (&entity.module_hint, EntityKind::Module),
        ];
        for (hint, expected) in hint_levels {
            if let Some(parent) = self.find_ancestor(entities, hint, expected) {
                if parent.id != entity.id {
                    return Some(parent);
                }
            }
        }

        None
    }

    fn strip_type_token<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        let Some(type_token) = &self.type_token else {
            return std::borrow::Cow::Borrowed(text.trim());
        };
        match type_token.replace(text, "") {
            std::borrow::Cow::Borrowed(s) => std::borrow::Cow::Borrowed(s.trim()),
            std::borrow::Cow::Owned(s) => std::borrow::Cow::Owned(s.trim().to_string()),
        }
    }
}

impl Default for HierarchyResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Relation;

    fn entity(id: &str, kind: EntityKind, title: &str) -> FunctionalEntity {
        FunctionalEntity::new(id, kind, title)
    }

    #[test]
    fn test_exact_title_beats_substring() {
        let candidates = vec![
            entity("MOD:AUTHORING", EntityKind::Module, "Authoring Tools"),
            entity("MOD:AUTH", EntityKind::Module, "Auth"),
        ];
        let resolver = HierarchyResolver::new();

        // "Auth" is a substring of "Authoring Tools", but the exact match
        // must win even though it is listed second.
        let found = resolver
            .find_ancestor(&candidates, "Auth", EntityKind::Module)
            .unwrap();
        assert_eq!(found.id, "MOD:AUTH");
    }

    #[test]
    fn test_kind_filter_applies() {
        let candidates = vec![entity("EPIC:SHOP.AUTH", EntityKind::Epic, "Auth")];
        let resolver = HierarchyResolver::new();
        assert!(resolver
            .find_ancestor(&candidates, "Auth", EntityKind::Module)
            .is_none());
    }

    #[test]
    fn test_bracketed_token_strip() {
        let candidates = vec![entity("MOD:FRONTEND", EntityKind::Module, "[MOD] Frontend")];
        let resolver = HierarchyResolver::new();

        let found = resolver
            .find_ancestor(&candidates, "Frontend", EntityKind::Module)
            .unwrap();
        assert_eq!(found.id, "MOD:FRONTEND");

        // And the other direction: token on the hint, plain title.
        let candidates = vec![entity("MOD:FRONTEND", EntityKind::Module, "Frontend")];
        let found = resolver
            .find_ancestor(&candidates, "[module] Frontend", EntityKind::Module)
            .unwrap();
        assert_eq!(found.id, "MOD:FRONTEND");
    }

    #[test]
    fn test_id_prefix_match() {
        // The title was renamed; the id still carries the old name.
        let candidates = vec![entity(
            "MOD:PAYMENTS_LEGACY",
            EntityKind::Module,
            "Billing Platform",
        )];
        let resolver = HierarchyResolver::new();

        let found = resolver
            .find_ancestor(&candidates, "Payments", EntityKind::Module)
            .unwrap();
        assert_eq!(found.id, "MOD:PAYMENTS_LEGACY");
    }

    #[test]
    fn test_substring_fallback() {
        let candidates = vec![entity(
            "MOD:CUSTOMER_PORTAL",
            EntityKind::Module,
            "Customer Portal v2",
        )];
        let resolver = HierarchyResolver::new();

        let found = resolver
            .find_ancestor(&candidates, "Portal", EntityKind::Module)
            .unwrap();
        assert_eq!(found.id, "MOD:CUSTOMER_PORTAL");
    }

    #[test]
    fn test_no_match_is_none() {
        let candidates = vec![entity("MOD:SHOP", EntityKind::Module, "Shop")];
        let resolver = HierarchyResolver::new();
        assert!(resolver
            .find_ancestor(&candidates, "Warehouse", EntityKind::Module)
            .is_none());
        assert!(resolver
            .find_ancestor(&candidates, "   ", EntityKind::Module)
            .is_none());
    }

    #[test]
    fn test_resolve_parent_priority() {
        let module = entity("MOD:SHOP", EntityKind::Module, "Shop");
        let epic_a = entity("EPIC:SHOP.CART", EntityKind::Epic, "Cart");
        let epic_b = entity("EPIC:SHOP.SEARCH", EntityKind::Epic, "Search");

        let mut feature = entity("FEAT:SHOP.CART.PAY", EntityKind::Feature, "Pay");
        feature.epic_hint = "Search".to_string();

        let entities = vec![module, epic_a, epic_b, feature.clone()];
        let resolver = HierarchyResolver::new();

        // Hint alone points at Search.
        let parent = resolver.resolve_parent(&feature, &entities, &[]).unwrap();
        assert_eq!(parent.id, "EPIC:SHOP.SEARCH");

        // An active hierarchy relation outranks the hint.
        let relation = Relation::new("EPIC:SHOP.CART", "FEAT:SHOP.CART.PAY", RelationKind::Hierarchy);
        let parent = resolver
            .resolve_parent(&feature, &entities, &[relation])
            .unwrap();
        assert_eq!(parent.id, "EPIC:SHOP.CART");

        // An explicit parent reference outranks everything.
        feature.parent = Some("MOD:SHOP".to_string());
        let parent = resolver.resolve_parent(&feature, &entities, &[]).unwrap();
        assert_eq!(parent.id, "MOD:SHOP");
    }
}
