//! The catalog working set: entities, relations and persons.
//!
//! [`Catalog`] is the single-writer, in-memory store the core operates on.
//! Entity order is preserved across load/save cycles. Persistence is handled
//! by the [`crate::storage`] layer; nothing here touches disk.

mod error;
pub mod ident;

pub use error::CatalogError;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::graph::HierarchyResolver;
use crate::model::{EntityKind, FunctionalEntity, Person, Relation, RelationKind};

/// Provenance marker for relations created by hierarchy materialization.
pub const RESOLVER_ORIGIN: &str = "resolver";

/// The full serialized working set of one catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub entities: Vec<FunctionalEntity>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub persons: Vec<Person>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    // === Entities ===

    /// Looks up an entity by canonical identifier.
    pub fn entity(&self, id: &str) -> Option<&FunctionalEntity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn entity_mut(&mut self, id: &str) -> Option<&mut FunctionalEntity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn contains_entity(&self, id: &str) -> bool {
        self.entity(id).is_some()
    }

    /// Looks up an entity by its external tracker id.
    pub fn entity_by_external_id(&self, external_id: &str) -> Option<&FunctionalEntity> {
        self.entities
            .iter()
            .find(|e| e.external_id.as_deref() == Some(external_id))
    }

    /// Looks up an entity by exact title, case-insensitive.
    pub fn entity_by_title(&self, title: &str) -> Option<&FunctionalEntity> {
        self.entities
            .iter()
            .find(|e| e.title.eq_ignore_ascii_case(title))
    }

    /// Inserts a new entity, enforcing identifier uniqueness.
    ///
    /// An identifier whose segment count deviates from the kind's expected
    /// shape is accepted (legacy data) and only logged.
    pub fn insert_entity(&mut self, entity: FunctionalEntity) -> Result<(), CatalogError> {
        if entity.title.trim().is_empty() && entity.external_id.is_none() {
            return Err(CatalogError::Validation(
                "entity must have a title or an external id".to_string(),
            ));
        }
        if self.contains_entity(&entity.id) {
            return Err(CatalogError::DuplicateId(entity.id));
        }
        if !entity.id_shape_matches() {
            debug!(id = %entity.id, kind = %entity.kind, "identifier shape deviates from expected segment count");
        }
        self.entities.push(entity);
        Ok(())
    }

    /// Allocates a fresh canonical identifier that is unique in this catalog.
    pub fn allocate_id(&self, kind: EntityKind, title: &str, ancestry: &[&str]) -> String {
        let base = ident::allocate(kind, title, ancestry);
        ident::allocate_unique(&base, |candidate| self.contains_entity(candidate))
    }

    /// Allocates a unique identifier under an existing parent entity.
    pub fn allocate_id_under(
        &self,
        kind: EntityKind,
        title: &str,
        parent_id: &str,
    ) -> Result<String, CatalogError> {
        let parent = self
            .entity(parent_id)
            .ok_or_else(|| CatalogError::EntityNotFound(parent_id.to_string()))?;
        let base = ident::allocate_under(kind, title, &parent.id);
        Ok(ident::allocate_unique(&base, |candidate| {
            self.contains_entity(candidate)
        }))
    }

    // === Relations ===

    fn active_relation_index(
        &self,
        source: &str,
        target: &str,
        kind: RelationKind,
    ) -> Option<usize> {
        self.relations
            .iter()
            .position(|r| r.active && r.kind == kind && r.source == source && r.target == target)
    }

    /// Creates a hierarchy relation unless an active one already exists for
    /// (source, target, hierarchy). Idempotent; returns whether a relation
    /// was created.
    pub fn upsert_hierarchy(&mut self, source: &str, target: &str) -> Result<bool, CatalogError> {
        self.upsert_hierarchy_with_origin(source, target, None)
    }

    fn upsert_hierarchy_with_origin(
        &mut self,
        source: &str,
        target: &str,
        origin: Option<&str>,
    ) -> Result<bool, CatalogError> {
        if !self.contains_entity(source) {
            return Err(CatalogError::EntityNotFound(source.to_string()));
        }
        if !self.contains_entity(target) {
            return Err(CatalogError::EntityNotFound(target.to_string()));
        }
        if self
            .active_relation_index(source, target, RelationKind::Hierarchy)
            .is_some()
        {
            return Ok(false);
        }

        let mut relation = Relation::new(source, target, RelationKind::Hierarchy);
        if let Some(origin) = origin {
            relation = relation.with_origin(origin);
        }
        self.relations.push(relation);
        Ok(true)
    }

    /// Adds a relation of any kind under the same active-duplicate guard as
    /// [`Catalog::upsert_hierarchy`]. Returns whether it was created.
    pub fn add_relation(&mut self, relation: Relation) -> Result<bool, CatalogError> {
        if !self.contains_entity(&relation.source) {
            return Err(CatalogError::EntityNotFound(relation.source));
        }
        if !self.contains_entity(&relation.target) {
            return Err(CatalogError::EntityNotFound(relation.target));
        }
        if self
            .active_relation_index(&relation.source, &relation.target, relation.kind)
            .is_some()
        {
            return Ok(false);
        }
        self.relations.push(relation);
        Ok(true)
    }

    /// Soft-deletes a relation by record id.
    pub fn deactivate_relation(&mut self, id: &str) -> Result<(), CatalogError> {
        self.set_relation_active(id, false)
    }

    /// Restores a soft-deleted relation.
    pub fn reactivate_relation(&mut self, id: &str) -> Result<(), CatalogError> {
        self.set_relation_active(id, true)
    }

    fn set_relation_active(&mut self, id: &str, active: bool) -> Result<(), CatalogError> {
        let relation = self
            .relations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| CatalogError::RelationNotFound(id.to_string()))?;
        relation.active = active;
        relation.updated_at = chrono::Utc::now();
        Ok(())
    }

    pub fn relations_from(&self, source: &str) -> Vec<&Relation> {
        self.relations.iter().filter(|r| r.source == source).collect()
    }

    pub fn relations_to(&self, target: &str) -> Vec<&Relation> {
        self.relations.iter().filter(|r| r.target == target).collect()
    }

    pub fn relations_of_kind(&self, kind: RelationKind) -> Vec<&Relation> {
        self.relations.iter().filter(|r| r.kind == kind).collect()
    }

    pub fn active_relations(&self) -> Vec<&Relation> {
        self.relations.iter().filter(|r| r.active).collect()
    }

    /// Resolves a parent for every entity and persists the results as
    /// hierarchy relations. This is the explicit write step that turns
    /// inferred structure into authoritative records; graph building alone
    /// never writes. Returns the number of relations created.
    pub fn materialize_hierarchy(&mut self) -> usize {
        let resolver = HierarchyResolver::new();
        let pairs: Vec<(String, String)> = self
            .entities
            .iter()
            .filter_map(|entity| {
                resolver
                    .resolve_parent(entity, &self.entities, &self.relations)
                    .map(|parent| (parent.id.clone(), entity.id.clone()))
            })
            .collect();

        let mut created = 0;
        for (source, target) in pairs {
            if source == target {
                continue;
            }
            if self
                .upsert_hierarchy_with_origin(&source, &target, Some(RESOLVER_ORIGIN))
                .unwrap_or(false)
            {
                created += 1;
            }
        }

        if created > 0 {
            info!(created, "materialized hierarchy relations");
        }
        created
    }

    // === Persons ===

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.persons.iter().find(|p| p.id == id)
    }

    pub fn person_by_external_id(&self, external_id: &str) -> Option<&Person> {
        self.persons
            .iter()
            .find(|p| p.external_id.as_deref() == Some(external_id))
    }

    pub fn person_by_name(&self, name: &str) -> Option<&Person> {
        self.persons.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn insert_person(&mut self, person: Person) {
        self.persons.push(person);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityKind, FunctionalEntity, Relation, RelationKind};

    fn sample_catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .insert_entity(FunctionalEntity::new("MOD:SHOP", EntityKind::Module, "Shop"))
            .unwrap();
        catalog
            .insert_entity(FunctionalEntity::new(
                "EPIC:SHOP.CART",
                EntityKind::Epic,
                "Cart",
            ))
            .unwrap();
        catalog
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let mut catalog = sample_catalog();
        let dup = FunctionalEntity::new("MOD:SHOP", EntityKind::Module, "Shop again");
        assert!(matches!(
            catalog.insert_entity(dup),
            Err(CatalogError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_allocate_id_is_never_taken() {
        let mut catalog = sample_catalog();
        let first = catalog.allocate_id(EntityKind::Epic, "Cart", &["Shop"]);
        // EPIC:SHOP.CART exists, so the allocator must step past it.
        assert_eq!(first, "EPIC:SHOP.CART.1");

        catalog
            .insert_entity(FunctionalEntity::new(&first, EntityKind::Epic, "Cart"))
            .unwrap();
        let second = catalog.allocate_id(EntityKind::Epic, "Cart", &["Shop"]);
        assert_eq!(second, "EPIC:SHOP.CART.2");
    }

    #[test]
    fn test_allocate_id_under_parent() {
        let catalog = sample_catalog();
        let id = catalog
            .allocate_id_under(EntityKind::Feature, "Checkout", "EPIC:SHOP.CART")
            .unwrap();
        assert_eq!(id, "FEAT:SHOP.CART.CHECKOUT");

        assert!(catalog
            .allocate_id_under(EntityKind::Feature, "Checkout", "EPIC:NOPE")
            .is_err());
    }

    #[test]
    fn test_upsert_hierarchy_is_idempotent() {
        let mut catalog = sample_catalog();
        assert!(catalog.upsert_hierarchy("MOD:SHOP", "EPIC:SHOP.CART").unwrap());
        assert!(!catalog.upsert_hierarchy("MOD:SHOP", "EPIC:SHOP.CART").unwrap());
        assert_eq!(catalog.relations.len(), 1);
    }

    #[test]
    fn test_upsert_hierarchy_unknown_entity() {
        let mut catalog = sample_catalog();
        assert!(matches!(
            catalog.upsert_hierarchy("MOD:SHOP", "EPIC:GHOST"),
            Err(CatalogError::EntityNotFound(_))
        ));
    }

    #[test]
    fn test_deactivate_then_upsert_creates_new_record() {
        let mut catalog = sample_catalog();
        catalog.upsert_hierarchy("MOD:SHOP", "EPIC:SHOP.CART").unwrap();
        let id = catalog.relations[0].id.clone();

        catalog.deactivate_relation(&id).unwrap();
        assert!(!catalog.relations[0].active);

        // The deactivated record stays for audit; upsert sees no active
        // duplicate and creates a fresh one.
        assert!(catalog.upsert_hierarchy("MOD:SHOP", "EPIC:SHOP.CART").unwrap());
        assert_eq!(catalog.relations.len(), 2);

        catalog.reactivate_relation(&id).unwrap();
        assert!(catalog.relations[0].active);
    }

    #[test]
    fn test_relation_queries() {
        let mut catalog = sample_catalog();
        catalog.upsert_hierarchy("MOD:SHOP", "EPIC:SHOP.CART").unwrap();
        catalog
            .add_relation(Relation::new(
                "EPIC:SHOP.CART",
                "MOD:SHOP",
                RelationKind::Functional,
            ))
            .unwrap();

        assert_eq!(catalog.relations_from("MOD:SHOP").len(), 1);
        assert_eq!(catalog.relations_to("MOD:SHOP").len(), 1);
        assert_eq!(catalog.relations_of_kind(RelationKind::Hierarchy).len(), 1);
        assert_eq!(catalog.active_relations().len(), 2);
    }

    #[test]
    fn test_materialize_hierarchy_from_hints() {
        let mut catalog = Catalog::new();
        catalog
            .insert_entity(FunctionalEntity::new(
                "MOD:FRONTEND",
                EntityKind::Module,
                "Frontend",
            ))
            .unwrap();
        let mut epic = FunctionalEntity::new("EPIC:FRONTEND.AUTH", EntityKind::Epic, "Auth");
        epic.module_hint = "Frontend".to_string();
        catalog.insert_entity(epic).unwrap();

        assert_eq!(catalog.materialize_hierarchy(), 1);
        let relation = &catalog.relations[0];
        assert_eq!(relation.source, "MOD:FRONTEND");
        assert_eq!(relation.target, "EPIC:FRONTEND.AUTH");
        assert_eq!(relation.kind, RelationKind::Hierarchy);
        assert_eq!(relation.origin.as_deref(), Some(RESOLVER_ORIGIN));

        // Re-running is a no-op: safe repeated synchronization.
        assert_eq!(catalog.materialize_hierarchy(), 0);
    }
}
