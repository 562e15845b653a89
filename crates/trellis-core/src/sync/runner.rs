//! Batch reconciliation against an external source.
//!
//! The runner is best-effort: a bad record becomes a report entry and the
//! batch continues. Each record's merge-and-apply is one atomic unit, so a
//! cancelled or partially failed batch never leaves a half-merged record.
//! Persistence is the caller's job; running against a cloned catalog is a
//! dry run. The caller must also ensure two runs never interleave writes to
//! the same catalog.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::model::{EntityKind, FunctionalEntity, Person};

use super::error::SyncError;
use super::merge::{
    apply_diff, apply_person_diff, detect_conflicts, merge, merge_person, ConflictMap, MergePolicy,
};
use super::record::{ExternalPersonRecord, ExternalRecord};
use super::source::ExternalSource;

/// Outcome summary of one reconciliation run.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub persons_updated: usize,
    /// Records that could not be processed: (external id, reason).
    pub failed: Vec<(String, String)>,
    /// Detected conflicts per local entity id, for human review.
    pub conflicts: BTreeMap<String, ConflictMap>,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} unchanged, {} persons updated, {} failed, {} entities with conflicts",
            self.created,
            self.updated,
            self.unchanged,
            self.persons_updated,
            self.failed.len(),
            self.conflicts.len()
        )
    }
}

/// Drives one reconciliation batch from a source into a catalog.
pub struct SyncRunner<'a> {
    source: &'a dyn ExternalSource,
    policy: MergePolicy,
}

impl<'a> SyncRunner<'a> {
    pub fn new(source: &'a dyn ExternalSource, policy: MergePolicy) -> Self {
        Self { source, policy }
    }

    /// Fetches all records and reconciles them into the catalog.
    ///
    /// Fetch failures are hard errors; per-record failures are collected in
    /// the report and do not stop the batch.
    pub async fn run(&self, catalog: &mut Catalog) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();

        let records = self.source.fetch_entities().await?;
        info!(
            source = self.source.name(),
            records = records.len(),
            "fetched external entity records"
        );

        for record in &records {
            if let Err(err) = self.reconcile_record(catalog, record, &mut report) {
                warn!(external_id = %record.external_id, error = %err, "record failed, continuing batch");
                report.failed.push((record.external_id.clone(), err.to_string()));
            }
        }

        let persons = self.source.fetch_persons().await?;
        for person in &persons {
            if let Err(err) = self.reconcile_person(catalog, person, &mut report) {
                warn!(external_id = %person.external_id, error = %err, "person record failed, continuing batch");
                report.failed.push((person.external_id.clone(), err.to_string()));
            }
        }

        info!(source = self.source.name(), %report, "reconciliation finished");
        Ok(report)
    }

    fn reconcile_record(
        &self,
        catalog: &mut Catalog,
        record: &ExternalRecord,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        if record.external_id.trim().is_empty() {
            return Err(SyncError::Source("record without external id".to_string()));
        }

        match self.match_local(catalog, record) {
            Some(local_id) => {
                // detect_conflicts is independent of the merge policy and
                // runs even when the merge itself changes nothing.
                let (diff, conflicts) = {
                    let entity = catalog
                        .entity(&local_id)
                        .ok_or_else(|| SyncError::Source(format!("entity vanished: {local_id}")))?;
                    (merge(entity, record, self.policy), detect_conflicts(entity, record))
                };
                if !conflicts.is_empty() {
                    report.conflicts.insert(local_id.clone(), conflicts);
                }

                if let Some(entity) = catalog.entity_mut(&local_id) {
                    let adopt_external_id = entity.external_id.is_none();
                    if diff.is_empty() && !adopt_external_id {
                        report.unchanged += 1;
                        return Ok(());
                    }
                    apply_diff(entity, &diff);
                    if adopt_external_id {
                        entity.external_id = Some(record.external_id.clone());
                    }
                    debug!(id = %local_id, fields = diff.len(), "updated entity from external record");
                    report.updated += 1;
                }
                Ok(())
            }
            None => {
                let entity = self.create_from_record(catalog, record)?;
                debug!(id = %entity.id, external_id = %record.external_id, "created entity from external record");
                catalog.insert_entity(entity)?;
                report.created += 1;
                Ok(())
            }
        }
    }

    /// Matches an external record to a local entity: by external id, then by
    /// canonical identifier, then by exact title.
    fn match_local(&self, catalog: &Catalog, record: &ExternalRecord) -> Option<String> {
        if let Some(entity) = catalog.entity_by_external_id(&record.external_id) {
            return Some(entity.id.clone());
        }

        let id = record.field("id");
        if !id.is_empty() {
            if let Some(entity) = catalog.entity(id) {
                return Some(entity.id.clone());
            }
        }

        let title = record.field("title");
        if !title.trim().is_empty() {
            if let Some(entity) = catalog.entity_by_title(title.trim()) {
                return Some(entity.id.clone());
            }
        }

        None
    }

    fn create_from_record(
        &self,
        catalog: &Catalog,
        record: &ExternalRecord,
    ) -> Result<FunctionalEntity, SyncError> {
        let kind: EntityKind = record.field("kind").parse()?;
        let title = record.field("title").trim().to_string();

        let ancestry: Vec<&str> = [
            record.field("module_hint"),
            record.field("epic_hint"),
            record.field("feature_hint"),
        ]
        .into_iter()
        .filter(|h| !h.trim().is_empty())
        .collect();

        let id = catalog.allocate_id(kind, &title, &ancestry);
        let mut entity = FunctionalEntity::new(id, kind, title);
        entity.external_id = Some(record.external_id.clone());

        // A fresh entity is all blanks; a uniform fill pulls every supplied
        // external field in exactly once.
        let diff = merge(&entity, record, MergePolicy::LocalPriority);
        apply_diff(&mut entity, &diff);

        Ok(entity)
    }

    fn reconcile_person(
        &self,
        catalog: &mut Catalog,
        record: &ExternalPersonRecord,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        if record.external_id.trim().is_empty() {
            return Err(SyncError::Source(
                "person record without external id".to_string(),
            ));
        }

        let local_id = catalog
            .person_by_external_id(&record.external_id)
            .or_else(|| catalog.person_by_name(&record.name))
            .map(|p| p.id.clone());

        match local_id {
            Some(id) => {
                let diff = {
                    let person = catalog
                        .person(&id)
                        .ok_or_else(|| SyncError::Source(format!("person vanished: {id}")))?;
                    merge_person(person, record)
                };
                if diff.is_empty() {
                    return Ok(());
                }
                if let Some(person) = catalog.persons.iter_mut().find(|p| p.id == id) {
                    apply_person_diff(person, &diff);
                    report.persons_updated += 1;
                }
                Ok(())
            }
            None => {
                let mut person = Person::new(record.name.trim());
                person.position = record.position.trim().to_string();
                person.email = record.email.trim().to_string();
                person.external_id = Some(record.external_id.clone());
                catalog.insert_person(person);
                report.persons_updated += 1;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::model::EntityKind;

    struct StubSource {
        entities: Vec<ExternalRecord>,
        persons: Vec<ExternalPersonRecord>,
    }

    #[async_trait]
    impl ExternalSource for StubSource {
        fn name(&self) -> &str {
            "stub"
        }

        async fn fetch_entities(&self) -> Result<Vec<ExternalRecord>, SyncError> {
            Ok(self.entities.clone())
        }

        async fn fetch_persons(&self) -> Result<Vec<ExternalPersonRecord>, SyncError> {
            Ok(self.persons.clone())
        }
    }

    fn stub(entities: Vec<ExternalRecord>) -> StubSource {
        StubSource {
            entities,
            persons: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_creates_new_entities_with_allocated_ids() {
        let source = stub(vec![ExternalRecord::new("EXT-1")
            .with_field("kind", "feature")
            .with_field("title", "Login")
            .with_field("module_hint", "Frontend")
            .with_field("epic_hint", "Auth")]);

        let mut catalog = Catalog::new();
        let report = SyncRunner::new(&source, MergePolicy::Smart)
            .run(&mut catalog)
            .await
            .unwrap();

        assert_eq!(report.created, 1);
        let entity = catalog.entity("FEAT:FRONTEND.AUTH.LOGIN").unwrap();
        assert_eq!(entity.title, "Login");
        assert_eq!(entity.module_hint, "Frontend");
        assert_eq!(entity.external_id.as_deref(), Some("EXT-1"));
    }

    #[tokio::test]
    async fn test_updates_matched_entity_and_collects_conflicts() {
        let mut catalog = Catalog::new();
        let mut entity =
            FunctionalEntity::new("FEAT:SHOP.CART.PAY", EntityKind::Feature, "Pay");
        entity.status = "in development".to_string();
        entity.external_id = Some("EXT-7".to_string());
        catalog.insert_entity(entity).unwrap();

        let source = stub(vec![ExternalRecord::new("EXT-7")
            .with_field("status", "released")
            .with_field("description", "Payment feature")]);

        let report = SyncRunner::new(&source, MergePolicy::Smart)
            .run(&mut catalog)
            .await
            .unwrap();

        // Smart policy keeps the non-empty local status but fills the
        // blank description; the status disagreement is surfaced as data.
        assert_eq!(report.updated, 1);
        let entity = catalog.entity("FEAT:SHOP.CART.PAY").unwrap();
        assert_eq!(entity.status, "in development");
        assert_eq!(entity.description, "Payment feature");
        let conflicts = report.conflicts.get("FEAT:SHOP.CART.PAY").unwrap();
        assert!(conflicts.contains_key("status"));
    }

    #[tokio::test]
    async fn test_matches_by_title_and_adopts_external_id() {
        let mut catalog = Catalog::new();
        catalog
            .insert_entity(FunctionalEntity::new(
                "MOD:FRONTEND",
                EntityKind::Module,
                "Frontend",
            ))
            .unwrap();

        let source = stub(vec![ExternalRecord::new("EXT-2")
            .with_field("kind", "module")
            .with_field("title", "Frontend")]);

        let report = SyncRunner::new(&source, MergePolicy::Smart)
            .run(&mut catalog)
            .await
            .unwrap();

        assert_eq!(report.created, 0);
        assert_eq!(report.updated, 1);
        assert_eq!(
            catalog.entity("MOD:FRONTEND").unwrap().external_id.as_deref(),
            Some("EXT-2")
        );
    }

    #[tokio::test]
    async fn test_bad_record_fails_batch_continues() {
        let source = stub(vec![
            ExternalRecord::new("EXT-BAD").with_field("kind", "widget"),
            ExternalRecord::new("")
                .with_field("kind", "module")
                .with_field("title", "No id"),
            ExternalRecord::new("EXT-OK")
                .with_field("kind", "module")
                .with_field("title", "Backend"),
        ]);

        let mut catalog = Catalog::new();
        let report = SyncRunner::new(&source, MergePolicy::Smart)
            .run(&mut catalog)
            .await
            .unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(report.failed.len(), 2);
        assert!(catalog.entity("MOD:BACKEND").is_some());
    }

    #[tokio::test]
    async fn test_second_run_is_unchanged() {
        let source = stub(vec![ExternalRecord::new("EXT-1")
            .with_field("kind", "module")
            .with_field("title", "Frontend")]);

        let mut catalog = Catalog::new();
        let runner = SyncRunner::new(&source, MergePolicy::Smart);
        let first = runner.run(&mut catalog).await.unwrap();
        assert_eq!(first.created, 1);

        let second = runner.run(&mut catalog).await.unwrap();
        assert_eq!(second.created, 0);
        assert_eq!(second.updated, 0);
        assert_eq!(second.unchanged, 1);
        assert_eq!(catalog.entities.len(), 1);
    }

    #[tokio::test]
    async fn test_person_sync_creates_and_fills() {
        let mut catalog = Catalog::new();
        let mut alice = Person::new("Alice");
        alice.position = String::new();
        catalog.insert_person(alice);

        let source = StubSource {
            entities: Vec::new(),
            persons: vec![
                ExternalPersonRecord {
                    external_id: "U-1".to_string(),
                    name: "Alice".to_string(),
                    position: "QA Lead".to_string(),
                    email: String::new(),
                },
                ExternalPersonRecord {
                    external_id: "U-2".to_string(),
                    name: "Bob".to_string(),
                    position: String::new(),
                    email: "bob@example.com".to_string(),
                },
            ],
        };

        let report = SyncRunner::new(&source, MergePolicy::Smart)
            .run(&mut catalog)
            .await
            .unwrap();

        assert_eq!(report.persons_updated, 2);
        let alice = catalog.person_by_name("Alice").unwrap();
        assert_eq!(alice.position, "QA Lead");
        assert_eq!(alice.external_id.as_deref(), Some("U-1"));
        assert!(catalog.person_by_external_id("U-2").is_some());
    }
}
