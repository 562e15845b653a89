//! Catalog editing commands: init, add, list, link, unlink, materialize.

use color_eyre::eyre::{bail, Result};

use trellis_core::catalog::Catalog;
use trellis_core::model::{EntityKind, FunctionalEntity, Relation, RelationKind};
use trellis_core::storage::{FileStorage, Storage};

pub fn init(storage: &FileStorage) -> Result<()> {
    if storage.exists() {
        bail!("catalog already exists at {}", storage.path().display());
    }
    storage.save(&Catalog::new())?;
    println!("Initialized empty catalog at {}", storage.path().display());
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn add(
    storage: &FileStorage,
    kind: &str,
    title: &str,
    module: Option<&str>,
    epic: Option<&str>,
    feature: Option<&str>,
    parent: Option<&str>,
    critical: bool,
) -> Result<()> {
    let kind: EntityKind = kind.parse()?;
    let mut catalog = storage.load()?;

    let id = match parent {
        Some(parent_id) => catalog.allocate_id_under(kind, title, parent_id)?,
        None => {
            let ancestry: Vec<&str> = [module, epic, feature].into_iter().flatten().collect();
            catalog.allocate_id(kind, title, &ancestry)
        }
    };

    let mut entity = FunctionalEntity::new(&id, kind, title);
    entity.parent = parent.map(str::to_string);
    entity.module_hint = module.unwrap_or_default().to_string();
    entity.epic_hint = epic.unwrap_or_default().to_string();
    entity.feature_hint = feature.unwrap_or_default().to_string();
    entity.critical = critical;

    catalog.insert_entity(entity)?;
    storage.save(&catalog)?;

    println!("Created {kind}: {id}");
    Ok(())
}

pub fn list(storage: &FileStorage, kind: Option<&str>) -> Result<()> {
    let kind = kind.map(str::parse::<EntityKind>).transpose()?;
    let catalog = storage.load()?;

    let mut count = 0;
    for entity in &catalog.entities {
        if let Some(kind) = kind {
            if entity.kind != kind {
                continue;
            }
        }
        let marker = if entity.critical { "!" } else { " " };
        println!("{marker} {:<8} {:<40} {}", entity.kind.label(), entity.id, entity.title);
        count += 1;
    }

    if count == 0 {
        println!("No entities found. Use 'trellis add' to create one.");
    }
    Ok(())
}

pub fn link(
    storage: &FileStorage,
    source: &str,
    target: &str,
    kind: &str,
    note: Option<String>,
) -> Result<()> {
    let kind: RelationKind = kind.parse()?;
    let mut catalog = storage.load()?;

    let created = if kind == RelationKind::Hierarchy {
        catalog.upsert_hierarchy(source, target)?
    } else {
        let mut relation = Relation::new(source, target, kind).with_origin("user");
        relation.note = note;
        catalog.add_relation(relation)?
    };

    if created {
        storage.save(&catalog)?;
        println!("Linked {source} -> {target} ({})", kind.as_str());
    } else {
        println!("Already linked: {source} -> {target} ({})", kind.as_str());
    }
    Ok(())
}

pub fn unlink(storage: &FileStorage, id: &str) -> Result<()> {
    let mut catalog = storage.load()?;
    catalog.deactivate_relation(id)?;
    storage.save(&catalog)?;
    println!("Deactivated relation {id}");
    Ok(())
}

pub fn materialize(storage: &FileStorage) -> Result<()> {
    let mut catalog = storage.load()?;
    let created = catalog.materialize_hierarchy();
    if created > 0 {
        storage.save(&catalog)?;
    }
    println!("Materialized {created} hierarchy relations");
    Ok(())
}
