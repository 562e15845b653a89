use std::fs;
use std::path::PathBuf;

use crate::catalog::Catalog;

use super::error::StorageError;
use super::Storage;

/// File-based storage: the whole catalog as one pretty-printed JSON file.
///
/// Writes go through a sibling temp file followed by a rename, so an
/// interrupted save never leaves a truncated catalog behind.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Storage for FileStorage {
    fn load(&self) -> Result<Catalog, StorageError> {
        if !self.path.exists() {
            return Err(StorageError::NotFound(self.path.clone()));
        }

        let json = fs::read_to_string(&self.path).map_err(|e| StorageError::io(&self.path, e))?;
        let catalog: Catalog = serde_json::from_str(&json)?;
        Ok(catalog)
    }

    fn save(&self, catalog: &Catalog) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
            }
        }

        let json = serde_json::to_string_pretty(catalog)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StorageError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| StorageError::io(&self.path, e))?;

        Ok(())
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityKind, FunctionalEntity, Relation, RelationKind};

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("catalog.json"));

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
        catalog.relations.push(Relation::new(
            "MOD:SHOP",
            "EPIC:SHOP.CART",
            RelationKind::Hierarchy,
        ));

        storage.save(&catalog).unwrap();
        assert!(storage.exists());

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.entities.len(), 2);
        assert_eq!(loaded.relations.len(), 1);
        // Entity order is preserved across the round trip.
        assert_eq!(loaded.entities[0].id, "MOD:SHOP");
        assert_eq!(loaded.relations[0].kind, RelationKind::Hierarchy);
    }

    #[test]
    fn test_load_missing_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("catalog.json"));
        assert!(matches!(storage.load(), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("catalog.json"));
        storage.save(&Catalog::new()).unwrap();
        assert!(storage.exists());
    }
}
