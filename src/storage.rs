//! Sled-based storage for properties and their summaries.

use crate::property::{Property, PropertyId, PropertySummary};
use serde::de::DeserializeOwned;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    DbError(#[from] sled::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("property not found: {0}")]
    NotFound(PropertyId),
}

/// The operations the rewriter needs from a property store.
///
/// Each call is its own commit; nothing spans two calls.
pub trait PropertyStore {
    /// All properties in the store's default order.
    fn properties(&self) -> Result<Vec<Property>, StorageError>;

    /// Overwrite the title and description of an existing property.
    fn update_listing(
        &self,
        id: PropertyId,
        title: &str,
        description: &str,
    ) -> Result<(), StorageError>;

    /// Create or overwrite the summary of an existing property.
    fn upsert_summary(&self, id: PropertyId, summary: &str)
        -> Result<PropertySummary, StorageError>;
}

/// Sled-backed store.
///
/// Records are JSON values keyed by the big-endian property id, so iteration
/// runs in ascending id order.
pub struct Storage {
    db: sled::Db,
    properties: sled::Tree,
    summaries: sled::Tree,
}

impl Storage {
    /// Open or create storage at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        Self::from_db(sled::open(path)?)
    }

    /// A throwaway store removed when dropped.
    pub fn temporary() -> Result<Self, StorageError> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        let properties = db.open_tree("properties")?;
        let summaries = db.open_tree("summaries")?;
        Ok(Self {
            db,
            properties,
            summaries,
        })
    }

    /// Insert or replace a property
    pub fn put_property(&self, property: &Property) -> Result<(), StorageError> {
        let value = serde_json::to_vec(property)?;
        self.properties.insert(Self::key(property.property_id), value)?;
        self.db.flush()?;
        Ok(())
    }

    pub fn get_property(&self, id: PropertyId) -> Result<Option<Property>, StorageError> {
        Self::read(&self.properties, id)
    }

    /// Delete a property together with its summary
    pub fn delete_property(&self, id: PropertyId) -> Result<bool, StorageError> {
        let existed = self.properties.remove(Self::key(id))?.is_some();
        self.summaries.remove(Self::key(id))?;
        self.db.flush()?;
        Ok(existed)
    }

    pub fn get_summary(&self, id: PropertyId) -> Result<Option<PropertySummary>, StorageError> {
        Self::read(&self.summaries, id)
    }

    /// All summaries, most recently updated first
    pub fn list_summaries(&self) -> Result<Vec<PropertySummary>, StorageError> {
        let mut results = Vec::new();
        for item in self.summaries.iter() {
            let (_key, value) = item?;
            let stored: PropertySummary = serde_json::from_slice(&value)?;
            results.push(stored);
        }
        results.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(results)
    }

    /// Get the number of stored properties
    pub fn count(&self) -> usize {
        self.properties.len()
    }

    fn read<T: DeserializeOwned>(tree: &sled::Tree, id: PropertyId) -> Result<Option<T>, StorageError> {
        match tree.get(Self::key(id))? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    fn key(id: PropertyId) -> [u8; 8] {
        id.to_be_bytes()
    }
}

impl PropertyStore for Storage {
    fn properties(&self) -> Result<Vec<Property>, StorageError> {
        let mut results = Vec::new();
        for item in self.properties.iter() {
            let (_key, value) = item?;
            results.push(serde_json::from_slice(&value)?);
        }
        Ok(results)
    }

    fn update_listing(
        &self,
        id: PropertyId,
        title: &str,
        description: &str,
    ) -> Result<(), StorageError> {
        let mut property = self.get_property(id)?.ok_or(StorageError::NotFound(id))?;
        property.title = title.to_string();
        property.description = description.to_string();
        self.put_property(&property)
    }

    fn upsert_summary(
        &self,
        id: PropertyId,
        summary: &str,
    ) -> Result<PropertySummary, StorageError> {
        if !self.properties.contains_key(Self::key(id))? {
            return Err(StorageError::NotFound(id));
        }

        let stored = match self.get_summary(id)? {
            Some(mut existing) => {
                existing.revise(summary.to_string());
                existing
            }
            None => PropertySummary::new(id, summary.to_string()),
        };

        self.summaries.insert(Self::key(id), serde_json::to_vec(&stored)?)?;
        self.db.flush()?;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Storage {
        let storage = Storage::temporary().unwrap();
        for id in [300, 2, 41] {
            storage
                .put_property(&Property::new(id, format!("Listing {}", id), "Plain"))
                .unwrap();
        }
        storage
    }

    #[test]
    fn properties_iterate_in_ascending_id_order() {
        let ids: Vec<_> = seeded()
            .properties()
            .unwrap()
            .into_iter()
            .map(|p| p.property_id)
            .collect();
        assert_eq!(ids, vec![2, 41, 300]);
    }

    #[test]
    fn update_listing_rewrites_only_text_fields() {
        let storage = seeded();
        storage
            .put_property(&Property::new(5, "Old", "Old text").with_amenities(["Pool"]))
            .unwrap();

        storage.update_listing(5, "New", "New text").unwrap();

        let property = storage.get_property(5).unwrap().unwrap();
        assert_eq!(property.title, "New");
        assert_eq!(property.description, "New text");
        assert_eq!(property.amenity_list(), "Pool");

        assert!(matches!(
            storage.update_listing(99, "x", "y"),
            Err(StorageError::NotFound(99))
        ));
    }

    #[test]
    fn upsert_overwrites_instead_of_duplicating() {
        let storage = seeded();

        let first = storage.upsert_summary(41, "first pass").unwrap();
        let second = storage.upsert_summary(41, "second pass").unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= second.created_at);
        assert_eq!(storage.list_summaries().unwrap().len(), 1);
        assert_eq!(storage.get_summary(41).unwrap().unwrap().summary, "second pass");
    }

    #[test]
    fn summary_requires_existing_property() {
        let storage = seeded();
        assert!(matches!(
            storage.upsert_summary(7, "orphan"),
            Err(StorageError::NotFound(7))
        ));
        assert!(storage.get_summary(7).unwrap().is_none());
    }

    #[test]
    fn deleting_a_property_removes_its_summary() {
        let storage = seeded();
        storage.upsert_summary(2, "gone soon").unwrap();

        assert!(storage.delete_property(2).unwrap());
        assert!(storage.get_summary(2).unwrap().is_none());
        assert!(!storage.delete_property(2).unwrap());
        assert_eq!(storage.count(), 2);
    }

    #[test]
    fn reopening_keeps_records() {
        let dir = tempfile::tempdir().unwrap();
        {
            let storage = Storage::open(dir.path()).unwrap();
            storage.put_property(&Property::new(1, "Kept", "Yes")).unwrap();
            storage.upsert_summary(1, "durable").unwrap();
        }
        let storage = Storage::open(dir.path()).unwrap();
        assert_eq!(storage.get_property(1).unwrap().unwrap().title, "Kept");
        assert_eq!(storage.get_summary(1).unwrap().unwrap().summary, "durable");
    }
}
