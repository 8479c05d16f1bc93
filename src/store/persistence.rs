//! Sled-backed persistent object store.

use super::ObjectStore;
use crate::error::StorageError;
use crate::object::encoded_blob_len;
use crate::types::ObjectId;
use std::path::Path;

const OBJECTS_TREE: &str = "objects";
const REFS_TREE: &str = "refs";

/// Persistent object store
///
/// Layout inside the sled database:
/// ```text
/// objects: <32-byte id>  -> <kind tag><payload>
/// refs:    <ref name>    -> <32-byte id>
/// ```
pub struct SledObjectStore {
    db: sled::Db,
    objects: sled::Tree,
    refs: sled::Tree,
}

impl SledObjectStore {
    /// Open or create a store at the given directory
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    pub fn from_db(db: sled::Db) -> Result<Self, StorageError> {
        let objects = db.open_tree(OBJECTS_TREE)?;
        let refs = db.open_tree(REFS_TREE)?;
        Ok(Self { db, objects, refs })
    }

    /// Underlying database, shared with the permission store
    pub fn db(&self) -> &sled::Db {
        &self.db
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }

    fn decode_ref(&self, name: &str, value: &[u8]) -> Result<ObjectId, StorageError> {
        ObjectId::from_slice(value).ok_or_else(|| StorageError::InvalidReference {
            name: name.to_string(),
        })
    }
}

/// Outcome of a reference swap that already happened
///
/// The reference has moved, so a failed flush is logged rather than
/// returned: reporting failure would invite a retry on top of the new head.
fn settle_swap(name: &str, new: &ObjectId, flushed: Result<(), StorageError>) -> bool {
    if let Err(err) = flushed {
        tracing::warn!(
            reference = name,
            commit = %new.short(),
            error = %err,
            "Reference moved but flush failed"
        );
    }
    true
}

impl ObjectStore for SledObjectStore {
    fn get_raw(&self, id: &ObjectId) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.objects.get(id.as_bytes())?.map(|v| v.to_vec()))
    }

    fn put_raw(&self, id: &ObjectId, encoded: Vec<u8>) -> Result<(), StorageError> {
        if self.objects.contains_key(id.as_bytes())? {
            return Ok(());
        }
        self.objects.insert(id.as_bytes(), encoded)?;
        Ok(())
    }

    fn blob_size(&self, id: &ObjectId) -> Result<Option<u64>, StorageError> {
        match self.objects.get(id.as_bytes())? {
            Some(value) => encoded_blob_len(id, &value),
            None => Ok(None),
        }
    }

    fn contains(&self, id: &ObjectId) -> Result<bool, StorageError> {
        Ok(self.objects.contains_key(id.as_bytes())?)
    }

    fn read_ref(&self, name: &str) -> Result<Option<ObjectId>, StorageError> {
        match self.refs.get(name.as_bytes())? {
            Some(value) => Ok(Some(self.decode_ref(name, &value)?)),
            None => Ok(None),
        }
    }

    fn compare_and_swap_ref(
        &self,
        name: &str,
        expected: Option<ObjectId>,
        new: ObjectId,
    ) -> Result<bool, StorageError> {
        // Objects must be durable before the reference pointing at them
        self.objects.flush()?;

        let old = expected.as_ref().map(|id| id.as_bytes().as_slice());
        let swapped = self
            .refs
            .compare_and_swap(name.as_bytes(), old, Some(new.as_bytes().to_vec()))?;
        match swapped {
            Ok(()) => {
                let flushed = self.db.flush().map(|_| ()).map_err(StorageError::from);
                Ok(settle_swap(name, &new, flushed))
            }
            Err(conflict) => {
                tracing::debug!(
                    reference = name,
                    current = ?conflict.current.as_ref().and_then(|v| ObjectId::from_slice(v)),
                    "Reference compare-and-swap rejected"
                );
                Ok(false)
            }
        }
    }
}
