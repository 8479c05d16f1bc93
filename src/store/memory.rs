//! In-memory object arena keyed by id.

use super::ObjectStore;
use crate::error::StorageError;
use crate::object::encoded_blob_len;
use crate::types::ObjectId;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;

/// Object store held entirely in memory
///
/// Objects live in a hash-keyed arena; unreachable objects are simply never
/// looked up again. The reference table sits behind its own mutex so that a
/// compare-and-swap is a single critical section.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, Vec<u8>>>,
    refs: Mutex<HashMap<String, ObjectId>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects, reachable or not
    pub fn object_count(&self) -> usize {
        self.objects.read().len()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get_raw(&self, id: &ObjectId) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.objects.read().get(id).cloned())
    }

    fn put_raw(&self, id: &ObjectId, encoded: Vec<u8>) -> Result<(), StorageError> {
        self.objects.write().entry(*id).or_insert(encoded);
        Ok(())
    }

    fn blob_size(&self, id: &ObjectId) -> Result<Option<u64>, StorageError> {
        match self.objects.read().get(id) {
            Some(bytes) => encoded_blob_len(id, bytes),
            None => Ok(None),
        }
    }

    fn contains(&self, id: &ObjectId) -> Result<bool, StorageError> {
        Ok(self.objects.read().contains_key(id))
    }

    fn read_ref(&self, name: &str) -> Result<Option<ObjectId>, StorageError> {
        Ok(self.refs.lock().get(name).copied())
    }

    fn compare_and_swap_ref(
        &self,
        name: &str,
        expected: Option<ObjectId>,
        new: ObjectId,
    ) -> Result<bool, StorageError> {
        let mut refs = self.refs.lock();
        if refs.get(name).copied() != expected {
            return Ok(false);
        }
        refs.insert(name.to_string(), new);
        Ok(true)
    }
}
