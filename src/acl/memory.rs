//! In-memory permission table.

use super::{AccessControlEntry, PermissionStore};
use crate::error::StorageError;
use parking_lot::RwLock;
use std::collections::BTreeSet;

/// Permission entries held in an ordered set
#[derive(Default)]
pub struct MemoryPermissionStore {
    entries: RwLock<BTreeSet<AccessControlEntry>>,
}

impl MemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl PermissionStore for MemoryPermissionStore {
    fn insert_entry(&self, entry: &AccessControlEntry) -> Result<bool, StorageError> {
        Ok(self.entries.write().insert(entry.clone()))
    }

    fn remove_entry(&self, entry: &AccessControlEntry) -> Result<bool, StorageError> {
        Ok(self.entries.write().remove(entry))
    }

    fn entries_in(
        &self,
        parent_path: &str,
        name: Option<&str>,
    ) -> Result<Vec<AccessControlEntry>, StorageError> {
        Ok(self
            .entries
            .read()
            .iter()
            .filter(|entry| entry.parent_path == parent_path)
            .filter(|entry| name.map_or(true, |name| entry.name == name))
            .cloned()
            .collect())
    }

    fn entries_for(
        &self,
        principal: Option<&str>,
    ) -> Result<Vec<AccessControlEntry>, StorageError> {
        Ok(self
            .entries
            .read()
            .iter()
            .filter(|entry| entry.principal.as_deref() == principal)
            .cloned()
            .collect())
    }
}
