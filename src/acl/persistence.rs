//! Sled-backed permission table.

use super::{AccessControlEntry, PermissionStore};
use crate::error::StorageError;

const PERMISSIONS_TREE: &str = "permissions";
const FIELD_SEPARATOR: u8 = 0;
const ANONYMOUS_TAG: u8 = b'a';
const USER_TAG: u8 = b'u';

/// Persistent permission store
///
/// Keys sort by parent path, then name, so directory queries are prefix
/// scans. Names and paths cannot contain NUL, which separates the fields:
/// ```text
/// permissions: <parent>\0<name>\0<a | u<principal>> -> bincode(AccessControlEntry)
/// ```
pub struct SledPermissionStore {
    tree: sled::Tree,
}

impl SledPermissionStore {
    /// Open the permission tree in an existing database, usually the one the
    /// object store lives in
    pub fn from_db(db: &sled::Db) -> Result<Self, StorageError> {
        Ok(Self {
            tree: db.open_tree(PERMISSIONS_TREE)?,
        })
    }

    fn directory_prefix(parent_path: &str) -> Vec<u8> {
        let mut key = parent_path.as_bytes().to_vec();
        key.push(FIELD_SEPARATOR);
        key
    }

    fn entry_prefix(parent_path: &str, name: &str) -> Vec<u8> {
        let mut key = Self::directory_prefix(parent_path);
        key.extend_from_slice(name.as_bytes());
        key.push(FIELD_SEPARATOR);
        key
    }

    fn key(entry: &AccessControlEntry) -> Vec<u8> {
        let mut key = Self::entry_prefix(&entry.parent_path, &entry.name);
        match &entry.principal {
            Some(principal) => {
                key.push(USER_TAG);
                key.extend_from_slice(principal.as_bytes());
            }
            None => key.push(ANONYMOUS_TAG),
        }
        key
    }

    fn scan(&self, prefix: &[u8]) -> Result<Vec<AccessControlEntry>, StorageError> {
        self.tree
            .scan_prefix(prefix)
            .values()
            .map(|value| decode(&value?))
            .collect()
    }
}

fn decode(value: &[u8]) -> Result<AccessControlEntry, StorageError> {
    Ok(bincode::deserialize(value)?)
}

impl PermissionStore for SledPermissionStore {
    fn insert_entry(&self, entry: &AccessControlEntry) -> Result<bool, StorageError> {
        let value = bincode::serialize(entry)?;
        let previous = self.tree.insert(Self::key(entry), value)?;
        self.tree.flush()?;
        Ok(previous.is_none())
    }

    fn remove_entry(&self, entry: &AccessControlEntry) -> Result<bool, StorageError> {
        let previous = self.tree.remove(Self::key(entry))?;
        self.tree.flush()?;
        Ok(previous.is_some())
    }

    fn entries_in(
        &self,
        parent_path: &str,
        name: Option<&str>,
    ) -> Result<Vec<AccessControlEntry>, StorageError> {
        match name {
            Some(name) => self.scan(&Self::entry_prefix(parent_path, name)),
            None => self.scan(&Self::directory_prefix(parent_path)),
        }
    }

    fn entries_for(
        &self,
        principal: Option<&str>,
    ) -> Result<Vec<AccessControlEntry>, StorageError> {
        let mut entries = Vec::new();
        for value in self.tree.iter().values() {
            let entry = decode(&value?)?;
            if entry.principal.as_deref() == principal {
                entries.push(entry);
            }
        }
        Ok(entries)
    }
}
