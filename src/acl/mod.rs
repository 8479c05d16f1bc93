//! Access Control
//!
//! Permissions are entries of the form (parent path, entry name, principal)
//! kept outside the versioned tree: sharing or unsharing a path never
//! produces a commit. Callers consult the gate before reading or writing;
//! the tree modules never do.

pub mod memory;
pub mod persistence;

pub use memory::MemoryPermissionStore;
pub use persistence::SledPermissionStore;

use crate::error::{RepoError, StorageError};
use crate::path::{validate_name, validate_parent_path, RepoPath};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Who is asking
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Principal {
    /// Allowed everything, without enumerating entries
    Superuser(String),
    User(String),
    /// Unauthenticated; matches entries granted to no principal
    Anonymous,
}

impl Principal {
    pub fn user(name: impl Into<String>) -> Self {
        Principal::User(name.into())
    }

    pub fn is_superuser(&self) -> bool {
        matches!(self, Principal::Superuser(_))
    }

    /// Grantee recorded in permission entries, `None` for anonymous
    pub fn grantee(&self) -> Option<&str> {
        match self {
            Principal::Superuser(name) | Principal::User(name) => Some(name),
            Principal::Anonymous => None,
        }
    }
}

/// Result of an enumeration query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedNames {
    /// No restriction applies
    Unrestricted,
    Only(BTreeSet<String>),
}

impl AllowedNames {
    pub fn contains(&self, name: &str) -> bool {
        match self {
            AllowedNames::Unrestricted => true,
            AllowedNames::Only(names) => names.contains(name),
        }
    }

    /// Keep only the allowed names, preserving input order
    pub fn filter<'n, I>(&self, names: I) -> Vec<&'n str>
    where
        I: IntoIterator<Item = &'n str>,
    {
        names.into_iter().filter(|name| self.contains(name)).collect()
    }
}

/// One granted permission
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccessControlEntry {
    pub parent_path: String,
    pub name: String,
    /// `None` grants to anonymous principals
    pub principal: Option<String>,
}

impl AccessControlEntry {
    /// Entry for `path`, which must not be the root
    pub fn new(path: &RepoPath, principal: Option<&str>) -> Result<Self, RepoError> {
        if path.is_root() {
            return Err(RepoError::InvalidPath(
                "permissions apply to named entries, not the root".to_string(),
            ));
        }
        let entry = Self {
            parent_path: path.parent_str().to_string(),
            name: path.name().to_string(),
            principal: principal.map(str::to_string),
        };
        entry.validate()?;
        Ok(entry)
    }

    pub fn validate(&self) -> Result<(), RepoError> {
        validate_parent_path(&self.parent_path)?;
        validate_name(&self.name)
    }

    /// Logical path the entry grants access to
    pub fn path(&self) -> Result<RepoPath, RepoError> {
        RepoPath::parse(&self.parent_path)?.resolve(&self.name)
    }
}

/// Query contract consumed by the application layer
pub trait AccessControl {
    fn is_allowed(&self, principal: &Principal, path: &RepoPath) -> Result<bool, RepoError>;

    fn allowed_child_names(
        &self,
        principal: &Principal,
        parent: &RepoPath,
    ) -> Result<AllowedNames, RepoError>;
}

/// Storage of permission entries
pub trait PermissionStore: Send + Sync {
    /// Add an entry; returns false if it already existed
    fn insert_entry(&self, entry: &AccessControlEntry) -> Result<bool, StorageError>;

    /// Delete an entry; returns false if it did not exist
    fn remove_entry(&self, entry: &AccessControlEntry) -> Result<bool, StorageError>;

    /// Entries in `parent_path`, optionally restricted to one entry name
    fn entries_in(
        &self,
        parent_path: &str,
        name: Option<&str>,
    ) -> Result<Vec<AccessControlEntry>, StorageError>;

    /// Every entry granted to `principal`
    fn entries_for(&self, principal: Option<&str>) -> Result<Vec<AccessControlEntry>, StorageError>;
}

/// Share, unshare and query permissions over a store
pub struct PermissionManager<P: PermissionStore> {
    store: P,
}

impl<P: PermissionStore> PermissionManager<P> {
    pub fn new(store: P) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &P {
        &self.store
    }

    /// Grant `path` to every principal listed; existing grants are kept
    pub fn grant(&self, principals: &[Principal], path: &RepoPath) -> Result<usize, RepoError> {
        let mut added = 0;
        for principal in principals {
            let entry = AccessControlEntry::new(path, principal.grantee())?;
            if self.store.insert_entry(&entry)? {
                added += 1;
            }
        }
        tracing::info!(path = %path, added, "Granted permissions");
        Ok(added)
    }

    /// Revoke `path` from every principal listed
    pub fn revoke(&self, principals: &[Principal], path: &RepoPath) -> Result<usize, RepoError> {
        let mut removed = 0;
        for principal in principals {
            let entry = AccessControlEntry::new(path, principal.grantee())?;
            if self.store.remove_entry(&entry)? {
                removed += 1;
            }
        }
        tracing::info!(path = %path, removed, "Revoked permissions");
        Ok(removed)
    }

    /// Every entry granting `path`, whoever the principal
    pub fn current_permissions(
        &self,
        path: &RepoPath,
    ) -> Result<Vec<AccessControlEntry>, RepoError> {
        if path.is_root() {
            return Ok(Vec::new());
        }
        Ok(self.store.entries_in(path.parent_str(), Some(path.name()))?)
    }

    /// Names in `parent` that `principal` may see
    pub fn allowed_names(
        &self,
        principal: &Principal,
        parent: &RepoPath,
    ) -> Result<AllowedNames, RepoError> {
        if principal.is_superuser() {
            return Ok(AllowedNames::Unrestricted);
        }
        let names = self
            .store
            .entries_in(parent.as_str(), None)?
            .into_iter()
            .filter(|entry| entry.principal.as_deref() == principal.grantee())
            .map(|entry| entry.name)
            .collect();
        Ok(AllowedNames::Only(names))
    }

    /// All paths granted to `principal`, `None` meaning unrestricted
    pub fn allowed_paths(&self, principal: &Principal) -> Result<Option<Vec<RepoPath>>, RepoError> {
        if principal.is_superuser() {
            return Ok(None);
        }
        let paths = self
            .store
            .entries_for(principal.grantee())?
            .iter()
            .map(AccessControlEntry::path)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(paths))
    }

    /// Whether `principal` holds a grant on a sibling of `path`
    pub fn has_other_permissions(
        &self,
        principal: &Principal,
        path: &RepoPath,
    ) -> Result<bool, RepoError> {
        if path.is_root() {
            return Ok(false);
        }
        Ok(self
            .store
            .entries_in(path.parent_str(), None)?
            .iter()
            .any(|entry| {
                entry.principal.as_deref() == principal.grantee() && entry.name != path.name()
            }))
    }
}

impl<P: PermissionStore> AccessControl for PermissionManager<P> {
    fn is_allowed(&self, principal: &Principal, path: &RepoPath) -> Result<bool, RepoError> {
        if principal.is_superuser() {
            return Ok(true);
        }
        if path.is_root() {
            return Ok(false);
        }
        Ok(self
            .store
            .entries_in(path.parent_str(), Some(path.name()))?
            .iter()
            .any(|entry| entry.principal.as_deref() == principal.grantee()))
    }

    fn allowed_child_names(
        &self,
        principal: &Principal,
        parent: &RepoPath,
    ) -> Result<AllowedNames, RepoError> {
        self.allowed_names(principal, parent)
    }
}
