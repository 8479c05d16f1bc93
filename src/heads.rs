//! Head snapshots and history
//!
//! A request captures the reference once, as a `HeadSnapshot`, and performs
//! all its reads and tree surgery against that snapshot. History is walked
//! through first parents, newest commit first.

use crate::error::{RepoError, StorageError};
use crate::object::{Commit, Object};
use crate::store::ObjectStore;
use crate::types::ObjectId;

/// The reference value observed at the start of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadSnapshot {
    /// Commit the reference pointed at
    pub commit: ObjectId,
    /// Root tree of that commit
    pub root: ObjectId,
}

/// Read a commit object, failing if the id names something else
pub fn load_commit<S: ObjectStore + ?Sized>(
    store: &S,
    id: &ObjectId,
) -> Result<Commit, RepoError> {
    match store.get(id)? {
        Some(Object::Commit(commit)) => Ok(commit),
        Some(other) => Err(StorageError::CorruptedObject {
            id: *id,
            reason: format!("expected commit, found {}", other.kind_name()),
        }
        .into()),
        None => Err(RepoError::NotFound(format!("commit {}", id))),
    }
}

/// Snapshot the named reference, `None` if it does not exist yet
pub fn read_head<S: ObjectStore + ?Sized>(
    store: &S,
    reference: &str,
) -> Result<Option<HeadSnapshot>, RepoError> {
    let Some(commit) = store.read_ref(reference)? else {
        return Ok(None);
    };
    let root = load_commit(store, &commit)?.tree;
    Ok(Some(HeadSnapshot { commit, root }))
}

/// Iterator over a linear history, following first parents
pub struct History<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    next: Option<ObjectId>,
}

impl<'a, S: ObjectStore + ?Sized> History<'a, S> {
    pub fn new(store: &'a S, start: ObjectId) -> Self {
        Self {
            store,
            next: Some(start),
        }
    }
}

impl<'a, S: ObjectStore + ?Sized> Iterator for History<'a, S> {
    type Item = Result<(ObjectId, Commit), RepoError>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        match load_commit(self.store, &id) {
            Ok(commit) => {
                self.next = commit.parent();
                Some(Ok((id, commit)))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
