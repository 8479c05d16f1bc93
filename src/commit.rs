//! Commit Writer
//!
//! Wraps a new root tree in a commit whose parent is the head the caller
//! started from, then publishes it by compare-and-swap on the reference.
//! A head that moved in the meantime is reported, never overwritten.

use crate::config::RepositoryConfig;
use crate::error::RepoError;
use crate::heads::{read_head, HeadSnapshot};
use crate::object::{Commit, Identity, Signature, Tree};
use crate::store::ObjectStore;
use crate::types::ObjectId;
use tracing::{debug, info, warn};

/// Publishes commits on the configured reference
pub struct CommitWriter<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    config: &'a RepositoryConfig,
}

impl<'a, S: ObjectStore + ?Sized> CommitWriter<'a, S> {
    pub fn new(store: &'a S, config: &'a RepositoryConfig) -> Self {
        Self { store, config }
    }

    pub fn reference(&self) -> &str {
        &self.config.reference_name
    }

    /// Commit `root` on top of `head` and advance the reference
    ///
    /// Fails with `ConcurrentModification` when the reference no longer
    /// points at `head.commit`. The commit object is written either way; a
    /// lost race leaves it unreachable.
    pub fn commit(
        &self,
        head: &HeadSnapshot,
        root: ObjectId,
        message: &str,
        author: &Identity,
    ) -> Result<HeadSnapshot, RepoError> {
        let commit = Commit {
            tree: root,
            parents: vec![head.commit],
            author: Signature::now(author),
            committer: Signature::now(&self.config.committer),
            message: message.to_string(),
        };
        let id = self.store.put_commit(&commit)?;
        let reference = self.reference();

        if !self
            .store
            .compare_and_swap_ref(reference, Some(head.commit), id)?
        {
            let found = self.store.read_ref(reference)?;
            warn!(
                reference,
                expected = %head.commit.short(),
                found = ?found.map(|f| f.short()),
                "Reference moved during write"
            );
            return Err(RepoError::ConcurrentModification {
                reference: reference.to_string(),
                expected: Some(head.commit),
                found,
            });
        }

        info!(reference, commit = %id.short(), summary = message, "Committed");
        Ok(HeadSnapshot { commit: id, root })
    }

    /// Create the reference with an empty root tree if it does not exist
    ///
    /// Safe to race: a writer that loses the creation returns whatever head
    /// the winner published.
    pub fn initialize(&self) -> Result<HeadSnapshot, RepoError> {
        let reference = self.reference();
        if let Some(head) = read_head(self.store, reference)? {
            debug!(reference, commit = %head.commit.short(), "Reference already initialized");
            return Ok(head);
        }

        let root = self.store.put_tree(&Tree::new())?;
        let commit = Commit {
            tree: root,
            parents: Vec::new(),
            author: Signature::now(&self.config.author),
            committer: Signature::now(&self.config.committer),
            message: self.config.initial_commit_message.clone(),
        };
        let id = self.store.put_commit(&commit)?;

        if self.store.compare_and_swap_ref(reference, None, id)? {
            info!(reference, commit = %id.short(), "Initialized repository");
            return Ok(HeadSnapshot { commit: id, root });
        }
        read_head(self.store, reference)?.ok_or_else(|| RepoError::ConcurrentModification {
            reference: reference.to_string(),
            expected: None,
            found: None,
        })
    }
}
