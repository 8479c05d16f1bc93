//! Repository
//!
//! The inbound surface: path-based reads against the current head and
//! writes that run navigate, mutate and commit as one optimistic
//! transaction over the reference.
//!
//! Every operation snapshots the head once. Writes fail with
//! `ConcurrentModification` when another writer published first; callers
//! that want to try again wrap the work in [`Repository::retry`].

use crate::commit::CommitWriter;
use crate::config::RepositoryConfig;
use crate::error::RepoError;
use crate::heads::{read_head, HeadSnapshot, History};
use crate::object::{Commit, FileMode, Identity, Object, TreeEntry};
use crate::path::RepoPath;
use crate::store::ObjectStore;
use crate::tree::{Listing, TreeMutator, TreeNavigator, TreeWalker};
use crate::types::ObjectId;
use serde::Serialize;
use std::collections::HashSet;
use std::io::Read;
use std::sync::Arc;
use tracing::{debug, info};

/// A blob reported by [`Repository::blobs_between`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlobRecord {
    pub id: ObjectId,
    /// First path the blob was seen at
    pub path: RepoPath,
    pub size: u64,
}

pub struct Repository<S: ObjectStore + ?Sized> {
    store: Arc<S>,
    config: RepositoryConfig,
    author: Identity,
}

impl<S: ObjectStore + ?Sized> Clone for Repository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            author: self.author.clone(),
        }
    }
}

impl<S: ObjectStore + ?Sized> Repository<S> {
    /// Attach to the configured reference, creating it if needed
    pub fn new(store: Arc<S>, config: RepositoryConfig) -> Result<Self, RepoError> {
        let head = CommitWriter::new(store.as_ref(), &config).initialize()?;
        debug!(
            reference = %config.reference_name,
            commit = %head.commit.short(),
            "Opened repository"
        );
        let author = config.author.clone();
        Ok(Self {
            store,
            config,
            author,
        })
    }

    /// Same repository, committing as `author`
    pub fn with_author(&self, author: Identity) -> Self {
        Self {
            author,
            ..self.clone()
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn author(&self) -> &Identity {
        &self.author
    }

    /// Current value of the reference
    pub fn head(&self) -> Result<HeadSnapshot, RepoError> {
        read_head(self.store.as_ref(), &self.config.reference_name)?
            .ok_or_else(|| RepoError::NotFound(self.config.reference_name.clone()))
    }

    /// Navigator over the tree of `head`
    pub fn navigator(&self, head: &HeadSnapshot) -> TreeNavigator<'_, S> {
        TreeNavigator::new(self.store.as_ref(), head.root)
    }

    pub fn open(&self, path: &str) -> Result<Object, RepoError> {
        let path = RepoPath::parse(path)?;
        self.navigator(&self.head()?).open(&path)
    }

    /// Content of the blob at `path`
    pub fn read(&self, path: &str) -> Result<Vec<u8>, RepoError> {
        let path = RepoPath::parse(path)?;
        self.navigator(&self.head()?).read_blob(&path)
    }

    pub fn listdir(&self, path: &str) -> Result<Listing, RepoError> {
        let path = RepoPath::parse(path)?;
        self.navigator(&self.head()?).listdir(&path)
    }

    pub fn exists(&self, path: &str) -> Result<bool, RepoError> {
        let path = RepoPath::parse(path)?;
        self.navigator(&self.head()?).exists(&path)
    }

    pub fn size(&self, path: &str) -> Result<u64, RepoError> {
        let path = RepoPath::parse(path)?;
        self.navigator(&self.head()?).size(&path)
    }

    /// Store `content` at `path` and commit, returning the normalized path
    pub fn insert(
        &self,
        path: &str,
        content: &mut dyn Read,
        mode: FileMode,
    ) -> Result<RepoPath, RepoError> {
        let path = RepoPath::parse(path)?;
        if path.is_root() {
            return Err(RepoError::InvalidPath("a leaf name is required".to_string()));
        }
        let blob = self.store.put_blob(content)?;
        let head = self.head()?;
        self.insert_on(&head, &path, blob, mode)?;
        Ok(path)
    }

    /// Insert an already stored blob on top of `head`
    pub fn insert_on(
        &self,
        head: &HeadSnapshot,
        path: &RepoPath,
        blob: ObjectId,
        mode: FileMode,
    ) -> Result<HeadSnapshot, RepoError> {
        let root = TreeMutator::new(self.store.as_ref()).insert(
            &head.root,
            path,
            TreeEntry::blob(blob, mode),
        )?;
        let next = self.writer().commit(head, root, &self.config.save_message, &self.author)?;
        info!(path = %path, blob = %blob.short(), "Saved");
        Ok(next)
    }

    /// Remove the entry at `path` and commit
    pub fn remove(&self, path: &str) -> Result<(), RepoError> {
        let path = RepoPath::parse(path)?;
        let head = self.head()?;
        self.remove_on(&head, &path)?;
        Ok(())
    }

    /// Remove on top of `head`
    pub fn remove_on(
        &self,
        head: &HeadSnapshot,
        path: &RepoPath,
    ) -> Result<HeadSnapshot, RepoError> {
        let root = TreeMutator::new(self.store.as_ref()).remove(&head.root, path)?;
        let next = self
            .writer()
            .commit(head, root, &self.config.delete_message, &self.author)?;
        info!(path = %path, "Deleted");
        Ok(next)
    }

    /// Run `op` up to `attempts` times while it loses the race for the head
    ///
    /// Only `ConcurrentModification` is retried; each attempt must re-read
    /// the head itself.
    pub fn retry<T, F>(&self, attempts: usize, mut op: F) -> Result<T, RepoError>
    where
        F: FnMut(&Self) -> Result<T, RepoError>,
    {
        let mut attempt = 1;
        loop {
            match op(self) {
                Err(e) if e.is_retryable() && attempt < attempts => {
                    debug!(attempt, error = %e, "Retrying after concurrent modification");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Commits reachable from head through first parents, newest first
    pub fn history(&self, limit: Option<usize>) -> Result<Vec<(ObjectId, Commit)>, RepoError> {
        let head = self.head()?;
        History::new(self.store.as_ref(), head.commit)
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }

    /// Distinct blobs introduced after `start`, up to and including `end`
    ///
    /// `end` defaults to the head; `start` of `None` walks the whole
    /// history. Each blob is reported once, at the first path seen.
    pub fn blobs_between(
        &self,
        start: Option<ObjectId>,
        end: Option<ObjectId>,
    ) -> Result<Vec<BlobRecord>, RepoError> {
        let end = match end {
            Some(end) => end,
            None => self.head()?.commit,
        };
        let store = self.store.as_ref();
        let mut walker = TreeWalker::new(store);
        let mut seen = HashSet::new();
        let mut records = Vec::new();

        for item in History::new(store, end) {
            let (id, commit) = item?;
            if Some(id) == start {
                break;
            }
            walker.walk(&commit.tree, &mut |visit| {
                if !seen.insert(visit.entry.id) {
                    return Ok(());
                }
                let size = match store.get(&visit.entry.id)? {
                    Some(Object::Blob(data)) => data.len() as u64,
                    _ => return Err(RepoError::NotABlob(visit.path.to_string())),
                };
                records.push(BlobRecord {
                    id: visit.entry.id,
                    path: visit.path.clone(),
                    size,
                });
                Ok(())
            })?;
        }

        debug!(count = records.len(), "Collected blobs");
        Ok(records)
    }

    fn writer(&self) -> CommitWriter<'_, S> {
        CommitWriter::new(self.store.as_ref(), &self.config)
    }
}
