//! Recursive traversal of the blobs reachable from a tree.

use super::load_tree;
use crate::error::RepoError;
use crate::object::TreeEntry;
use crate::path::RepoPath;
use crate::store::ObjectStore;
use crate::types::ObjectId;
use std::collections::HashSet;

/// A blob entry reached by a walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobVisit {
    pub path: RepoPath,
    pub entry: TreeEntry,
}

/// Depth-first walker that remembers the subtrees it already traversed
///
/// Consecutive commits share most of their trees, so walking a history with
/// one walker visits each distinct subtree once.
pub struct TreeWalker<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    seen_trees: HashSet<ObjectId>,
}

impl<'a, S: ObjectStore + ?Sized> TreeWalker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            seen_trees: HashSet::new(),
        }
    }

    /// Visit every blob under `root` not already covered by an earlier walk
    pub fn walk(
        &mut self,
        root: &ObjectId,
        visit: &mut dyn FnMut(&BlobVisit) -> Result<(), RepoError>,
    ) -> Result<(), RepoError> {
        let mut pending = vec![(RepoPath::root(), *root)];
        while let Some((dir, id)) = pending.pop() {
            if !self.seen_trees.insert(id) {
                continue;
            }
            let tree = load_tree(self.store, &id)?;
            for (name, entry) in &tree {
                let path = dir.resolve(name)?;
                if entry.kind.is_directory() {
                    pending.push((path, entry.id));
                } else if entry.kind.is_blob() {
                    visit(&BlobVisit {
                        path,
                        entry: *entry,
                    })?;
                }
            }
        }
        Ok(())
    }
}

/// Visit every blob reachable from `root`
pub fn walk_blobs<S: ObjectStore + ?Sized>(
    store: &S,
    root: &ObjectId,
    visit: &mut dyn FnMut(&BlobVisit) -> Result<(), RepoError>,
) -> Result<(), RepoError> {
    TreeWalker::new(store).walk(root, visit)
}
