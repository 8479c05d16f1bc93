//! Tree Mutator
//!
//! Inserts and removes entries by rebuilding the chain of directories from
//! the edited leaf up to the root. Directories off that chain are never read
//! or rewritten; the new chain points at them by their existing ids.
//!
//! Neither operation commits. Both return the id of a new root tree that the
//! commit writer may publish; if it never does, the written trees are simply
//! unreachable.

use super::load_tree;
use crate::error::RepoError;
use crate::object::{Tree, TreeEntry};
use crate::path::RepoPath;
use crate::store::ObjectStore;
use crate::types::ObjectId;

/// Persistent tree editor over an object store
pub struct TreeMutator<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ObjectStore + ?Sized> TreeMutator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Set `entry` at `path` under `root`, creating missing directories
    ///
    /// An existing blob at `path` is overwritten. A directory at `path` is
    /// refused with `NotABlob`, and a blob standing where an intermediate
    /// directory is needed is refused with `NotADirectory`.
    pub fn insert(
        &self,
        root: &ObjectId,
        path: &RepoPath,
        entry: TreeEntry,
    ) -> Result<ObjectId, RepoError> {
        let (dirs, name) = path
            .split_leaf()
            .ok_or_else(|| RepoError::InvalidPath("a leaf name is required".to_string()))?;

        // chain[k] is the existing directory at depth k; its child on the
        // path is named dirs[k].
        let mut chain = vec![load_tree(self.store, root)?];
        for (depth, segment) in dirs.iter().enumerate() {
            let next = match chain[depth].get(segment) {
                None => break,
                Some(found) if found.kind.is_directory() => load_tree(self.store, &found.id)?,
                Some(_) => {
                    return Err(RepoError::NotADirectory(
                        path.prefix(depth + 1).to_string(),
                    ))
                }
            };
            chain.push(next);
        }

        // The leaf's own directory: reused when the whole chain exists,
        // otherwise a fresh one.
        let mut parent = if chain.len() > dirs.len() {
            chain.pop().unwrap_or_default()
        } else {
            Tree::new()
        };
        if let Some(existing) = parent.get(name) {
            if existing.kind.is_directory() {
                return Err(RepoError::NotABlob(path.to_string()));
            }
        }
        parent.insert(name, entry);
        let mut child = self.store.put_tree(&parent)?;

        // Segments that did not exist yet each get a single-entry directory.
        for depth in (chain.len()..dirs.len()).rev() {
            child = self
                .store
                .put_tree(&Tree::single(dirs[depth], TreeEntry::directory(child)))?;
        }

        // Existing ancestors: copy with exactly one entry replaced.
        while let Some(mut tree) = chain.pop() {
            tree.insert(dirs[chain.len()], TreeEntry::directory(child));
            child = self.store.put_tree(&tree)?;
        }

        tracing::debug!(path = %path, root = %child.short(), "Inserted entry");
        Ok(child)
    }

    /// Remove the entry at `path` under `root`, pruning emptied directories
    ///
    /// Every intermediate directory must exist. Removing a directory entry
    /// drops its whole subtree. The root tree is kept even when it becomes
    /// empty.
    pub fn remove(&self, root: &ObjectId, path: &RepoPath) -> Result<ObjectId, RepoError> {
        let (dirs, name) = path
            .split_leaf()
            .ok_or_else(|| RepoError::InvalidPath("cannot remove the root".to_string()))?;
        let not_found = || RepoError::NotFound(path.to_string());

        let mut chain = vec![load_tree(self.store, root)?];
        for (depth, segment) in dirs.iter().enumerate() {
            let next = match chain[depth].get(segment) {
                Some(found) if found.kind.is_directory() => load_tree(self.store, &found.id)?,
                _ => return Err(not_found()),
            };
            chain.push(next);
        }

        let mut parent = chain.pop().ok_or_else(not_found)?;
        parent.remove(name).ok_or_else(not_found)?;
        let mut child = self.store.put_tree(&parent)?;
        let mut child_is_empty = parent.is_empty();

        while let Some(mut tree) = chain.pop() {
            let child_name = dirs[chain.len()];
            if child_is_empty {
                tree.remove(child_name);
            } else {
                tree.insert(child_name, TreeEntry::directory(child));
            }
            child = self.store.put_tree(&tree)?;
            child_is_empty = tree.is_empty();
        }

        tracing::debug!(path = %path, root = %child.short(), "Removed entry");
        Ok(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{FileMode, Object};
    use crate::store::MemoryObjectStore;
    use crate::tree::TreeNavigator;

    fn p(raw: &str) -> RepoPath {
        RepoPath::parse(raw).unwrap()
    }

    fn empty_root(store: &MemoryObjectStore) -> ObjectId {
        store.put_tree(&Tree::new()).unwrap()
    }

    fn put(store: &MemoryObjectStore, root: ObjectId, path: &str, data: &[u8]) -> ObjectId {
        let blob = store.put_blob_bytes(data).unwrap();
        TreeMutator::new(store)
            .insert(&root, &p(path), TreeEntry::blob(blob, FileMode::Regular))
            .unwrap()
    }

    fn tree_at(store: &MemoryObjectStore, root: ObjectId, path: &str) -> Tree {
        TreeNavigator::new(store, root).open_tree(&p(path)).unwrap()
    }

    #[test]
    fn test_insert_creates_intermediate_directories() {
        let store = MemoryObjectStore::new();
        let root = put(&store, empty_root(&store), "foo/bar/baz.txt", b"hi");

        let nav = TreeNavigator::new(&store, root);
        assert_eq!(nav.read_blob(&p("foo/bar/baz.txt")).unwrap(), b"hi");
        assert_eq!(tree_at(&store, root, "").len(), 1);
        assert_eq!(tree_at(&store, root, "foo").len(), 1);
        assert!(tree_at(&store, root, "foo").get("bar").unwrap().kind.is_directory());
    }

    #[test]
    fn test_insert_at_root_level() {
        let store = MemoryObjectStore::new();
        let root = put(&store, empty_root(&store), "top.txt", b"top");
        let root = put(&store, root, "second.txt", b"2");
        let listing = tree_at(&store, root, "");
        assert_eq!(listing.len(), 2);
    }

    #[test]
    fn test_insert_overwrites_existing_blob() {
        let store = MemoryObjectStore::new();
        let root = put(&store, empty_root(&store), "a/file", b"one");
        let root = put(&store, root, "a/file", b"two");
        let nav = TreeNavigator::new(&store, root);
        assert_eq!(nav.read_blob(&p("a/file")).unwrap(), b"two");
        assert_eq!(tree_at(&store, root, "a").len(), 1);
    }

    #[test]
    fn test_insert_into_partially_existing_chain() {
        let store = MemoryObjectStore::new();
        let root = put(&store, empty_root(&store), "a/keep.txt", b"keep");
        let root = put(&store, root, "a/b/c/new.txt", b"new");

        let a = tree_at(&store, root, "a");
        assert_eq!(a.len(), 2);
        assert!(a.get("keep.txt").is_some());
        assert_eq!(tree_at(&store, root, "a/b").len(), 1);
        assert_eq!(tree_at(&store, root, "a/b/c").len(), 1);
    }

    #[test]
    fn test_sibling_subtrees_are_reused() {
        let store = MemoryObjectStore::new();
        let root = put(&store, empty_root(&store), "a/b/c", b"c");
        let root = put(&store, root, "a/b/d", b"d");
        let root = put(&store, root, "a/x/y", b"y");

        let a_before = tree_at(&store, root, "a");
        let b_before = tree_at(&store, root, "a/b");
        let root2 = put(&store, root, "a/b/e", b"e");
        let a_after = tree_at(&store, root2, "a");

        // The untouched sibling keeps its id, the edited child does not.
        assert_eq!(a_before.get("x"), a_after.get("x"));
        assert_ne!(a_before.get("b"), a_after.get("b"));

        let b_after = tree_at(&store, root2, "a/b");
        assert_eq!(b_after.get("c"), b_before.get("c"));
        assert_eq!(b_after.get("d"), b_before.get("d"));
        assert_eq!(b_after.len(), 3);
    }

    #[test]
    fn test_insert_refuses_type_conflicts() {
        let store = MemoryObjectStore::new();
        let root = put(&store, empty_root(&store), "dir/file", b"x");
        let blob = store.put_blob_bytes(b"y").unwrap();
        let mutator = TreeMutator::new(&store);
        let entry = TreeEntry::blob(blob, FileMode::Regular);

        assert!(matches!(
            mutator.insert(&root, &p("dir"), entry),
            Err(RepoError::NotABlob(_))
        ));
        match mutator.insert(&root, &p("dir/file/nested"), entry) {
            Err(RepoError::NotADirectory(at)) => assert_eq!(at, "dir/file"),
            other => panic!("expected NotADirectory, got {:?}", other),
        }
        assert!(matches!(
            mutator.insert(&root, &RepoPath::root(), entry),
            Err(RepoError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_remove_prunes_empty_ancestors() {
        let store = MemoryObjectStore::new();
        let root = put(&store, empty_root(&store), "x/y/z", b"z");
        let root = TreeMutator::new(&store).remove(&root, &p("x/y/z")).unwrap();

        assert!(tree_at(&store, root, "").is_empty());
        assert_eq!(root, empty_root(&store));
    }

    #[test]
    fn test_remove_stops_pruning_at_non_empty_ancestor() {
        let store = MemoryObjectStore::new();
        let root = put(&store, empty_root(&store), "x/y/z", b"z");
        let root = put(&store, root, "x/other", b"o");
        let root = TreeMutator::new(&store).remove(&root, &p("x/y/z")).unwrap();

        let x = tree_at(&store, root, "x");
        assert_eq!(x.len(), 1);
        assert!(x.get("y").is_none());
        assert!(x.get("other").is_some());
    }

    #[test]
    fn test_remove_keeps_non_empty_parent() {
        let store = MemoryObjectStore::new();
        let root = put(&store, empty_root(&store), "d/one", b"1");
        let root = put(&store, root, "d/two", b"2");
        let root = TreeMutator::new(&store).remove(&root, &p("d/one")).unwrap();

        let d = tree_at(&store, root, "d");
        assert_eq!(d.len(), 1);
        assert!(d.get("two").is_some());
    }

    #[test]
    fn test_remove_directory_entry_drops_subtree() {
        let store = MemoryObjectStore::new();
        let root = put(&store, empty_root(&store), "d/sub/a", b"a");
        let root = put(&store, root, "d/sub/b", b"b");
        let root = put(&store, root, "d/c", b"c");
        let root = TreeMutator::new(&store).remove(&root, &p("d/sub")).unwrap();
        let d = tree_at(&store, root, "d");
        assert_eq!(d.len(), 1);
        assert!(d.get("c").is_some());
    }

    #[test]
    fn test_remove_missing_paths() {
        let store = MemoryObjectStore::new();
        let root = put(&store, empty_root(&store), "a/b", b"b");
        let mutator = TreeMutator::new(&store);

        assert!(matches!(mutator.remove(&root, &p("a/c")), Err(RepoError::NotFound(_))));
        assert!(matches!(mutator.remove(&root, &p("q/b")), Err(RepoError::NotFound(_))));
        assert!(matches!(mutator.remove(&root, &p("a/b/c")), Err(RepoError::NotFound(_))));
        assert!(matches!(
            mutator.remove(&root, &RepoPath::root()),
            Err(RepoError::InvalidPath(_))
        ));
    }

    #[test]
    fn test_previous_root_is_untouched() {
        let store = MemoryObjectStore::new();
        let old_root = put(&store, empty_root(&store), "a/b", b"old");
        let old_encoding = store.get_raw(&old_root).unwrap().unwrap();

        let new_root = put(&store, old_root, "a/b", b"new");
        let new_root = TreeMutator::new(&store).remove(&new_root, &p("a/b")).unwrap();
        assert_ne!(old_root, new_root);

        assert_eq!(store.get_raw(&old_root).unwrap().unwrap(), old_encoding);
        let nav = TreeNavigator::new(&store, old_root);
        assert_eq!(nav.read_blob(&p("a/b")).unwrap(), b"old");
        assert!(matches!(
            store.get(&old_root).unwrap(),
            Some(Object::Tree(_))
        ));
    }
}
