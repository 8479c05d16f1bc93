//! Path resolution against a root tree.

use super::load_tree;
use crate::error::RepoError;
use crate::object::{EntryKind, Object, Tree, TreeEntry};
use crate::path::RepoPath;
use crate::store::ObjectStore;
use crate::types::ObjectId;
use serde::Serialize;

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    pub name: String,
    pub id: ObjectId,
    pub kind: EntryKind,
    /// Content size, blobs only
    pub size: Option<u64>,
}

/// Directory contents partitioned by kind
///
/// Entries come out in name order, but callers should not rely on it and
/// sort for display themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub directories: Vec<ListingEntry>,
    pub blobs: Vec<ListingEntry>,
}

impl Listing {
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.blobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.directories.len() + self.blobs.len()
    }
}

/// Read-only view of one root tree
pub struct TreeNavigator<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    root: ObjectId,
}

impl<'a, S: ObjectStore + ?Sized> TreeNavigator<'a, S> {
    pub fn new(store: &'a S, root: ObjectId) -> Self {
        Self { store, root }
    }

    pub fn root(&self) -> ObjectId {
        self.root
    }

    /// Entry naming `path` inside its parent directory
    ///
    /// Returns `None` when any segment is missing or when a non-terminal
    /// segment is not a directory. The root has no entry.
    pub fn entry(&self, path: &RepoPath) -> Result<Option<TreeEntry>, RepoError> {
        let Some((dirs, name)) = path.split_leaf() else {
            return Ok(None);
        };
        let mut tree = load_tree(self.store, &self.root)?;
        for segment in dirs {
            match tree.get(segment) {
                Some(entry) if entry.kind.is_directory() => {
                    tree = load_tree(self.store, &entry.id)?;
                }
                _ => return Ok(None),
            }
        }
        Ok(tree.get(name).copied())
    }

    /// Object named by `path`; the root tree for the root path
    pub fn open(&self, path: &RepoPath) -> Result<Object, RepoError> {
        if path.is_root() {
            return Ok(Object::Tree(load_tree(self.store, &self.root)?));
        }
        let entry = self
            .entry(path)?
            .ok_or_else(|| RepoError::NotFound(path.to_string()))?;
        self.store
            .get(&entry.id)?
            .ok_or_else(|| RepoError::NotFound(path.to_string()))
    }

    pub fn open_tree(&self, path: &RepoPath) -> Result<Tree, RepoError> {
        match self.open(path)? {
            Object::Tree(tree) => Ok(tree),
            _ => Err(RepoError::NotADirectory(path.to_string())),
        }
    }

    /// Content of the blob at `path`
    pub fn read_blob(&self, path: &RepoPath) -> Result<Vec<u8>, RepoError> {
        match self.open(path)? {
            Object::Blob(data) => Ok(data),
            _ => Err(RepoError::NotABlob(path.to_string())),
        }
    }

    pub fn listdir(&self, path: &RepoPath) -> Result<Listing, RepoError> {
        let tree = self.open_tree(path)?;
        let mut listing = Listing::default();
        for (name, entry) in &tree {
            match entry.kind {
                EntryKind::Directory => listing.directories.push(ListingEntry {
                    name: name.clone(),
                    id: entry.id,
                    kind: entry.kind,
                    size: None,
                }),
                EntryKind::Blob | EntryKind::Executable | EntryKind::Symlink => {
                    listing.blobs.push(ListingEntry {
                        name: name.clone(),
                        id: entry.id,
                        kind: entry.kind,
                        size: Some(self.blob_size(&entry.id, &path.resolve(name)?)?),
                    })
                }
                EntryKind::CommitLink => {}
            }
        }
        Ok(listing)
    }

    pub fn exists(&self, path: &RepoPath) -> Result<bool, RepoError> {
        if path.is_root() {
            return Ok(true);
        }
        Ok(self.entry(path)?.is_some())
    }

    /// Size in bytes of the blob at `path`
    pub fn size(&self, path: &RepoPath) -> Result<u64, RepoError> {
        if path.is_root() {
            return Err(RepoError::NotABlob(path.to_string()));
        }
        let entry = self
            .entry(path)?
            .ok_or_else(|| RepoError::NotFound(path.to_string()))?;
        if !entry.kind.is_blob() {
            return Err(RepoError::NotABlob(path.to_string()));
        }
        self.blob_size(&entry.id, path)
    }

    fn blob_size(&self, id: &ObjectId, path: &RepoPath) -> Result<u64, RepoError> {
        match self.store.blob_size(id)? {
            Some(size) => Ok(size),
            None if self.store.contains(id)? => Err(RepoError::NotABlob(path.to_string())),
            None => Err(RepoError::NotFound(path.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::FileMode;
    use crate::store::MemoryObjectStore;

    /// Builds `docs/readme.md`, `docs/img/logo.png`, `run.sh` (executable)
    /// and a commit link `vendor`.
    fn fixture(store: &MemoryObjectStore) -> ObjectId {
        let readme = store.put_blob_bytes(b"# docs").unwrap();
        let logo = store.put_blob_bytes(b"PNG....").unwrap();
        let script = store.put_blob_bytes(b"#!/bin/sh\n").unwrap();

        let img = store
            .put_tree(&Tree::single("logo.png", TreeEntry::blob(logo, FileMode::Regular)))
            .unwrap();
        let mut docs = Tree::new();
        docs.insert("readme.md", TreeEntry::blob(readme, FileMode::Regular));
        docs.insert("img", TreeEntry::directory(img));
        let docs = store.put_tree(&docs).unwrap();

        let mut root = Tree::new();
        root.insert("docs", TreeEntry::directory(docs));
        root.insert("run.sh", TreeEntry::blob(script, FileMode::Executable));
        root.insert(
            "vendor",
            TreeEntry::new(ObjectId::digest(b"elsewhere"), EntryKind::CommitLink),
        );
        store.put_tree(&root).unwrap()
    }

    fn p(raw: &str) -> RepoPath {
        RepoPath::parse(raw).unwrap()
    }

    #[test]
    fn test_open_root_and_blob() {
        let store = MemoryObjectStore::new();
        let root = fixture(&store);
        let nav = TreeNavigator::new(&store, root);

        match nav.open(&RepoPath::root()).unwrap() {
            Object::Tree(tree) => assert_eq!(tree.len(), 3),
            other => panic!("expected root tree, got {:?}", other),
        }
        assert_eq!(nav.read_blob(&p("docs/img/logo.png")).unwrap(), b"PNG....");
    }

    #[test]
    fn test_missing_segments() {
        let store = MemoryObjectStore::new();
        let nav = TreeNavigator::new(&store, fixture(&store));

        assert!(matches!(nav.open(&p("nope")), Err(RepoError::NotFound(_))));
        assert!(matches!(nav.open(&p("docs/nope/x")), Err(RepoError::NotFound(_))));
        // Non-terminal blob segment
        assert!(matches!(nav.open(&p("run.sh/x")), Err(RepoError::NotFound(_))));
        // Commit links point outside the store
        assert!(matches!(nav.open(&p("vendor")), Err(RepoError::NotFound(_))));
    }

    #[test]
    fn test_listdir_partitions_entries() {
        let store = MemoryObjectStore::new();
        let nav = TreeNavigator::new(&store, fixture(&store));

        let root = nav.listdir(&RepoPath::root()).unwrap();
        let dirs: Vec<&str> = root.directories.iter().map(|e| e.name.as_str()).collect();
        let blobs: Vec<&str> = root.blobs.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(dirs, vec!["docs"]);
        assert_eq!(blobs, vec!["run.sh"]);
        assert_eq!(root.blobs[0].kind, EntryKind::Executable);
        assert_eq!(root.blobs[0].size, Some(10));

        let docs = nav.listdir(&p("docs")).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs.blobs[0].size, Some(6));

        assert!(matches!(
            nav.listdir(&p("run.sh")),
            Err(RepoError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_exists_and_size() {
        let store = MemoryObjectStore::new();
        let nav = TreeNavigator::new(&store, fixture(&store));

        assert!(nav.exists(&RepoPath::root()).unwrap());
        assert!(nav.exists(&p("docs/img")).unwrap());
        assert!(!nav.exists(&p("docs/missing")).unwrap());

        assert_eq!(nav.size(&p("docs/readme.md")).unwrap(), 6);
        assert!(matches!(nav.size(&p("docs")), Err(RepoError::NotABlob(_))));
        assert!(matches!(nav.size(&p("ghost")), Err(RepoError::NotFound(_))));
    }

    #[test]
    fn test_size_of_root_is_not_a_blob() {
        let store = MemoryObjectStore::new();
        let nav = TreeNavigator::new(&store, fixture(&store));

        assert!(matches!(
            nav.size(&RepoPath::root()),
            Err(RepoError::NotABlob(_))
        ));
    }

    #[test]
    fn test_size_of_entry_pointing_at_tree() {
        let store = MemoryObjectStore::new();
        let inner = store.put_tree(&Tree::new()).unwrap();
        let root = store
            .put_tree(&Tree::single(
                "fake.txt",
                TreeEntry::blob(inner, FileMode::Regular),
            ))
            .unwrap();
        let nav = TreeNavigator::new(&store, root);

        assert!(matches!(nav.size(&p("fake.txt")), Err(RepoError::NotABlob(_))));
    }
}
