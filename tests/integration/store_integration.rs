//! Repository behaviour over the persistent sled store

use super::put;
use gitstore::config::RepositoryConfig;
use gitstore::object::Object;
use gitstore::store::SledObjectStore;
use gitstore::{RepoError, Repository};
use std::sync::Arc;

fn open(path: &std::path::Path) -> Repository<SledObjectStore> {
    let store = SledObjectStore::open(path).unwrap();
    Repository::new(Arc::new(store), RepositoryConfig::default()).unwrap()
}

#[test]
fn test_foo_bar_baz_scenario() {
    let temp = tempfile::tempdir().unwrap();
    let repo = open(temp.path());

    put(&repo, "foo/bar/baz.txt", b"hi");

    let foo = repo.listdir("foo").unwrap();
    assert_eq!(foo.directories.len(), 1);
    assert_eq!(foo.directories[0].name, "bar");
    assert!(foo.blobs.is_empty());

    let bar = repo.listdir("foo/bar").unwrap();
    assert!(bar.directories.is_empty());
    assert_eq!(bar.blobs.len(), 1);
    assert_eq!(bar.blobs[0].name, "baz.txt");
    assert_eq!(bar.blobs[0].size, Some(2));

    match repo.open("foo/bar/baz.txt").unwrap() {
        Object::Blob(data) => assert_eq!(data, b"hi"),
        other => panic!("expected blob, got {}", other.kind_name()),
    }

    repo.remove("foo/bar/baz.txt").unwrap();
    assert!(!repo.exists("foo").unwrap());
    assert!(repo.listdir("").unwrap().is_empty());
}

#[test]
fn test_history_survives_reopen() {
    let temp = tempfile::tempdir().unwrap();
    let head = {
        let repo = open(temp.path());
        put(&repo, "notes/today.md", b"first draft");
        put(&repo, "notes/today.md", b"second draft");
        repo.head().unwrap()
    };

    let repo = open(temp.path());
    assert_eq!(repo.head().unwrap(), head);
    assert_eq!(repo.read("notes/today.md").unwrap(), b"second draft");
    assert_eq!(repo.history(None).unwrap().len(), 3);
}

#[test]
fn test_errors_by_kind() {
    let temp = tempfile::tempdir().unwrap();
    let repo = open(temp.path());
    put(&repo, "dir/file", b"data");

    assert!(matches!(repo.listdir("dir/file"), Err(RepoError::NotADirectory(_))));
    assert!(matches!(repo.size("dir"), Err(RepoError::NotABlob(_))));
    assert!(matches!(repo.size(""), Err(RepoError::NotABlob(_))));
    assert!(matches!(repo.read("dir"), Err(RepoError::NotABlob(_))));
    assert!(matches!(repo.open("dir/missing"), Err(RepoError::NotFound(_))));
    assert!(matches!(repo.open("dir/file/deeper"), Err(RepoError::NotFound(_))));
    assert!(matches!(repo.remove("nowhere/file"), Err(RepoError::NotFound(_))));
    assert_eq!(repo.size("dir/file").unwrap(), 4);
}
