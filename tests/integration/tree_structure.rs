//! Structural sharing, pruning and history preservation

use super::{memory_repo, put};
use gitstore::object::{Object, Tree};
use gitstore::store::ObjectStore;
use gitstore::tree::TreeNavigator;
use gitstore::{ObjectId, RepoError};

fn tree_at(
    repo: &gitstore::Repository<gitstore::store::MemoryObjectStore>,
    root: ObjectId,
    path: &str,
) -> Tree {
    TreeNavigator::new(repo.store(), root)
        .open_tree(&path.parse().unwrap())
        .unwrap()
}

#[test]
fn test_round_trip() {
    let repo = memory_repo();
    put(&repo, "a/b/c.bin", &[0, 159, 146, 150]);
    assert_eq!(repo.read("a/b/c.bin").unwrap(), vec![0, 159, 146, 150]);
}

#[test]
fn test_idempotent_overwrite() {
    let repo = memory_repo();
    put(&repo, "same.txt", b"content");
    let first = repo.head().unwrap();
    put(&repo, "same.txt", b"content");
    let second = repo.head().unwrap();

    assert_ne!(first.commit, second.commit);
    assert_eq!(first.root, second.root);
    assert_eq!(repo.read("same.txt").unwrap(), b"content");
}

#[test]
fn test_sibling_preservation() {
    let repo = memory_repo();
    put(&repo, "a/b/c", b"c");
    put(&repo, "a/b/d", b"d");
    put(&repo, "a/other/x", b"x");
    let before = repo.head().unwrap();
    let a_before = tree_at(&repo, before.root, "a");
    let b_before = tree_at(&repo, before.root, "a/b");

    put(&repo, "a/b/e", b"e");
    let after = repo.head().unwrap();
    let a_after = tree_at(&repo, after.root, "a");
    let b_after = tree_at(&repo, after.root, "a/b");

    assert_eq!(a_before.get("other"), a_after.get("other"));
    assert_ne!(a_before.get("b"), a_after.get("b"));
    assert_eq!(b_before.get("c"), b_after.get("c"));
    assert_eq!(b_before.get("d"), b_after.get("d"));
    assert!(b_after.get("e").is_some());
    assert_eq!(repo.read("a/b/c").unwrap(), b"c");
    assert_eq!(repo.read("a/b/d").unwrap(), b"d");
}

#[test]
fn test_pruning_removes_emptied_ancestors() {
    let repo = memory_repo();
    put(&repo, "x/y/z", b"z");
    repo.remove("x/y/z").unwrap();
    assert!(!repo.exists("x").unwrap());
    assert!(repo.listdir("").unwrap().is_empty());
}

#[test]
fn test_pruning_stops_at_non_empty_ancestor() {
    let repo = memory_repo();
    put(&repo, "x/y/z", b"z");
    put(&repo, "x/keep", b"k");
    repo.remove("x/y/z").unwrap();

    assert!(repo.exists("x").unwrap());
    assert!(!repo.exists("x/y").unwrap());
    let listing = repo.listdir("x").unwrap();
    assert!(listing.directories.is_empty());
    assert_eq!(listing.blobs.len(), 1);
    assert_eq!(listing.blobs[0].name, "keep");
}

#[test]
fn test_old_heads_stay_readable() {
    let repo = memory_repo();
    put(&repo, "doc.txt", b"v1");
    put(&repo, "dir/inner.txt", b"inner");
    let old = repo.head().unwrap();

    put(&repo, "doc.txt", b"v2");
    repo.remove("dir/inner.txt").unwrap();

    let nav = TreeNavigator::new(repo.store(), old.root);
    assert_eq!(nav.read_blob(&"doc.txt".parse().unwrap()).unwrap(), b"v1");
    assert_eq!(nav.read_blob(&"dir/inner.txt".parse().unwrap()).unwrap(), b"inner");
    assert!(matches!(repo.store().get(&old.commit).unwrap(), Some(Object::Commit(_))));
    assert_eq!(repo.read("doc.txt").unwrap(), b"v2");
    assert!(!repo.exists("dir").unwrap());
}

#[test]
fn test_path_rejection() {
    let repo = memory_repo();
    for raw in ["/etc/passwd", "../x", "./x", "a/../b", "a/./b"] {
        let result = repo.insert(raw, &mut &b"x"[..], gitstore::FileMode::Regular);
        assert!(
            matches!(result, Err(RepoError::InvalidPath(_))),
            "{} should be rejected",
            raw
        );
    }
    assert!(repo.listdir("").unwrap().is_empty());
}

#[test]
fn test_type_conflicts() {
    let repo = memory_repo();
    put(&repo, "dir/file", b"data");
    let head = repo.head().unwrap();

    let over_dir = repo.insert("dir", &mut &b"x"[..], gitstore::FileMode::Regular);
    assert!(matches!(over_dir, Err(RepoError::NotABlob(_))));
    let through_blob = repo.insert("dir/file/child", &mut &b"x"[..], gitstore::FileMode::Regular);
    assert!(matches!(through_blob, Err(RepoError::NotADirectory(_))));
    assert_eq!(repo.head().unwrap(), head);
}

#[test]
fn test_remove_directory_drops_subtree() {
    let repo = memory_repo();
    put(&repo, "tree/a", b"a");
    put(&repo, "tree/sub/b", b"b");
    put(&repo, "other", b"o");
    repo.remove("tree").unwrap();
    assert!(!repo.exists("tree").unwrap());
    assert!(repo.exists("other").unwrap());
}
