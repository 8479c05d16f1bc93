//! Permission checks wrapped around repository reads

use super::{memory_repo, put};
use gitstore::acl::{AccessControl, MemoryPermissionStore, PermissionManager, Principal};
use gitstore::RepoPath;

#[test]
fn test_listing_filtered_by_grants() {
    let repo = memory_repo();
    put(&repo, "team/plan.md", b"plan");
    put(&repo, "team/budget.xlsx", b"money");
    put(&repo, "team/notes.txt", b"notes");

    let acl = PermissionManager::new(MemoryPermissionStore::new());
    let alice = Principal::user("alice");
    acl.grant(&[alice.clone()], &RepoPath::parse("team/plan.md").unwrap())
        .unwrap();
    acl.grant(&[Principal::Anonymous], &RepoPath::parse("team/notes.txt").unwrap())
        .unwrap();

    let team = RepoPath::parse("team").unwrap();
    let listing = repo.listdir("team").unwrap();
    let names: Vec<&str> = listing.blobs.iter().map(|e| e.name.as_str()).collect();

    let for_alice = acl.allowed_child_names(&alice, &team).unwrap().filter(names.clone());
    assert_eq!(for_alice, vec!["plan.md"]);

    let for_anonymous = acl
        .allowed_child_names(&Principal::Anonymous, &team)
        .unwrap()
        .filter(names.clone());
    assert_eq!(for_anonymous, vec!["notes.txt"]);

    let admin = Principal::Superuser("admin".to_string());
    assert_eq!(
        acl.allowed_child_names(&admin, &team).unwrap().filter(names.clone()),
        names
    );
}

#[test]
fn test_permissions_are_not_versioned() {
    let repo = memory_repo();
    put(&repo, "shared.txt", b"v1");
    let before = repo.head().unwrap();

    let acl = PermissionManager::new(MemoryPermissionStore::new());
    let path = RepoPath::parse("shared.txt").unwrap();
    acl.grant(&[Principal::user("bob")], &path).unwrap();

    assert_eq!(repo.head().unwrap(), before);
    repo.remove("shared.txt").unwrap();
    assert!(acl.is_allowed(&Principal::user("bob"), &path).unwrap());
}
