//! Optimistic concurrency on the reference

use super::{memory_repo, put};
use gitstore::config::RepositoryConfig;
use gitstore::store::{MemoryObjectStore, ObjectStore, SledObjectStore};
use gitstore::{FileMode, RepoError, RepoPath, Repository};
use std::sync::{Arc, Barrier};
use std::thread;

#[test]
fn test_second_writer_on_same_head_conflicts() {
    let repo = memory_repo();
    put(&repo, "base.txt", b"base");
    let start = repo.head().unwrap();

    let left = repo.store().put_blob_bytes(b"left").unwrap();
    let right = repo.store().put_blob_bytes(b"right").unwrap();
    let left_path = RepoPath::parse("left.txt").unwrap();
    let right_path = RepoPath::parse("right.txt").unwrap();

    let winner = repo
        .insert_on(&start, &left_path, left, FileMode::Regular)
        .unwrap();
    let loser = repo.insert_on(&start, &right_path, right, FileMode::Regular);
    match loser {
        Err(RepoError::ConcurrentModification {
            expected, found, ..
        }) => {
            assert_eq!(expected, Some(start.commit));
            assert_eq!(found, Some(winner.commit));
        }
        other => panic!("expected ConcurrentModification, got {:?}", other),
    }
    assert!(!repo.exists("right.txt").unwrap());

    // Retry against the new head
    let head = repo.head().unwrap();
    repo.insert_on(&head, &right_path, right, FileMode::Regular)
        .unwrap();
    assert_eq!(repo.read("base.txt").unwrap(), b"base");
    assert_eq!(repo.read("left.txt").unwrap(), b"left");
    assert_eq!(repo.read("right.txt").unwrap(), b"right");
}

#[test]
fn test_remove_on_stale_head_conflicts() {
    let repo = memory_repo();
    put(&repo, "a", b"a");
    put(&repo, "b", b"b");
    let start = repo.head().unwrap();

    repo.remove_on(&start, &RepoPath::parse("a").unwrap())
        .unwrap();
    let result = repo.remove_on(&start, &RepoPath::parse("b").unwrap());
    assert!(result.unwrap_err().is_retryable());
    assert!(repo.exists("b").unwrap());
}

fn race_threads<S: ObjectStore + 'static>(repo: Repository<S>, writers: usize) {
    let barrier = Arc::new(Barrier::new(writers));
    let handles: Vec<_> = (0..writers)
        .map(|i| {
            let repo = repo.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let path = RepoPath::parse(&format!("shared/writer-{}.txt", i)).unwrap();
                let blob = repo
                    .store()
                    .put_blob_bytes(format!("from {}", i).as_bytes())
                    .unwrap();
                barrier.wait();
                repo.retry(writers * 4, |repo| {
                    repo.insert_on(&repo.head()?, &path, blob, FileMode::Regular)
                })
                .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let listing = repo.listdir("shared").unwrap();
    assert_eq!(listing.blobs.len(), writers);
    for i in 0..writers {
        assert_eq!(
            repo.read(&format!("shared/writer-{}.txt", i)).unwrap(),
            format!("from {}", i).into_bytes()
        );
    }
    // One initial commit plus one per writer, in a single linear chain
    assert_eq!(repo.history(None).unwrap().len(), writers + 1);
}

#[test]
fn test_threaded_writers_all_land_in_memory() {
    let repo = Repository::new(
        Arc::new(MemoryObjectStore::new()),
        RepositoryConfig::default(),
    )
    .unwrap();
    race_threads(repo, 8);
}

#[test]
fn test_threaded_writers_all_land_in_sled() {
    let temp = tempfile::tempdir().unwrap();
    let store = SledObjectStore::open(temp.path()).unwrap();
    let repo = Repository::new(Arc::new(store), RepositoryConfig::default()).unwrap();
    race_threads(repo, 4);
}
