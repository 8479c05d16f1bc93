//! Integration tests for the gitstore repository

mod access_control;
mod concurrent_writers;
mod properties;
mod store_integration;
mod tree_structure;

use gitstore::config::RepositoryConfig;
use gitstore::store::MemoryObjectStore;
use gitstore::{FileMode, RepoPath, Repository};
use std::sync::Arc;

pub(crate) fn memory_repo() -> Repository<MemoryObjectStore> {
    Repository::new(Arc::new(MemoryObjectStore::new()), RepositoryConfig::default()).unwrap()
}

pub(crate) fn put<S: gitstore::store::ObjectStore + ?Sized>(
    repo: &Repository<S>,
    path: &str,
    data: &[u8],
) -> RepoPath {
    let mut content = data;
    repo.insert(path, &mut content, FileMode::Regular).unwrap()
}
