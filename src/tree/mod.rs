//! Tree navigation and surgery
//!
//! Trees are persistent: every edit produces new tree objects from the
//! changed leaf up to the root and leaves the previous ones untouched.

pub mod mutator;
pub mod navigator;
pub mod walker;

pub use mutator::TreeMutator;
pub use navigator::{Listing, ListingEntry, TreeNavigator};
pub use walker::{walk_blobs, BlobVisit, TreeWalker};

use crate::error::{RepoError, StorageError};
use crate::object::{Object, Tree};
use crate::store::ObjectStore;
use crate::types::ObjectId;

/// Load a tree that another object refers to
///
/// A dangling or mistyped reference means the store is damaged, so both
/// cases surface as storage failures rather than path errors.
pub(crate) fn load_tree<S: ObjectStore + ?Sized>(
    store: &S,
    id: &ObjectId,
) -> Result<Tree, RepoError> {
    match store.get(id)? {
        Some(Object::Tree(tree)) => Ok(tree),
        Some(other) => Err(StorageError::CorruptedObject {
            id: *id,
            reason: format!("expected tree, found {}", other.kind_name()),
        }
        .into()),
        None => Err(StorageError::CorruptedObject {
            id: *id,
            reason: "referenced tree is missing".to_string(),
        }
        .into()),
    }
}
