//! gitstore: version-controlled hierarchical object store
//!
//! Files and directories live in a content-addressed tree of immutable blob,
//! tree and commit objects. A single named reference points at the current
//! commit; every write builds a new chain of trees from the edited leaf up to
//! the root and publishes it by compare-and-swap on that reference.

pub mod acl;
pub mod commit;
pub mod config;
pub mod error;
pub mod heads;
pub mod logging;
pub mod object;
pub mod path;
pub mod repository;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;

pub use error::{ApiError, RepoError, StorageError};
pub use object::{FileMode, Identity};
pub use path::RepoPath;
pub use repository::Repository;
pub use types::ObjectId;
