//! Object Store
//!
//! Content-addressed storage for blobs, trees and commits, plus the named
//! references pointing at commits. Objects are write-once; references are the
//! only mutable state and only move through compare-and-swap.

pub mod memory;
pub mod persistence;

pub use memory::MemoryObjectStore;
pub use persistence::SledObjectStore;

use crate::error::StorageError;
use crate::object::{encode_blob, encoded_blob_len, Commit, Object, Tree};
use crate::types::ObjectId;
use std::io::Read;

/// Object store interface
///
/// Implementations provide raw byte storage keyed by id and an atomic
/// reference table; encoding and hashing are shared by the provided methods.
pub trait ObjectStore: Send + Sync {
    /// Raw encoded bytes of an object, if present
    fn get_raw(&self, id: &ObjectId) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store encoded bytes under their id. Writing an existing id is a no-op.
    fn put_raw(&self, id: &ObjectId, encoded: Vec<u8>) -> Result<(), StorageError>;

    fn contains(&self, id: &ObjectId) -> Result<bool, StorageError>;

    /// Current value of a reference
    fn read_ref(&self, name: &str) -> Result<Option<ObjectId>, StorageError>;

    /// Atomically set `name` to `new` if it currently equals `expected`
    /// (`None` meaning the reference does not exist). Returns whether the
    /// swap happened. An error means the reference was left untouched.
    fn compare_and_swap_ref(
        &self,
        name: &str,
        expected: Option<ObjectId>,
        new: ObjectId,
    ) -> Result<bool, StorageError>;

    fn get(&self, id: &ObjectId) -> Result<Option<Object>, StorageError> {
        match self.get_raw(id)? {
            Some(bytes) => Ok(Some(Object::decode(*id, &bytes)?)),
            None => Ok(None),
        }
    }

    /// Content length of the blob `id`, without decoding it
    ///
    /// `None` when the object is missing or is not a blob. Stores that can
    /// borrow their encoded bytes override this to avoid the copy.
    fn blob_size(&self, id: &ObjectId) -> Result<Option<u64>, StorageError> {
        match self.get_raw(id)? {
            Some(bytes) => encoded_blob_len(id, &bytes),
            None => Ok(None),
        }
    }

    fn put(&self, object: &Object) -> Result<ObjectId, StorageError> {
        let encoded = object.encode()?;
        let id = ObjectId::digest(&encoded);
        tracing::trace!(id = %id.short(), kind = object.kind_name(), "Writing object");
        self.put_raw(&id, encoded)?;
        Ok(id)
    }

    /// Write blob content read from a stream
    fn put_blob(&self, reader: &mut dyn Read) -> Result<ObjectId, StorageError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.put_blob_bytes(&data)
    }

    fn put_blob_bytes(&self, data: &[u8]) -> Result<ObjectId, StorageError> {
        let encoded = encode_blob(data);
        let id = ObjectId::digest(&encoded);
        tracing::trace!(id = %id.short(), size = data.len(), "Writing blob");
        self.put_raw(&id, encoded)?;
        Ok(id)
    }

    fn put_tree(&self, tree: &Tree) -> Result<ObjectId, StorageError> {
        self.put(&Object::Tree(tree.clone()))
    }

    fn put_commit(&self, commit: &Commit) -> Result<ObjectId, StorageError> {
        self.put(&Object::Commit(commit.clone()))
    }
}
