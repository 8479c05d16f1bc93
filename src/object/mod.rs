//! Repository Objects
//!
//! Immutable, content-addressed objects: blobs, trees and commits.
//! Each object is encoded as a one-byte kind tag followed by its payload, and
//! identified by the BLAKE3 digest of that encoding.

use crate::error::StorageError;
use crate::types::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

const TAG_BLOB: u8 = b'B';
const TAG_TREE: u8 = b'T';
const TAG_COMMIT: u8 = b'C';

/// Kind of a tree entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Blob,
    Executable,
    Directory,
    Symlink,
    /// Link to a commit of another repository (submodule)
    CommitLink,
}

impl EntryKind {
    /// Git-compatible mode bits
    pub fn mode(self) -> u32 {
        match self {
            EntryKind::Blob => 0o100644,
            EntryKind::Executable => 0o100755,
            EntryKind::Directory => 0o040000,
            EntryKind::Symlink => 0o120000,
            EntryKind::CommitLink => 0o160000,
        }
    }

    pub fn from_mode(mode: u32) -> Option<Self> {
        match mode {
            0o100644 => Some(EntryKind::Blob),
            0o100755 => Some(EntryKind::Executable),
            0o040000 => Some(EntryKind::Directory),
            0o120000 => Some(EntryKind::Symlink),
            0o160000 => Some(EntryKind::CommitLink),
            _ => None,
        }
    }

    /// Entries whose target is a blob object
    pub fn is_blob(self) -> bool {
        matches!(
            self,
            EntryKind::Blob | EntryKind::Executable | EntryKind::Symlink
        )
    }

    pub fn is_directory(self) -> bool {
        self == EntryKind::Directory
    }
}

/// Mode requested when writing a blob at a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FileMode {
    #[default]
    Regular,
    Executable,
    Symlink,
}

impl From<FileMode> for EntryKind {
    fn from(mode: FileMode) -> Self {
        match mode {
            FileMode::Regular => EntryKind::Blob,
            FileMode::Executable => EntryKind::Executable,
            FileMode::Symlink => EntryKind::Symlink,
        }
    }
}

/// One named entry of a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub id: ObjectId,
    pub kind: EntryKind,
}

impl TreeEntry {
    pub fn new(id: ObjectId, kind: EntryKind) -> Self {
        Self { id, kind }
    }

    pub fn blob(id: ObjectId, mode: FileMode) -> Self {
        Self::new(id, mode.into())
    }

    pub fn directory(id: ObjectId) -> Self {
        Self::new(id, EntryKind::Directory)
    }

    pub fn mode(&self) -> u32 {
        self.kind.mode()
    }
}

/// Directory listing, ordered by entry name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree holding exactly one entry
    pub fn single(name: impl Into<String>, entry: TreeEntry) -> Self {
        let mut tree = Self::new();
        tree.insert(name, entry);
        tree
    }

    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.get(name)
    }

    /// Set or overwrite an entry, returning the previous one
    pub fn insert(&mut self, name: impl Into<String>, entry: TreeEntry) -> Option<TreeEntry> {
        self.entries.insert(name.into(), entry)
    }

    pub fn remove(&mut self, name: &str) -> Option<TreeEntry> {
        self.entries.remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, TreeEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Tree {
    type Item = (&'a String, &'a TreeEntry);
    type IntoIter = btree_map::Iter<'a, String, TreeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Identity used for author and committer signatures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new("Git Storage", "git@storage")
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Identity stamped with a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub identity: Identity,
    /// Seconds since the unix epoch
    pub time: i64,
    /// Offset from UTC in minutes
    pub offset_minutes: i32,
}

impl Signature {
    pub fn now(identity: &Identity) -> Self {
        let now = chrono::Local::now();
        Self {
            identity: identity.clone(),
            time: now.timestamp(),
            offset_minutes: now.offset().local_minus_utc() / 60,
        }
    }

    pub fn timestamp(&self) -> Option<chrono::DateTime<chrono::FixedOffset>> {
        let offset = chrono::FixedOffset::east_opt(self.offset_minutes * 60)?;
        chrono::DateTime::from_timestamp(self.time, 0).map(|utc| utc.with_timezone(&offset))
    }
}

/// Snapshot of the root tree with its lineage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub author: Signature,
    pub committer: Signature,
    pub message: String,
}

impl Commit {
    pub fn parent(&self) -> Option<ObjectId> {
        self.parents.first().copied()
    }
}

/// Any object held by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Blob(Vec<u8>),
    Tree(Tree),
    Commit(Commit),
}

impl Object {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Object::Blob(_) => "blob",
            Object::Tree(_) => "tree",
            Object::Commit(_) => "commit",
        }
    }

    /// Canonical encoding: kind tag followed by the payload
    pub fn encode(&self) -> Result<Vec<u8>, StorageError> {
        match self {
            Object::Blob(data) => Ok(encode_blob(data)),
            Object::Tree(tree) => encode_tagged(TAG_TREE, tree),
            Object::Commit(commit) => encode_tagged(TAG_COMMIT, commit),
        }
    }

    pub fn decode(id: ObjectId, bytes: &[u8]) -> Result<Self, StorageError> {
        let (tag, payload) = bytes.split_first().ok_or_else(|| StorageError::CorruptedObject {
            id,
            reason: "empty encoding".to_string(),
        })?;
        match *tag {
            TAG_BLOB => Ok(Object::Blob(payload.to_vec())),
            TAG_TREE => Ok(Object::Tree(bincode::deserialize(payload)?)),
            TAG_COMMIT => Ok(Object::Commit(bincode::deserialize(payload)?)),
            other => Err(StorageError::CorruptedObject {
                id,
                reason: format!("unknown kind tag {:#04x}", other),
            }),
        }
    }
}

/// Content length of an encoded object if it is a blob, `None` for other kinds
pub(crate) fn encoded_blob_len(
    id: &ObjectId,
    encoded: &[u8],
) -> Result<Option<u64>, StorageError> {
    match encoded.first() {
        Some(&TAG_BLOB) => Ok(Some((encoded.len() - 1) as u64)),
        Some(_) => Ok(None),
        None => Err(StorageError::CorruptedObject {
            id: *id,
            reason: "empty encoding".to_string(),
        }),
    }
}

pub(crate) fn encode_blob(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + 1);
    out.push(TAG_BLOB);
    out.extend_from_slice(data);
    out
}

fn encode_tagged<T: Serialize>(tag: u8, value: &T) -> Result<Vec<u8>, StorageError> {
    let mut out = vec![tag];
    bincode::serialize_into(&mut out, value)?;
    Ok(out)
}
