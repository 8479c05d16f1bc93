//! Repository paths
//!
//! A `RepoPath` is a normalized, `/`-joined relative path that knows its parent
//! path and leaf name, in the manner of `dirname` and `basename`. The root is
//! the empty path: it has neither parent nor name.

use crate::error::RepoError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const SEPARATOR: char = '/';

/// Normalized relative path inside the repository tree
///
/// Serializes as the plain path string; deserializing goes through `parse`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct RepoPath {
    /// Full normalized path
    path: String,
    /// Length of the parent part within `path`
    parent_len: usize,
}

impl RepoPath {
    /// The repository root
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse and normalize a raw path
    ///
    /// `""` and `"/"` denote the root. Any other absolute path is rejected, as
    /// is any `.` or `..` segment. Empty segments are dropped, so `a//b/` is
    /// `a/b`.
    pub fn parse(raw: &str) -> Result<Self, RepoError> {
        if raw.is_empty() || raw == "/" {
            return Ok(Self::root());
        }
        if raw.starts_with(SEPARATOR) {
            return Err(RepoError::InvalidPath(format!(
                "absolute path forbidden: {}",
                raw
            )));
        }

        let mut segments = Vec::new();
        for segment in raw.split(SEPARATOR).filter(|s| !s.is_empty()) {
            check_segment(segment).map_err(|reason| {
                RepoError::InvalidPath(format!("{}: {}", reason, raw))
            })?;
            segments.push(segment);
        }
        Ok(Self::from_segments(&segments))
    }

    fn from_segments(segments: &[&str]) -> Self {
        match segments.split_last() {
            None => Self::root(),
            Some((_, parents)) => {
                let parent = parents.join("/");
                let path = segments.join("/");
                Self {
                    parent_len: parent.len(),
                    path,
                }
            }
        }
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Leaf name, empty for the root
    pub fn name(&self) -> &str {
        if self.is_root() {
            return "";
        }
        let start = if self.parent_len == 0 {
            0
        } else {
            self.parent_len + 1
        };
        &self.path[start..]
    }

    /// Parent path as a string, empty at the top level and for the root
    pub fn parent_str(&self) -> &str {
        &self.path[..self.parent_len]
    }

    /// Parent path, `None` for the root
    pub fn parent(&self) -> Option<RepoPath> {
        if self.is_root() {
            return None;
        }
        let segments: Vec<&str> = self.segments().collect();
        Some(Self::from_segments(&segments[..segments.len() - 1]))
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split(SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Number of segments, zero for the root
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Split into directory segments and leaf name, `None` for the root
    pub fn split_leaf(&self) -> Option<(Vec<&str>, &str)> {
        if self.is_root() {
            return None;
        }
        let mut segments: Vec<&str> = self.segments().collect();
        let name = segments.pop()?;
        Some((segments, name))
    }

    /// Join a single entry name onto this path
    ///
    /// Joining onto the root yields the bare name, without a leading separator.
    pub fn resolve(&self, name: &str) -> Result<RepoPath, RepoError> {
        validate_name(name)?;
        check_segment(name)
            .map_err(|reason| RepoError::InvalidPath(format!("{}: {}", reason, name)))?;
        let mut segments: Vec<&str> = self.segments().collect();
        segments.push(name);
        Ok(Self::from_segments(&segments))
    }

    /// Path of the first `depth` segments
    pub(crate) fn prefix(&self, depth: usize) -> RepoPath {
        let segments: Vec<&str> = self.segments().take(depth).collect();
        Self::from_segments(&segments)
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl std::str::FromStr for RepoPath {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RepoPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.path)
    }
}

impl<'de> Deserialize<'de> for RepoPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

fn check_segment(segment: &str) -> Result<(), &'static str> {
    match segment {
        "." => Err("current-directory segment forbidden"),
        ".." => Err("parent-directory segment forbidden"),
        s if s.contains('\0') => Err("NUL byte forbidden"),
        _ => Ok(()),
    }
}

/// Validate a stored parent path: no leading `/`, no leading `.`
pub fn validate_parent_path(path: &str) -> Result<(), RepoError> {
    if path.starts_with(SEPARATOR) {
        return Err(RepoError::InvalidPath(format!(
            "absolute path forbidden: {}",
            path
        )));
    }
    if path.starts_with('.') {
        return Err(RepoError::InvalidPath(format!(
            "relative path forbidden: {}",
            path
        )));
    }
    Ok(())
}

/// Validate a single entry name: must not contain a separator
pub fn validate_name(name: &str) -> Result<(), RepoError> {
    if name.contains(SEPARATOR) {
        return Err(RepoError::InvalidPath(format!("path forbidden in name: {}", name)));
    }
    Ok(())
}
