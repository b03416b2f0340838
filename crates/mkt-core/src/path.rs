//! # Issue Paths
//!
//! An [`IssuePath`] locates a value inside a tree document as an ordered
//! sequence of object keys and array indices, e.g. `["children", 2, "type"]`.
//!
//! Paths serialize as plain JSON arrays of strings and integers so that an
//! API consumer (typically a form UI) can walk the submitted document and
//! highlight the exact nested field that failed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One step in an [`IssuePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Array element index.
    Index(usize),
    /// Object key.
    Key(String),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Location of a value within a document, root first.
///
/// The empty path designates the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssuePath(Vec<PathSegment>);

impl IssuePath {
    /// The document root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns a new path extended by an object key.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.into()));
        Self(segments)
    }

    /// Returns a new path extended by an array index.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// Extend this path in place.
    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.0.push(segment.into());
    }

    /// Shorten this path in place to its first `len` segments.
    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }

    /// Returns a copy of the first `len` segments.
    pub fn prefix(&self, len: usize) -> Self {
        Self(self.0[..len.min(self.0.len())].to_vec())
    }

    /// Returns this path followed by every segment of `tail`.
    pub fn join(&self, tail: &IssuePath) -> Self {
        Self(self.0.iter().chain(&tail.0).cloned().collect())
    }

    /// Returns true for the document root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the path has no segments (same as [`is_root`](Self::is_root)).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Number of `children` hops in the path, i.e. the tree depth of the
    /// node the path points into.
    pub fn depth(&self) -> usize {
        self.0
            .windows(2)
            .filter(|pair| {
                matches!(
                    pair,
                    [PathSegment::Key(key), PathSegment::Index(_)] if key == "children"
                )
            })
            .count()
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for IssuePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Renders the path in accessor notation: `children[1].kind`, or `(root)`
/// for the empty path.
impl fmt::Display for IssuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("(root)");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Index(index) => write!(f, "[{index}]")?,
                PathSegment::Key(key) if i == 0 => f.write_str(key)?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
            }
        }
        Ok(())
    }
}
