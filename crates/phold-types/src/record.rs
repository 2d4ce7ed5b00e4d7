use serde::{Deserialize, Serialize};

use crate::hash::ContentHash;

/// A reconciled placeholder: one tracked path and the hash it stands in for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderRecord {
    /// Path relative to the virtualization root.
    pub path: String,
    /// Content hash, or [`ContentHash::ZERO`] for a directory placeholder.
    pub content_hash: ContentHash,
}

impl PlaceholderRecord {
    pub fn new(path: impl Into<String>, content_hash: ContentHash) -> Self {
        Self {
            path: path.into(),
            content_hash,
        }
    }

    /// A file placeholder pinned to `content_hash`.
    pub fn file(path: impl Into<String>, content_hash: ContentHash) -> Self {
        Self::new(path, content_hash)
    }

    /// A directory placeholder.
    pub fn folder(path: impl Into<String>) -> Self {
        Self::new(path, ContentHash::ZERO)
    }

    /// Returns `true` if this record is a directory placeholder.
    pub fn is_folder(&self) -> bool {
        self.content_hash.is_zero()
    }
}
