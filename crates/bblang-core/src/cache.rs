//! Parsed files kept between compilations.
//!
//! One cache lives for the whole server process and is handed to every
//! compilation. The compiler reads and fills it; the server drops entries
//! whenever the backing document changes.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{FileUri, ParsedFile};

/// A cached parse of one file.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Editor version the parse was made from. `None` when read from disk.
    pub version: Option<i32>,
    /// The parsed file.
    pub file: Arc<ParsedFile>,
}

/// Process-wide map from file to its last parse.
#[derive(Debug, Default)]
pub struct CompilationCache {
    entries: RwLock<HashMap<FileUri, CacheEntry>>,
}

impl CompilationCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached parse of `uri`, if it was made from `version`.
    pub fn get(&self, uri: &FileUri, version: Option<i32>) -> Option<Arc<ParsedFile>> {
        let entries = self.entries.read();
        let entry = entries.get(uri)?;
        (entry.version == version).then(|| Arc::clone(&entry.file))
    }

    /// Store the parse of `uri` made from `version`.
    pub fn insert(&self, uri: FileUri, version: Option<i32>, file: Arc<ParsedFile>) {
        self.entries.write().insert(uri, CacheEntry { version, file });
    }

    /// Drop the entry for `uri`. Returns whether there was one.
    pub fn invalidate(&self, uri: &FileUri) -> bool {
        self.entries.write().remove(uri).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of cached files.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(uri: &FileUri) -> Arc<ParsedFile> {
        Arc::new(ParsedFile {
            file: uri.clone(),
            ..Default::default()
        })
    }

    #[test]
    fn test_get_checks_version() {
        let cache = CompilationCache::new();
        let uri = FileUri::new("file:///a.bbc");
        cache.insert(uri.clone(), Some(3), parsed(&uri));

        assert!(cache.get(&uri, Some(3)).is_some());
        assert!(cache.get(&uri, Some(4)).is_none());
        assert!(cache.get(&uri, None).is_none());
    }

    #[test]
    fn test_invalidate() {
        let cache = CompilationCache::new();
        let uri = FileUri::new("file:///a.bbc");
        cache.insert(uri.clone(), None, parsed(&uri));
        assert_eq!(cache.len(), 1);

        assert!(cache.invalidate(&uri));
        assert!(!cache.invalidate(&uri));
        assert!(cache.is_empty());
    }
}
