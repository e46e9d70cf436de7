//! Per-load memo of resolved artifacts, keyed by artifact path

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use xcgraph_core::Node;

/// Resolved precompiled nodes. Thread-safe for concurrent resolution.
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: DashMap<PathBuf, Node>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<Node> {
        match self.entries.get(path) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value().clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a resolved node. The first insert for a path wins.
    pub fn insert(&self, path: PathBuf, node: Node) {
        self.entries.entry(path).or_insert(node);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}
