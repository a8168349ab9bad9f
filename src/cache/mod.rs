//! Cache module for generated snapshots
//!
//! `CacheDb` is the on-disk manifest of the pages written by the last
//! `generate` run. It lets a rebuild skip writing unchanged pages and remove
//! snapshots of posts that are no longer pre-generated. `RenderCache` is the
//! in-memory counterpart used while hosting.

mod revalidate;

pub use revalidate::{RenderCache, Resolution, MAX_NOT_FOUND};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

/// Cache directory, relative to the site root
pub const CACHE_DIR: &str = ".space-traveling-cache";

/// Manifest file inside the cache directory
const CACHE_FILE: &str = "db.json";

/// A generated page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Hash of the rendered HTML
    pub content_hash: u64,
    /// When the page was last written (unix timestamp)
    pub generated_at: u64,
    /// Output path relative to the public dir
    pub output_path: String,
}

/// Manifest of generated pages, keyed by route
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CacheDb {
    /// Version of the cache format
    pub version: u32,
    pub pages: BTreeMap<String, CacheEntry>,
}

impl CacheDb {
    /// Current cache format version
    const VERSION: u32 = 1;

    /// Load cache from disk, or create a new empty cache
    pub fn load(base_dir: &Path) -> Self {
        let cache_path = base_dir.join(CACHE_DIR).join(CACHE_FILE);
        if let Ok(content) = fs::read_to_string(&cache_path) {
            match serde_json::from_str::<CacheDb>(&content) {
                Ok(cache) if cache.version == Self::VERSION => return cache,
                Ok(_) => tracing::info!("Cache version mismatch, rebuilding cache"),
                Err(e) => tracing::warn!("Ignoring unreadable cache {:?}: {}", cache_path, e),
            }
        }
        Self::new()
    }

    /// Save cache to disk
    pub fn save(&self, base_dir: &Path) -> Result<()> {
        let cache_dir = base_dir.join(CACHE_DIR);
        fs::create_dir_all(&cache_dir)?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(cache_dir.join(CACHE_FILE), content)?;
        Ok(())
    }

    /// Create a new cache with version set
    pub fn new() -> Self {
        Self {
            version: Self::VERSION,
            ..Default::default()
        }
    }

    /// Whether `route` was last written with the same content and the file is still there
    pub fn is_unchanged(&self, route: &str, content_hash: u64, public_dir: &Path) -> bool {
        self.pages.get(route).is_some_and(|entry| {
            entry.content_hash == content_hash && public_dir.join(&entry.output_path).exists()
        })
    }

    /// Record a written page
    pub fn record(&mut self, route: &str, content_hash: u64, output_path: &str) {
        self.pages.insert(
            route.to_string(),
            CacheEntry {
                content_hash,
                generated_at: unix_now(),
                output_path: output_path.to_string(),
            },
        );
    }

    /// Drop every route not in `keep`, returning the dropped entries
    pub fn retain_routes(&mut self, keep: &[String]) -> Vec<(String, CacheEntry)> {
        let stale: Vec<String> = self
            .pages
            .keys()
            .filter(|route| !keep.contains(route))
            .cloned()
            .collect();

        stale
            .into_iter()
            .filter_map(|route| self.pages.remove_entry(&route))
            .collect()
    }
}

/// Calculate a hash for rendered content
pub fn hash_content(content: &str) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
