//! In-memory snapshots with stale-while-revalidate semantics

use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Upper bound on remembered misses
pub const MAX_NOT_FOUND: usize = 1024;

/// What a request for a route should do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Serve this snapshot. With `refresh` set the caller owns re-rendering it.
    Cached { html: String, refresh: bool },
    /// Nothing usable is cached and the caller now owns rendering the route
    Claimed,
    /// Another caller is rendering the route
    Pending,
    /// The route is known not to exist
    NotFound,
}

#[derive(Debug)]
enum Snapshot {
    Pending,
    Ready(String),
    NotFound,
}

#[derive(Debug)]
struct Entry {
    snapshot: Snapshot,
    rendered_at: Instant,
    refreshing: bool,
}

impl Entry {
    fn new(snapshot: Snapshot, now: Instant) -> Self {
        Self {
            snapshot,
            rendered_at: now,
            refreshing: false,
        }
    }
}

/// Route → rendered HTML, shared by all requests.
///
/// Every state change happens under one write lock, so a route is never
/// rendered by two callers at once.
#[derive(Debug, Default)]
pub struct RenderCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide how to answer a request for `route`
    pub async fn resolve(&self, route: &str, window: Duration) -> Resolution {
        self.resolve_at(route, window, Instant::now()).await
    }

    pub async fn resolve_at(&self, route: &str, window: Duration, now: Instant) -> Resolution {
        let mut entries = self.entries.write().await;

        let entry = match entries.entry(route.to_string()) {
            MapEntry::Vacant(vacant) => {
                vacant.insert(Entry::new(Snapshot::Pending, now));
                return Resolution::Claimed;
            }
            MapEntry::Occupied(occupied) => occupied.into_mut(),
        };

        let stale = now.saturating_duration_since(entry.rendered_at) >= window;

        // expired misses and abandoned claims are up for grabs again
        if stale && matches!(entry.snapshot, Snapshot::NotFound | Snapshot::Pending) {
            *entry = Entry::new(Snapshot::Pending, now);
            return Resolution::Claimed;
        }

        match &entry.snapshot {
            Snapshot::Pending => Resolution::Pending,
            Snapshot::NotFound => Resolution::NotFound,
            Snapshot::Ready(html) => {
                let refresh = stale && !entry.refreshing;
                if refresh {
                    entry.refreshing = true;
                }
                Resolution::Cached {
                    html: html.clone(),
                    refresh,
                }
            }
        }
    }

    /// Store a freshly rendered page
    pub async fn store(&self, route: &str, html: String) {
        self.store_at(route, html, Instant::now()).await
    }

    pub async fn store_at(&self, route: &str, html: String, now: Instant) {
        self.entries
            .write()
            .await
            .insert(route.to_string(), Entry::new(Snapshot::Ready(html), now));
    }

    /// Remember that `route` has no content for `window`.
    ///
    /// Expired misses are dropped here, and at most [`MAX_NOT_FOUND`] are
    /// kept, evicting the oldest first.
    pub async fn store_not_found(&self, route: &str, window: Duration) {
        self.store_not_found_at(route, window, Instant::now()).await
    }

    pub async fn store_not_found_at(&self, route: &str, window: Duration, now: Instant) {
        let mut entries = self.entries.write().await;
        entries.retain(|key, entry| {
            key == route
                || !matches!(entry.snapshot, Snapshot::NotFound)
                || now.saturating_duration_since(entry.rendered_at) < window
        });

        let mut misses: Vec<(Instant, String)> = entries
            .iter()
            .filter(|(key, entry)| {
                key.as_str() != route && matches!(entry.snapshot, Snapshot::NotFound)
            })
            .map(|(key, entry)| (entry.rendered_at, key.clone()))
            .collect();
        if misses.len() >= MAX_NOT_FOUND {
            misses.sort();
            let excess = misses.len() + 1 - MAX_NOT_FOUND;
            for (_, key) in misses.into_iter().take(excess) {
                entries.remove(&key);
            }
        }

        entries.insert(route.to_string(), Entry::new(Snapshot::NotFound, now));
    }

    /// Give up a claim after a failed render. A previous snapshot is kept.
    pub async fn release(&self, route: &str) {
        let mut entries = self.entries.write().await;
        let pending = match entries.get_mut(route) {
            Some(entry) if matches!(entry.snapshot, Snapshot::Pending) => true,
            Some(entry) => {
                entry.refreshing = false;
                false
            }
            None => false,
        };
        if pending {
            entries.remove(route);
        }
    }

    /// Number of cached routes
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
