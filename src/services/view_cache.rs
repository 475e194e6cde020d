//! Rendered listing fragments, invalidated explicitly after writes.
//!
//! Every successful create, update or delete marks the entity's listing path
//! stale. The next listing request misses the cache, re-reads the store and
//! renders a fresh fragment. A time-to-live bounds how long a fragment may be
//! served when the write happened in another process (the CLI).

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::debug;

pub const USERS_LISTING: &str = "/users";
pub const PRODUCTS_LISTING: &str = "/products";

/// Receives the "this listing no longer reflects the store" signal.
#[cfg_attr(test, mockall::automock)]
pub trait ListingInvalidator: Send + Sync {
    fn mark_stale(&self, path: &str);
}

/// Proof of which generation a render started from.
///
/// A render that raced with a write carries an old generation and is
/// discarded by [`ViewCache::store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTicket {
    path: String,
    generation: u64,
}

#[derive(Default)]
struct Entry {
    generation: u64,
    view: Option<(String, Instant)>,
}

pub struct ViewCache {
    entries: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
}

impl ViewCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Cached fragment for `path` if one exists and is younger than the TTL.
    pub fn get(&self, path: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(path)
            .and_then(|entry| entry.view.as_ref())
            .filter(|(_, rendered_at)| rendered_at.elapsed() < self.ttl)
            .map(|(html, _)| html.clone())
    }

    /// Records the current generation before the store is read.
    pub fn ticket(&self, path: &str) -> RenderTicket {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        RenderTicket {
            path: path.to_string(),
            generation: entries.get(path).map(|e| e.generation).unwrap_or(0),
        }
    }

    /// Stores a fragment unless the listing was invalidated since `ticket`
    /// was taken. Returns whether the fragment was kept.
    pub fn store(&self, ticket: RenderTicket, html: String) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.entry(ticket.path).or_default();
        if entry.generation != ticket.generation {
            return false;
        }
        entry.view = Some((html, Instant::now()));
        true
    }

    pub fn is_stale(&self, path: &str) -> bool {
        self.get(path).is_none()
    }
}

impl ListingInvalidator for ViewCache {
    fn mark_stale(&self, path: &str) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.entry(path.to_string()).or_default();
        entry.generation += 1;
        entry.view = None;
        debug!("Listing {} marked stale (generation {})", path, entry.generation);
    }
}
