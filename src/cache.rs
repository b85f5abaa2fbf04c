// src/cache.rs
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::CacheConfig;
use crate::errors::{RelayError, Result};

/// Receives "this view is stale" notifications.
///
/// Invalidation is fire-and-forget and idempotent: invalidating a view twice
/// leaves the cache in the same state as invalidating it once.
pub trait ViewCache: Send + Sync {
    fn invalidate(&self, tag: &str) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Clone)]
pub struct CachedView {
    pub value: Value,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Default)]
struct Views {
    entries: HashMap<String, CachedView>,
    /// Bumped on every invalidation of a tag.
    generations: HashMap<String, u64>,
}

/// In-process cache of rendered views, keyed by path plus optional query.
#[derive(Clone)]
pub struct MemoryViewCache {
    views: Arc<RwLock<Views>>,
    ttl: Option<TimeDelta>,
    max_entries: usize,
}

pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// `None` when `secs` does not fit in a `TimeDelta`.
pub fn ttl_from_secs(secs: u64) -> Option<TimeDelta> {
    i64::try_from(secs).ok().and_then(TimeDelta::try_seconds)
}

/// The view a key belongs to: everything before the query string.
fn tag_of(key: &str) -> &str {
    key.split_once('?').map_or(key, |(tag, _)| tag)
}

impl Default for MemoryViewCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryViewCache {
    pub fn new() -> Self {
        Self::with_limits(None, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_limits(ttl: Option<TimeDelta>, max_entries: usize) -> Self {
        Self {
            views: Arc::default(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        let ttl = match config.ttl_secs {
            Some(secs) => Some(ttl_from_secs(secs).ok_or_else(|| {
                RelayError::Config(format!("cache.ttl_secs is out of range: {}", secs))
            })?),
            None => None,
        };
        Ok(Self::with_limits(
            ttl,
            config.max_entries.unwrap_or(DEFAULT_MAX_ENTRIES),
        ))
    }

    /// Returns the view stored under `key` unless it has expired. Expired views are dropped.
    pub async fn get(&self, key: &str) -> Option<CachedView> {
        {
            let views = self.views.read().await;
            let view = views.entries.get(key)?;
            if !self.is_expired(view) {
                return Some(view.clone());
            }
        }

        let mut views = self.views.write().await;
        if views.entries.get(key).is_some_and(|v| self.is_expired(v)) {
            views.entries.remove(key);
        }
        None
    }

    /// Current generation of the view `key` belongs to.
    ///
    /// Read it before fetching and pass it to [`MemoryViewCache::store_at`] so a
    /// fetch that raced with an invalidation is not cached.
    pub async fn generation(&self, key: &str) -> u64 {
        let views = self.views.read().await;
        views.generations.get(tag_of(key)).copied().unwrap_or(0)
    }

    pub async fn store(&self, key: &str, value: Value) -> CachedView {
        let view = CachedView {
            value,
            fetched_at: Utc::now(),
        };
        let mut views = self.views.write().await;
        self.insert(&mut views, key, view.clone());
        view
    }

    /// Stores `value` only if the view has not been invalidated since `generation` was read.
    /// Returns `None` when the write was dropped.
    pub async fn store_at(&self, key: &str, generation: u64, value: Value) -> Option<CachedView> {
        let mut views = self.views.write().await;
        let current = views.generations.get(tag_of(key)).copied().unwrap_or(0);
        if current != generation {
            log::debug!("Not caching '{}': invalidated while fetching", key);
            return None;
        }

        let view = CachedView {
            value,
            fetched_at: Utc::now(),
        };
        self.insert(&mut views, key, view.clone());
        Some(view)
    }

    pub async fn len(&self) -> usize {
        self.views.read().await.entries.len()
    }

    fn insert(&self, views: &mut Views, key: &str, view: CachedView) {
        if self.ttl.is_some() {
            views.entries.retain(|_, v| !self.is_expired(v));
        }
        while views.entries.len() >= self.max_entries && !views.entries.contains_key(key) {
            let oldest = views
                .entries
                .iter()
                .min_by_key(|(_, v)| v.fetched_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    views.entries.remove(&k);
                }
                None => break,
            }
        }
        views.entries.insert(key.to_string(), view);
    }

    fn is_expired(&self, view: &CachedView) -> bool {
        match self.ttl {
            Some(ttl) => Utc::now() - view.fetched_at >= ttl,
            None => false,
        }
    }
}

impl ViewCache for MemoryViewCache {
    /// Drops `tag` and every query variant of it (`tag?...`).
    async fn invalidate(&self, tag: &str) {
        let prefix = format!("{}?", tag);
        let mut views = self.views.write().await;
        *views.generations.entry(tag.to_string()).or_insert(0) += 1;

        let before = views.entries.len();
        views
            .entries
            .retain(|key, _| key != tag && !key.starts_with(&prefix));
        log::info!(
            "Invalidated view '{}' ({} cached entries dropped)",
            tag,
            before - views.entries.len()
        );
    }
}
