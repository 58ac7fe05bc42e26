//! Per-source discovery cache.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::sources::ModelSource;
use super::types::{ModelDescriptor, SourceMode};

/// Last discovery result for one source.
#[derive(Debug, Default)]
pub struct DiscoveryCache {
    entries: Vec<ModelDescriptor>,
    fetched_at: Option<Instant>,
}

impl DiscoveryCache {
    /// Fresh means non-empty and fetched less than `ttl` ago.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        !self.entries.is_empty()
            && self
                .fetched_at
                .is_some_and(|fetched_at| fetched_at.elapsed() < ttl)
    }

    pub fn store(&mut self, entries: Vec<ModelDescriptor>) {
        self.entries = entries;
        self.fetched_at = Some(Instant::now());
    }

    pub fn invalidate(&mut self) {
        self.fetched_at = None;
    }

    pub fn entries(&self) -> &[ModelDescriptor] {
        &self.entries
    }
}

/// A [`ModelSource`] behind a TTL cache.
///
/// The lock is never held across the network call, so two concurrent misses
/// may both fetch; the later result wins.
pub struct CachedSource {
    source: Arc<dyn ModelSource>,
    ttl: Duration,
    cache: Mutex<DiscoveryCache>,
}

impl CachedSource {
    pub fn new(source: Arc<dyn ModelSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            cache: Mutex::new(DiscoveryCache::default()),
        }
    }

    pub fn mode(&self) -> SourceMode {
        self.source.mode()
    }

    /// Cached entries when fresh, otherwise a new fetch. Failures yield an
    /// empty list and leave the cache as it was.
    pub async fn models(&self) -> Vec<ModelDescriptor> {
        {
            let cache = self.cache.lock().await;
            if cache.is_fresh(self.ttl) {
                debug!("Using cached {} models", self.mode());
                return cache.entries().to_vec();
            }
        }
        self.fetch().await
    }

    /// Drop freshness and fetch again. Returns the number of entries.
    pub async fn refresh(&self) -> usize {
        self.invalidate().await;
        self.fetch().await.len()
    }

    pub async fn invalidate(&self) {
        self.cache.lock().await.invalidate();
    }

    async fn fetch(&self) -> Vec<ModelDescriptor> {
        match self.source.discover().await {
            Ok(entries) => {
                self.cache.lock().await.store(entries.clone());
                entries
            }
            Err(e) => {
                warn!("{} model discovery failed: {}", self.mode(), e);
                Vec::new()
            }
        }
    }
}
