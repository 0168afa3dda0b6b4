//! Memoized resolutions keyed by call-site signature.
//!
//! Lookups take a shared read lock. A miss resolves outside any lock, then
//! takes the write lock and inserts only if no other thread got there first;
//! the first inserted mapping for a signature is the one every caller sees
//! from then on. Failed resolutions are never stored.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::result::ResolutionError;
use super::signature::CallSiteSignature;
use crate::config::CacheConfig;
use crate::member::MemberDescriptor;

/// Counters describing cache activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Resolutions discarded because another thread inserted first.
    pub lost_races: u64,
    pub entries: usize,
}

/// The call-site cache.
#[derive(Debug)]
pub struct CallSiteCache {
    entries: RwLock<FxHashMap<CallSiteSignature, Arc<MemberDescriptor>>>,
    enabled: bool,
    hits: AtomicU64,
    misses: AtomicU64,
    lost_races: AtomicU64,
}

impl Default for CallSiteCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CallSiteCache {
    pub fn new() -> Self {
        Self::with_config(&CacheConfig::default())
    }

    pub fn with_config(config: &CacheConfig) -> Self {
        let capacity = if config.enabled { config.initial_capacity } else { 0 };
        Self {
            entries: RwLock::new(FxHashMap::with_capacity_and_hasher(capacity, Default::default())),
            enabled: config.enabled,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            lost_races: AtomicU64::new(0),
        }
    }

    /// A cache that never stores anything; every call resolves.
    pub fn disabled() -> Self {
        Self::with_config(&CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn lookup(&self, signature: &CallSiteSignature) -> Option<Arc<MemberDescriptor>> {
        self.entries.read().get(signature).cloned()
    }

    /// Return the cached member for `signature`, resolving and publishing it
    /// on a miss.
    pub fn lookup_or_resolve<F>(
        &self,
        signature: &CallSiteSignature,
        resolve: F,
    ) -> Result<Arc<MemberDescriptor>, ResolutionError>
    where
        F: FnOnce() -> Result<Arc<MemberDescriptor>, ResolutionError>,
    {
        if !self.enabled {
            return resolve();
        }

        if let Some(hit) = self.lookup(signature) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(signature = %signature, "call-site cache miss");

        // Resolve without holding any lock.
        let resolved = resolve()?;

        let mut entries = self.entries.write();
        if let Some(winner) = entries.get(signature) {
            self.lost_races.fetch_add(1, Ordering::Relaxed);
            debug!(signature = %signature, "discarding resolution, another thread published first");
            return Ok(winner.clone());
        }
        entries.insert(signature.clone(), resolved.clone());
        Ok(resolved)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            lost_races: self.lost_races.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
