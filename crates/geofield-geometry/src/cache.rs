// ─────────────────────────────────────────────────────────────────────
// GeoField — Connection Cache
// ─────────────────────────────────────────────────────────────────────
//! Christoffel symbols of constant metrics keyed by metric revision.
//!
//! A constant metric's connection does not depend on position, so one
//! entry per revision serves every evaluation point. Any mutation of the
//! metric bumps its revision, which retires the stale entry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use geofield_core::{Metric, Point};
use parking_lot::RwLock;

use crate::christoffel::{christoffel_symbols, Christoffel};

pub const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Debug)]
pub struct ConnectionCache {
    entries: RwLock<HashMap<u64, Arc<Christoffel>>>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for ConnectionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ConnectionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Connection of a constant metric, computed once per revision.
    pub fn christoffel(&self, metric: &Metric) -> Arc<Christoffel> {
        let key = metric.revision();
        if let Some(hit) = self.entries.read().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(hit);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let computed = Arc::new(christoffel_symbols(metric, &Point::origin(metric.dimension())));

        let mut entries = self.entries.write();
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            log::debug!("connection cache full ({} entries), clearing", entries.len());
            entries.clear();
        }
        Arc::clone(entries.entry(key).or_insert(computed))
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

    /// (hits, misses) since construction.
    pub fn hit_stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}
