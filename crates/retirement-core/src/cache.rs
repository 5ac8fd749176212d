//! Memoisation for repeated phase calculations.
//!
//! Form-driven callers recompute the same phase whenever an unrelated field
//! on the page changes. Results are pure functions of (phase, fields), so
//! identical requests are answered from the map. The map is bounded and
//! drops its oldest entry once full.

use log::trace;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::fields::FieldMap;
use crate::phases::{calculate_phase, PhaseResult};
use crate::types::{ComputationOutput, PhaseKind};
use crate::PlannerResult;

/// Entries kept by [`PhaseCache::new`].
pub const DEFAULT_CAPACITY: usize = 256;

/// Hit and miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct Entries {
    map: HashMap<String, ComputationOutput<PhaseResult>>,
    /// Keys in insertion order; the front is evicted first.
    order: VecDeque<String>,
}

/// Thread-safe, bounded cache in front of [`calculate_phase`].
///
/// Holds at most `capacity` results and evicts the oldest insertion when
/// full. Errors are never cached.
#[derive(Debug)]
pub struct PhaseCache {
    capacity: usize,
    entries: Mutex<Entries>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl Default for PhaseCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl PhaseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capacity of zero disables caching.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(Entries::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn key(kind: PhaseKind, fields: &FieldMap) -> String {
        format!("{kind}:{}", fields.canonical_json())
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached output for this request, computing it on a miss.
    pub fn calculate(
        &self,
        kind: PhaseKind,
        fields: &FieldMap,
    ) -> PlannerResult<ComputationOutput<PhaseResult>> {
        let key = Self::key(kind, fields);
        if let Some(hit) = self.lock().map.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!("phase cache hit: {key}");
            return Ok(hit.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let output = calculate_phase(kind, fields)?;
        self.insert(key, output.clone());
        Ok(output)
    }

    fn insert(&self, key: String, output: ComputationOutput<PhaseResult>) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.lock();
        // Another thread may have filled this key while we computed.
        if entries.map.insert(key.clone(), output).is_some() {
            return;
        }
        entries.order.push_back(key);
        while entries.order.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.map.remove(&oldest);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                trace!("phase cache evicted: {oldest}");
            }
        }
    }

    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.map.clear();
        entries.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.lock().map.len(),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
