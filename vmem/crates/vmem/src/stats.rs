//! Statistics - Allocation and Link Counters
//!
//! Lock-free counters updated with `Relaxed` ordering. Readers may see a
//! slightly stale mix of values but never a torn one.

use crate::page::PageKind;
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one address space
#[derive(Debug)]
pub struct SpaceStats {
    enabled: bool,
    heap_pages: AtomicU64,
    direct_pages: AtomicU64,
    snapshots_published: AtomicU64,
    links: AtomicU64,
    links_rejected: AtomicU64,
    relinks: AtomicU64,
    allocations_rejected: AtomicU64,
}

impl SpaceStats {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            heap_pages: AtomicU64::new(0),
            direct_pages: AtomicU64::new(0),
            snapshots_published: AtomicU64::new(0),
            links: AtomicU64::new(0),
            links_rejected: AtomicU64::new(0),
            relinks: AtomicU64::new(0),
            allocations_rejected: AtomicU64::new(0),
        }
    }

    /// Check if counters are being recorded
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    fn bump(&self, counter: &AtomicU64) {
        if self.enabled {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a page allocation and the snapshot published for it
    pub fn record_page(&self, kind: PageKind) {
        match kind {
            PageKind::Heap => self.bump(&self.heap_pages),
            PageKind::Direct => self.bump(&self.direct_pages),
        }
        self.bump(&self.snapshots_published);
    }

    /// Record a successful resolution
    pub fn record_link(&self) {
        self.bump(&self.links);
    }

    /// Record a resolution that was not applicable
    pub fn record_link_rejected(&self) {
        self.bump(&self.links_rejected);
    }

    /// Record a stale accessor discarded by a call site
    pub fn record_relink(&self) {
        self.bump(&self.relinks);
    }

    /// Record a refused allocation
    pub fn record_allocation_rejected(&self) {
        self.bump(&self.allocations_rejected);
    }

    /// Read a point-in-time snapshot
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            heap_pages: self.heap_pages.load(Ordering::Relaxed),
            direct_pages: self.direct_pages.load(Ordering::Relaxed),
            snapshots_published: self.snapshots_published.load(Ordering::Relaxed),
            links: self.links.load(Ordering::Relaxed),
            links_rejected: self.links_rejected.load(Ordering::Relaxed),
            relinks: self.relinks.load(Ordering::Relaxed),
            allocations_rejected: self.allocations_rejected.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        for counter in [
            &self.heap_pages,
            &self.direct_pages,
            &self.snapshots_published,
            &self.links,
            &self.links_rejected,
            &self.relinks,
            &self.allocations_rejected,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for SpaceStats {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Serializable snapshot of [`SpaceStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    pub heap_pages: u64,
    pub direct_pages: u64,
    pub snapshots_published: u64,
    pub links: u64,
    pub links_rejected: u64,
    pub relinks: u64,
    pub allocations_rejected: u64,
}

impl StatsSnapshot {
    /// Total pages allocated
    pub fn pages(&self) -> u64 {
        self.heap_pages + self.direct_pages
    }

    /// Metrics keyed by exported name, in a stable order
    pub fn metrics(&self) -> IndexMap<&'static str, u64> {
        let mut metrics = IndexMap::new();
        metrics.insert("vmem_heap_pages_total", self.heap_pages);
        metrics.insert("vmem_direct_pages_total", self.direct_pages);
        metrics.insert("vmem_snapshots_published_total", self.snapshots_published);
        metrics.insert("vmem_links_total", self.links);
        metrics.insert("vmem_links_rejected_total", self.links_rejected);
        metrics.insert("vmem_relinks_total", self.relinks);
        metrics.insert("vmem_allocations_rejected_total", self.allocations_rejected);
        metrics
    }

    /// Export to Prometheus text format
    pub fn to_prometheus(&self) -> String {
        let mut output = String::new();
        for (name, value) in self.metrics() {
            output.push_str(&format!("{} {}\n", name, value));
        }
        output
    }

    /// Export to JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
