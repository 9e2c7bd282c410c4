//! Address Space - Current Snapshot and Growth
//!
//! An `AddressSpace` owns exactly one current [`PageTable`]. Readers load it
//! without locking through an epoch-protected atomic pointer; growth is
//! serialized by a mutex and publishes a new table by replacement:
//!
//! ```text
//! allocate_page(kind)
//!   lock growth
//!   next = current.extended(new page)     copy-on-extend
//!   swap current -> next                  release
//!   old.invalidate()                      guards bound to old now fail
//!   retire old pointer                    freed after readers unpin
//! ```
//!
//! Accessors bound to the superseded table keep it alive through their own
//! `Arc`, so its contents stay readable; only its validity token changes.

use crate::address::{self, Address, PageId, PAGE_SIZE};
use crate::config::VmemConfig;
use crate::error::{Result, VmemError};
use crate::link::{self, Linked, Operation, Signature, Value};
use crate::logging::{self, VmemEvent};
use crate::page::{Page, PageKind};
use crate::stats::SpaceStats;
use crate::table::PageTable;
use crossbeam::epoch::{self, Atomic, Owned};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SPACE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of an address space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpaceId(u64);

impl SpaceId {
    fn next() -> Self {
        SpaceId(NEXT_SPACE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Growable paged address space
///
/// # Examples
///
/// ```rust
/// use vmem::{AddressSpace, PageKind};
///
/// let space = AddressSpace::default();
/// let base = space.allocate_page(Some(PageKind::Heap)).unwrap();
/// space.write_int(base + 8, 42).unwrap();
/// assert_eq!(space.read_int(base + 8).unwrap(), 42);
/// ```
pub struct AddressSpace {
    id: SpaceId,

    /// Current snapshot
    current: Atomic<Arc<PageTable>>,

    /// Serializes growth
    grow_lock: Mutex<()>,

    config: VmemConfig,
    stats: SpaceStats,
}

impl AddressSpace {
    /// Create an empty address space
    pub fn new(config: VmemConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: VmemConfig) -> Self {
        let stats = SpaceStats::new(config.stats_enabled);
        let space = Self {
            id: SpaceId::next(),
            current: Atomic::new(Arc::new(PageTable::empty())),
            grow_lock: Mutex::new(()),
            config,
            stats,
        };
        log::debug!(
            "address space {} created (default kind {}, max {} pages)",
            space.id,
            space.config.default_page_kind,
            space.config.max_pages
        );
        space
    }

    /// Identity checked by guards
    pub fn id(&self) -> SpaceId {
        self.id
    }

    pub fn config(&self) -> &VmemConfig {
        &self.config
    }

    pub fn stats(&self) -> &SpaceStats {
        &self.stats
    }

    /// Current snapshot
    ///
    /// Lock-free. The returned table is fully formed and no older than the
    /// last one published before the call.
    pub fn current_snapshot(&self) -> Arc<PageTable> {
        let guard = epoch::pin();
        let current = self.current.load(Ordering::Acquire, &guard);
        // SAFETY: the pointer is never null while `self` is alive, and a
        // retired pointer is only freed after every pinned reader unpins.
        unsafe { current.deref() }.clone()
    }

    /// Number of allocated pages
    pub fn page_count(&self) -> usize {
        self.current_snapshot().len()
    }

    /// Append one page and return its start address
    ///
    /// `None` uses `config.default_page_kind`.
    pub fn allocate_page(&self, kind: Option<PageKind>) -> Result<Address> {
        let kind = kind.unwrap_or(self.config.default_page_kind);
        let _growing = self.grow_lock.lock();

        let guard = epoch::pin();
        let current = self.current.load(Ordering::Acquire, &guard);
        // SAFETY: see `current_snapshot`; the growth lock also keeps any
        // other writer from retiring this pointer.
        let table = unsafe { current.deref() };

        let pages = table.len();
        if pages >= self.config.max_pages {
            log::warn!(
                "address space {} exhausted at {} pages",
                self.id,
                pages
            );
            self.stats.record_allocation_rejected();
            self.emit(VmemEvent::AllocationRejected {
                space: self.id.as_u64(),
                requested: PAGE_SIZE,
                reason: "address space exhausted".to_string(),
            });
            return Err(VmemError::AddressSpaceExhausted { pages });
        }

        let page = Page::allocate(kind)?;
        let page_id = pages as PageId;
        let next = Arc::new(table.extended(page));
        let generation = next.generation();

        let old = self.current.swap(Owned::new(next), Ordering::AcqRel, &guard);
        table.invalidate();
        // SAFETY: `old` is unreachable from `self.current` now; readers that
        // loaded it before the swap are still pinned.
        unsafe { guard.defer_destroy(old) };

        self.stats.record_page(kind);
        if self.config.verbose {
            log::info!(
                "address space {}: page {} ({}) at {:#010x}",
                self.id,
                page_id,
                kind,
                address::page_start(page_id)
            );
        }
        self.emit(VmemEvent::PageAllocated {
            space: self.id.as_u64(),
            page_id,
            kind,
        });
        self.emit(VmemEvent::SnapshotPublished {
            space: self.id.as_u64(),
            generation,
            pages: pages + 1,
        });

        Ok(address::page_start(page_id))
    }

    /// Reserve a region of at most one page
    ///
    /// Every reservation gets a fresh page; packing several small requests
    /// into one page is the client's job.
    pub fn reserve(&self, size: usize, kind: Option<PageKind>) -> Result<Address> {
        if size > PAGE_SIZE {
            log::warn!(
                "address space {}: {} byte reservation exceeds page size",
                self.id,
                size
            );
            self.stats.record_allocation_rejected();
            self.emit(VmemEvent::AllocationRejected {
                space: self.id.as_u64(),
                requested: size,
                reason: "larger than one page".to_string(),
            });
            return Err(VmemError::AllocationTooLarge {
                requested: size,
                capacity: PAGE_SIZE,
            });
        }
        self.allocate_page(kind)
    }

    /// Resolve an operation against the current snapshot
    ///
    /// `Ok(None)` means the operation is not applicable.
    pub fn link(
        &self,
        operation: &Operation,
        signature: &Signature,
        args: &[Value],
    ) -> Result<Option<Linked>> {
        link::resolve(self, operation, signature, args)
    }

    /// Read an element without a cached accessor
    pub fn read_int(&self, addr: Address) -> Result<i32> {
        self.current_snapshot()
            .read_int(addr)
            .ok_or(VmemError::UnmappedAddress { address: addr })
    }

    /// Write an element without a cached accessor
    pub fn write_int(&self, addr: Address, value: i32) -> Result<()> {
        if self.current_snapshot().write_int(addr, value) {
            Ok(())
        } else {
            Err(VmemError::UnmappedAddress { address: addr })
        }
    }

    /// Send an event to the global logger when verbose
    pub(crate) fn emit(&self, event: VmemEvent) {
        if self.config.verbose {
            logging::log_event(event);
        }
    }
}

impl Default for AddressSpace {
    fn default() -> Self {
        Self::with_valid_config(VmemConfig::default())
    }
}

impl Drop for AddressSpace {
    fn drop(&mut self) {
        // SAFETY: `&mut self` means no reader holds a guard on this pointer.
        unsafe {
            let current = self.current.load(Ordering::Relaxed, epoch::unprotected());
            if !current.is_null() {
                drop(current.into_owned());
            }
        }
    }
}

impl fmt::Debug for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddressSpace")
            .field("id", &self.id)
            .field("snapshot", &self.current_snapshot())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::element_address;

    #[test]
    fn test_new_space_is_empty() {
        let space = AddressSpace::default();
        assert_eq!(space.page_count(), 0);
        assert_eq!(space.current_snapshot().generation(), 0);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = AddressSpace::default();
        let b = AddressSpace::default();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = VmemConfig {
            max_pages: 0,
            ..Default::default()
        };
        assert!(matches!(
            AddressSpace::new(config),
            Err(VmemError::Configuration(_))
        ));
    }

    #[test]
    fn test_allocate_returns_page_starts() {
        let space = AddressSpace::default();
        assert_eq!(space.allocate_page(None).unwrap(), 0);
        assert_eq!(space.allocate_page(Some(PageKind::Direct)).unwrap(), 0x1000);
        assert_eq!(space.page_count(), 2);

        let snapshot = space.current_snapshot();
        assert_eq!(snapshot.kind_of(0), Some(PageKind::Heap));
        assert_eq!(snapshot.kind_of(1), Some(PageKind::Direct));
    }

    #[test]
    fn test_default_kind_from_config() {
        let space = AddressSpace::new(VmemConfig {
            default_page_kind: PageKind::Direct,
            ..Default::default()
        })
        .unwrap();
        space.allocate_page(None).unwrap();
        assert_eq!(space.current_snapshot().kind_of(0), Some(PageKind::Direct));
    }

    #[test]
    fn test_growth_invalidates_previous_snapshot() {
        let space = AddressSpace::default();
        space.allocate_page(None).unwrap();
        let before = space.current_snapshot();
        assert!(before.is_valid());

        space.allocate_page(None).unwrap();
        let after = space.current_snapshot();
        assert!(!before.is_valid());
        assert!(after.is_valid());
        assert_eq!(after.generation(), before.generation() + 1);
    }

    #[test]
    fn test_slow_path_read_write() {
        let space = AddressSpace::default();
        let base = space.allocate_page(None).unwrap();
        space.write_int(element_address(0, 10), -5).unwrap();
        assert_eq!(space.read_int(base + 40).unwrap(), -5);

        assert!(matches!(
            space.read_int(0x5000),
            Err(VmemError::UnmappedAddress { address: 0x5000 })
        ));
        assert!(space.write_int(0x5000, 1).is_err());
    }

    #[test]
    fn test_reserve_rejects_oversized() {
        let space = AddressSpace::default();
        let err = space.reserve(PAGE_SIZE + 1, None).unwrap_err();
        assert!(matches!(
            err,
            VmemError::AllocationTooLarge {
                requested,
                capacity: PAGE_SIZE
            } if requested == PAGE_SIZE + 1
        ));
        assert_eq!(space.page_count(), 0);
        assert_eq!(space.stats().snapshot().allocations_rejected, 1);

        assert_eq!(space.reserve(PAGE_SIZE, None).unwrap(), 0);
    }

    #[test]
    fn test_exhaustion() {
        let space = AddressSpace::new(VmemConfig {
            max_pages: 2,
            ..Default::default()
        })
        .unwrap();
        space.allocate_page(None).unwrap();
        space.allocate_page(None).unwrap();
        assert!(matches!(
            space.allocate_page(None),
            Err(VmemError::AddressSpaceExhausted { pages: 2 })
        ));
        assert_eq!(space.page_count(), 2);
    }

    #[test]
    fn test_stats_count_pages() {
        let space = AddressSpace::default();
        space.allocate_page(Some(PageKind::Heap)).unwrap();
        space.allocate_page(Some(PageKind::Direct)).unwrap();
        space.allocate_page(Some(PageKind::Direct)).unwrap();
        let stats = space.stats().snapshot();
        assert_eq!(stats.heap_pages, 1);
        assert_eq!(stats.direct_pages, 2);
        assert_eq!(stats.snapshots_published, 3);
    }
}
