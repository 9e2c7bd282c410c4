//! Page Table - Immutable Versioned Snapshots
//!
//! A `PageTable` maps page ids to `(PageKind, Page)` pairs. Tables are never
//! mutated after publication: growth builds a new table holding the old
//! entries plus one more (copy-on-extend) and the superseded table has its
//! validity token cleared.
//!
//! Kinds and pages live in separate arrays so the guard check on the access
//! path touches only the kind array.

use crate::address::{self, Address, PageId};
use crate::page::{Page, PageKind};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Immutable page table snapshot
pub struct PageTable {
    kinds: Box<[PageKind]>,
    pages: Box<[Page]>,

    /// Number of snapshots published before this one
    generation: u64,

    /// Cleared once a newer snapshot replaces this one
    valid: AtomicBool,
}

impl PageTable {
    /// Create the empty table every address space starts with
    pub(crate) fn empty() -> Self {
        Self {
            kinds: Box::new([]),
            pages: Box::new([]),
            generation: 0,
            valid: AtomicBool::new(true),
        }
    }

    /// Copy this table extended by one page
    ///
    /// The new page gets id `self.len()`. `self` is left untouched.
    pub(crate) fn extended(&self, page: Page) -> Self {
        let mut kinds = Vec::with_capacity(self.kinds.len() + 1);
        kinds.extend_from_slice(&self.kinds);
        kinds.push(page.kind());

        let mut pages = Vec::with_capacity(self.pages.len() + 1);
        pages.extend(self.pages.iter().cloned());
        pages.push(page);

        Self {
            kinds: kinds.into_boxed_slice(),
            pages: pages.into_boxed_slice(),
            generation: self.generation + 1,
            valid: AtomicBool::new(true),
        }
    }

    /// Clear the validity token
    pub(crate) fn invalidate(&self) {
        self.valid.store(false, Ordering::Release);
    }

    /// Check if this is still the current snapshot of its address space
    #[inline(always)]
    pub fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    /// Snapshot generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of pages
    #[inline]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Check if no page has been allocated
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Kind of a page
    #[inline(always)]
    pub fn kind_of(&self, page_id: PageId) -> Option<PageKind> {
        self.kinds.get(page_id as usize).copied()
    }

    /// Page by id
    #[inline(always)]
    pub fn page(&self, page_id: PageId) -> Option<&Page> {
        self.pages.get(page_id as usize)
    }

    /// Page containing an address
    #[inline]
    pub fn page_at(&self, addr: Address) -> Option<&Page> {
        self.page(address::page_id(addr))
    }

    /// Kinds of all pages in id order
    pub fn kinds(&self) -> &[PageKind] {
        &self.kinds
    }

    /// Number of pages of one kind
    pub fn count_of(&self, kind: PageKind) -> usize {
        self.kinds.iter().filter(|k| **k == kind).count()
    }

    /// Check if the table holds more than one page kind
    pub fn is_heterogeneous(&self) -> bool {
        self.kinds.windows(2).any(|w| w[0] != w[1])
    }

    /// Read the element at an address, `None` if unmapped
    pub fn read_int(&self, addr: Address) -> Option<i32> {
        self.page_at(addr)
            .map(|page| page.get_int(address::element_index(addr)))
    }

    /// Write the element at an address, `false` if unmapped
    pub fn write_int(&self, addr: Address, value: i32) -> bool {
        match self.page_at(addr) {
            Some(page) => {
                page.set_int(address::element_index(addr), value);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for PageTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageTable")
            .field("generation", &self.generation)
            .field("pages", &self.pages.len())
            .field("valid", &self.is_valid())
            .finish()
    }
}
