//! Page Module - Backing Storage Representations
//!
//! A page is a fixed block of `PAGE_SIZE` bytes viewed as native-endian
//! 32-bit words. Two representations exist and may be mixed in one table:
//!
//! - [`HeapPage`]: word buffer owned by the Rust allocator
//! - [`DirectPage`]: anonymous OS mapping managed outside the Rust heap
//!
//! Each representation implements [`PageRepr`]. Guarded accessors are
//! monomorphized over `PageRepr`, which is how a call site specializes
//! itself to one page kind.
//!
//! Words are `AtomicU32` cells accessed with `Relaxed` ordering. Concurrent
//! writers to one cell race as they would on raw memory; nothing here
//! orders them.

pub mod direct;
pub mod heap;

pub use direct::{os_page_size, DirectPage};
pub use heap::HeapPage;

use crate::error::{Result, VmemError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Tag naming a page representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum PageKind {
    /// Rust heap allocated buffer
    Heap = 0,
    /// Anonymous memory mapping
    Direct = 1,
}

impl PageKind {
    /// All page kinds
    pub const ALL: [PageKind; 2] = [PageKind::Heap, PageKind::Direct];

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            PageKind::Heap => "heap",
            PageKind::Direct => "direct",
        }
    }

    /// The other page kind
    pub fn other(&self) -> PageKind {
        match self {
            PageKind::Heap => PageKind::Direct,
            PageKind::Direct => PageKind::Heap,
        }
    }
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "heap" | "bytes" => Ok(PageKind::Heap),
            "direct" | "mapped" => Ok(PageKind::Direct),
            other => Err(format!("unknown page kind '{}'", other)),
        }
    }
}

/// Capabilities of one page representation
///
/// `get_int` / `set_int` take an element index and do not check it beyond
/// slice indexing; keeping indices below `ELEMENTS_PER_PAGE` is the
/// caller's job.
pub trait PageRepr: Send + Sync + Sized + 'static {
    /// Tag stored in the page table for this representation
    const KIND: PageKind;

    /// Allocate a zeroed page
    fn allocate() -> Result<Self>;

    /// Word view of the page
    fn words(&self) -> &[AtomicU32];

    /// Downcast a type-erased page to this representation
    fn from_page(page: &Page) -> Option<&Self>;

    /// Read the element at `index`
    #[inline(always)]
    fn get_int(&self, index: usize) -> i32 {
        self.words()[index].load(Ordering::Relaxed) as i32
    }

    /// Write the element at `index`
    #[inline(always)]
    fn set_int(&self, index: usize, value: i32) {
        self.words()[index].store(value as u32, Ordering::Relaxed)
    }
}

/// Type-erased page
///
/// Cloning shares the underlying storage, so snapshots built by
/// copy-on-extend all refer to the same pages.
#[derive(Clone)]
pub enum Page {
    Heap(Arc<HeapPage>),
    Direct(Arc<DirectPage>),
}

impl Page {
    /// Allocate a page of the given kind
    pub fn allocate(kind: PageKind) -> Result<Page> {
        match kind {
            PageKind::Heap => Ok(Page::Heap(Arc::new(HeapPage::allocate()?))),
            PageKind::Direct => Ok(Page::Direct(Arc::new(DirectPage::allocate()?))),
        }
    }

    /// Representation tag
    #[inline]
    pub fn kind(&self) -> PageKind {
        match self {
            Page::Heap(_) => PageKind::Heap,
            Page::Direct(_) => PageKind::Direct,
        }
    }

    /// Word view of the page
    #[inline]
    pub fn words(&self) -> &[AtomicU32] {
        match self {
            Page::Heap(page) => page.words(),
            Page::Direct(page) => page.words(),
        }
    }

    /// Read the element at `index`
    #[inline]
    pub fn get_int(&self, index: usize) -> i32 {
        self.words()[index].load(Ordering::Relaxed) as i32
    }

    /// Write the element at `index`
    #[inline]
    pub fn set_int(&self, index: usize, value: i32) {
        self.words()[index].store(value as u32, Ordering::Relaxed)
    }

    /// Box the page for a consumer outside the access path
    pub fn expose(&self) -> PageHandle {
        PageHandle { page: self.clone() }
    }

    /// Check if two handles share storage
    pub fn ptr_eq(&self, other: &Page) -> bool {
        match (self, other) {
            (Page::Heap(a), Page::Heap(b)) => Arc::ptr_eq(a, b),
            (Page::Direct(a), Page::Direct(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("kind", &self.kind())
            .field("words", &self.words().len())
            .finish()
    }
}

/// Consumer-facing view of a page
///
/// Returned by the page lookup operation (`GET:ELEMENT:pages`). Holds a
/// reference to the page, so the storage stays alive while the handle does.
#[derive(Clone, Debug)]
pub struct PageHandle {
    page: Page,
}

impl PageHandle {
    /// Representation of the page
    pub fn kind(&self) -> PageKind {
        self.page.kind()
    }

    /// Size in bytes
    pub fn len_bytes(&self) -> usize {
        self.page.words().len() * crate::address::ELEMENT_SIZE
    }

    /// Number of 32-bit elements
    pub fn len(&self) -> usize {
        self.page.words().len()
    }

    /// Check if the page has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read an element, `None` when out of range
    pub fn get_int(&self, index: usize) -> Option<i32> {
        self.page
            .words()
            .get(index)
            .map(|w| w.load(Ordering::Relaxed) as i32)
    }

    /// Write an element
    pub fn set_int(&self, index: usize, value: i32) -> Result<()> {
        let word = self.page.words().get(index).ok_or_else(|| {
            VmemError::Internal(format!(
                "page element {} out of range ({} elements)",
                index,
                self.len()
            ))
        })?;
        word.store(value as u32, Ordering::Relaxed);
        Ok(())
    }

    /// Copy the page contents out
    pub fn to_vec(&self) -> Vec<i32> {
        self.page
            .words()
            .iter()
            .map(|w| w.load(Ordering::Relaxed) as i32)
            .collect()
    }

    /// Check if this handle views the given page
    pub fn is_page(&self, page: &Page) -> bool {
        self.page.ptr_eq(page)
    }
}
