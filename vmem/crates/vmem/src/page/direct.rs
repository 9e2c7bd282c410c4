//! Direct Page - storage mapped outside the Rust heap
//!
//! Each direct page owns an anonymous read/write mapping from `memmap2`.
//! The mapping length is rounded up to the OS page size; only the first
//! `PAGE_SIZE` bytes are addressable.

use super::{Page, PageKind, PageRepr};
use crate::address::{ELEMENTS_PER_PAGE, PAGE_SIZE};
use crate::error::{Result, VmemError};
use memmap2::{MmapMut, MmapOptions};
use std::mem::align_of;
use std::ptr::NonNull;
use std::sync::atomic::AtomicU32;

/// Page backed by an anonymous memory mapping
pub struct DirectPage {
    /// Keeps the mapping alive; all access goes through `words`
    _map: MmapMut,
    words: NonNull<AtomicU32>,
}

// SAFETY: `words` points into `_map`, which lives as long as `self` and is
// never remapped. All access goes through `AtomicU32`, so sharing between
// threads cannot produce a data race.
unsafe impl Send for DirectPage {}
unsafe impl Sync for DirectPage {}

/// Page size of the host OS, which may differ from [`PAGE_SIZE`]
pub fn os_page_size() -> usize {
    page_size::get()
}

/// Round a length up to the OS page size
fn mapping_len(len: usize) -> usize {
    let os_page = os_page_size();
    len.div_ceil(os_page) * os_page
}

impl PageRepr for DirectPage {
    const KIND: PageKind = PageKind::Direct;

    fn allocate() -> Result<Self> {
        let mut map = MmapOptions::new()
            .len(mapping_len(PAGE_SIZE))
            .map_anon()
            .map_err(|e| {
                VmemError::PageAllocation(format!("failed to map direct page: {}", e))
            })?;

        let base = map.as_mut_ptr();
        if (base as usize) % align_of::<AtomicU32>() != 0 {
            return Err(VmemError::PageAllocation(format!(
                "mapping at {:p} is not aligned for element access",
                base
            )));
        }

        let words = NonNull::new(base.cast::<AtomicU32>()).ok_or_else(|| {
            VmemError::PageAllocation("mapping returned a null base".to_string())
        })?;

        Ok(Self { _map: map, words })
    }

    #[inline(always)]
    fn words(&self) -> &[AtomicU32] {
        // SAFETY: the mapping is at least PAGE_SIZE bytes, zero-filled by
        // the OS (a valid AtomicU32 bit pattern), aligned (checked at
        // allocation) and outlives the returned borrow.
        unsafe { std::slice::from_raw_parts(self.words.as_ptr(), ELEMENTS_PER_PAGE) }
    }

    #[inline(always)]
    fn from_page(page: &Page) -> Option<&Self> {
        match page {
            Page::Direct(page) => Some(page.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping_len_rounds_up() {
        let os_page = os_page_size();
        assert_eq!(mapping_len(1), os_page);
        assert_eq!(mapping_len(os_page), os_page);
        assert!(mapping_len(PAGE_SIZE) >= PAGE_SIZE);
    }

    #[test]
    fn test_direct_page_roundtrip() {
        let page = DirectPage::allocate().unwrap();
        page.set_int(0, 42);
        page.set_int(ELEMENTS_PER_PAGE - 1, -42);
        assert_eq!(page.get_int(0), 42);
        assert_eq!(page.get_int(ELEMENTS_PER_PAGE - 1), -42);
    }

    #[test]
    fn test_direct_pages_are_distinct() {
        let a = DirectPage::allocate().unwrap();
        let b = DirectPage::allocate().unwrap();
        a.set_int(3, 1);
        assert_eq!(b.get_int(3), 0);
    }
}
