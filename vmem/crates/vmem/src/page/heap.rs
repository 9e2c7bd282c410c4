//! Heap Page - word buffer on the Rust heap

use super::{Page, PageKind, PageRepr};
use crate::address::ELEMENTS_PER_PAGE;
use crate::error::Result;
use std::sync::atomic::AtomicU32;

/// Page backed by a boxed slice of words
pub struct HeapPage {
    words: Box<[AtomicU32]>,
}

impl PageRepr for HeapPage {
    const KIND: PageKind = PageKind::Heap;

    fn allocate() -> Result<Self> {
        let words = (0..ELEMENTS_PER_PAGE).map(|_| AtomicU32::new(0)).collect();
        Ok(Self { words })
    }

    #[inline(always)]
    fn words(&self) -> &[AtomicU32] {
        &self.words
    }

    #[inline(always)]
    fn from_page(page: &Page) -> Option<&Self> {
        match page {
            Page::Heap(page) => Some(page.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_page_roundtrip() {
        let page = HeapPage::allocate().unwrap();
        page.set_int(17, i32::MIN);
        assert_eq!(page.get_int(17), i32::MIN);
        assert_eq!(page.get_int(18), 0);
    }
}
