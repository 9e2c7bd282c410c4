//! Bump allocator on top of an address space.
//!
//! Requests are carved from the current page in order. When a request does
//! not fit in what is left of the page a fresh page is allocated; the tail
//! of the old page is abandoned. Nothing is ever freed.

use tracing::debug;
use vmem::address::ELEMENT_SIZE;
use vmem::{Address, AddressSpace, PageKind, VmemError, PAGE_SIZE};

use crate::error::Result;

/// Page kind policy for new pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePolicy {
    /// Use the address space's configured default.
    Default,
    /// Always use one kind.
    Fixed(PageKind),
    /// Alternate kinds, starting with the given one.
    Alternate(PageKind),
}

/// Bump allocator state.
#[derive(Debug)]
pub struct BumpAllocator {
    policy: PagePolicy,
    current: Option<Address>,
    top: usize,
    pages: Vec<Address>,
}

impl BumpAllocator {
    /// Create an allocator that has not claimed a page yet.
    pub fn new(policy: PagePolicy) -> Self {
        Self {
            policy,
            current: None,
            top: 0,
            pages: Vec::new(),
        }
    }

    /// Allocate `size` bytes.
    ///
    /// Sizes are rounded up to whole elements so every returned address is
    /// element aligned.
    pub fn malloc(&mut self, space: &AddressSpace, size: usize) -> Result<Address> {
        if size > PAGE_SIZE {
            return Err(VmemError::AllocationTooLarge {
                requested: size,
                capacity: PAGE_SIZE,
            }
            .into());
        }
        let size = size.next_multiple_of(ELEMENT_SIZE);

        let base = match self.current {
            Some(base) if size <= self.remaining() => base,
            _ => self.new_page(space)?,
        };

        let ptr = base + self.top as Address;
        self.top += size;
        Ok(ptr)
    }

    fn new_page(&mut self, space: &AddressSpace) -> Result<Address> {
        let kind = self.next_kind();
        let base = space.allocate_page(kind)?;
        debug!(
            "new page {:#010x} ({})",
            base,
            space
                .current_snapshot()
                .kind_of(vmem::address::page_id(base))
                .map(|k| k.as_str())
                .unwrap_or("unknown")
        );
        self.current = Some(base);
        self.top = 0;
        self.pages.push(base);
        Ok(base)
    }

    fn next_kind(&self) -> Option<PageKind> {
        match self.policy {
            PagePolicy::Default => None,
            PagePolicy::Fixed(kind) => Some(kind),
            PagePolicy::Alternate(first) => {
                if self.pages.len() % 2 == 0 {
                    Some(first)
                } else {
                    Some(first.other())
                }
            }
        }
    }

    /// Bytes left in the current page.
    pub fn remaining(&self) -> usize {
        match self.current {
            Some(_) => PAGE_SIZE - self.top,
            None => 0,
        }
    }

    /// Start addresses of every page claimed so far.
    pub fn pages(&self) -> &[Address] {
        &self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VmemtError;

    #[test]
    fn test_first_malloc_claims_page() {
        let space = AddressSpace::default();
        let mut alloc = BumpAllocator::new(PagePolicy::Default);
        assert_eq!(alloc.remaining(), 0);

        let a = alloc.malloc(&space, 16).unwrap();
        assert_eq!(a, 0);
        assert_eq!(alloc.remaining(), PAGE_SIZE - 16);
        assert_eq!(space.page_count(), 1);
    }

    #[test]
    fn test_sequential_in_one_page() {
        let space = AddressSpace::default();
        let mut alloc = BumpAllocator::new(PagePolicy::Default);
        let a = alloc.malloc(&space, 100).unwrap();
        let b = alloc.malloc(&space, 6).unwrap();
        let c = alloc.malloc(&space, 4).unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, 100);
        assert_eq!(c, 108);
        assert_eq!(alloc.pages(), &[0]);
    }

    #[test]
    fn test_new_page_when_full() {
        let space = AddressSpace::default();
        let mut alloc = BumpAllocator::new(PagePolicy::Default);
        alloc.malloc(&space, 3600).unwrap();
        let b = alloc.malloc(&space, 3600).unwrap();
        assert_eq!(b, PAGE_SIZE as Address);
        assert_eq!(alloc.pages().len(), 2);

        // exactly the remainder still fits
        let c = alloc.malloc(&space, PAGE_SIZE - 3600).unwrap();
        assert_eq!(c, PAGE_SIZE as Address + 3600);
        assert_eq!(alloc.remaining(), 0);
    }

    #[test]
    fn test_too_large() {
        let space = AddressSpace::default();
        let mut alloc = BumpAllocator::new(PagePolicy::Default);
        let err = alloc.malloc(&space, PAGE_SIZE + 1).unwrap_err();
        assert!(matches!(
            err,
            VmemtError::Vmem(VmemError::AllocationTooLarge { .. })
        ));
        assert_eq!(space.page_count(), 0);
    }

    #[test]
    fn test_alternating_policy() {
        let space = AddressSpace::default();
        let mut alloc = BumpAllocator::new(PagePolicy::Alternate(PageKind::Direct));
        for _ in 0..3 {
            alloc.malloc(&space, PAGE_SIZE).unwrap();
        }
        let snapshot = space.current_snapshot();
        assert_eq!(
            snapshot.kinds(),
            &[PageKind::Direct, PageKind::Heap, PageKind::Direct]
        );
    }

    #[test]
    fn test_fixed_policy() {
        let space = AddressSpace::default();
        let mut alloc = BumpAllocator::new(PagePolicy::Fixed(PageKind::Direct));
        alloc.malloc(&space, 8).unwrap();
        assert_eq!(space.current_snapshot().kind_of(0), Some(PageKind::Direct));
    }
}
