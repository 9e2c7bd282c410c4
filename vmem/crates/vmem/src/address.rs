//! Address Codec - Page Id / Offset Packing
//!
//! Addresses in the emulated space are plain 32-bit integers:
//!
//! ```text
//! 32-bit Address Layout:
//! ┌──────────────────────────────┬──────────────────┐
//! │          Page Id             │   Byte Offset    │
//! │           31-12              │      11-0        │
//! └──────────────────────────────┴──────────────────┘
//! ```
//!
//! Offsets are byte offsets. Element accesses are 32 bits wide, so the
//! element index inside a page is `offset >> 2`. The low two bits of a
//! misaligned offset are ignored by element accesses.

/// Address in the emulated flat address space
pub type Address = u32;

/// Page id (high bits of an address)
pub type PageId = u32;

/// Number of offset bits
pub const INDEX_BITS: u32 = 12;

/// Page size in bytes (4KB)
pub const PAGE_SIZE: usize = 1 << INDEX_BITS;

/// Mask selecting the offset bits of an address
pub const INDEX_MASK: u32 = (1 << INDEX_BITS) - 1;

/// Width of one element in bytes
pub const ELEMENT_SIZE: usize = 4;

/// Shift converting a byte offset into an element index
pub const ELEMENT_SHIFT: u32 = 2;

/// Elements stored in one page
pub const ELEMENTS_PER_PAGE: usize = PAGE_SIZE / ELEMENT_SIZE;

/// Largest number of pages an address can name
pub const MAX_PAGES: usize = 1 << (Address::BITS - INDEX_BITS);

/// Pack a page id and byte offset into an address
///
/// The caller keeps `offset < PAGE_SIZE`; larger offsets bleed into the
/// page id bits.
#[inline(always)]
pub const fn encode(page_id: PageId, offset: u32) -> Address {
    (page_id << INDEX_BITS) | offset
}

/// Page id of an address
#[inline(always)]
pub const fn page_id(addr: Address) -> PageId {
    addr >> INDEX_BITS
}

/// Byte offset of an address inside its page
#[inline(always)]
pub const fn offset(addr: Address) -> u32 {
    addr & INDEX_MASK
}

/// Element index of an address inside its page
#[inline(always)]
pub const fn element_index(addr: Address) -> usize {
    (offset(addr) >> ELEMENT_SHIFT) as usize
}

/// Address of offset 0 of a page
#[inline(always)]
pub const fn page_start(page_id: PageId) -> Address {
    encode(page_id, 0)
}

/// Address of the `index`-th element of a page
#[inline(always)]
pub const fn element_address(page_id: PageId, index: u32) -> Address {
    encode(page_id, index << ELEMENT_SHIFT)
}

/// Check if an address is aligned for element access
pub const fn is_element_aligned(addr: Address) -> bool {
    addr & ((ELEMENT_SIZE as u32) - 1) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(PAGE_SIZE, 4096);
        assert_eq!(INDEX_MASK, 0xfff);
        assert_eq!(ELEMENTS_PER_PAGE, 1024);
        assert_eq!(MAX_PAGES, 1 << 20);
    }

    #[test]
    fn test_encode_decode() {
        let addr = encode(3, 0x7fc);
        assert_eq!(addr, 0x37fc);
        assert_eq!(page_id(addr), 3);
        assert_eq!(offset(addr), 0x7fc);
        assert_eq!(element_index(addr), 0x7fc / 4);
    }

    #[test]
    fn test_page_start_is_offset_zero() {
        assert_eq!(page_start(0), 0);
        assert_eq!(page_start(1), 4096);
        assert_eq!(offset(page_start(77)), 0);
    }

    #[test]
    fn test_element_address() {
        let addr = element_address(2, 1023);
        assert_eq!(page_id(addr), 2);
        assert_eq!(element_index(addr), 1023);
        assert!(is_element_aligned(addr));
        assert!(!is_element_aligned(addr + 1));
    }

    #[test]
    fn test_highest_page() {
        let last = (MAX_PAGES - 1) as PageId;
        let addr = encode(last, INDEX_MASK);
        assert_eq!(addr, u32::MAX);
        assert_eq!(page_id(addr), last);
    }
}
