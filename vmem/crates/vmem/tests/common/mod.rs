//! Test Utilities for the Vmem Test Suite
//!
//! Fixtures build address spaces with a known page layout; assertion helpers
//! fail with enough context to tell which invariant broke.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::sync::Arc;
use vmem::{Address, AddressSpace, GetSite, PageKind, SetSite, VmemConfig};

/// Seed for reproducible pseudo-random data
pub const TEST_SEED: u64 = 0x5EED;

/// ============================================================================
/// SPACE FIXTURE
/// ============================================================================

/// Address space plus the call sites most tests need
pub struct SpaceFixture {
    pub space: Arc<AddressSpace>,
    pub get: GetSite,
    pub set: SetSite,
}

impl SpaceFixture {
    /// Create fixture with default configuration and no pages
    ///
    /// **Bug this finds:** Configuration validation bugs, initialization failures
    pub fn with_defaults() -> Self {
        Self::with_config(VmemConfig::default())
    }

    /// Create fixture with a page limit
    ///
    /// **Bug this finds:** Off-by-one in exhaustion checks
    pub fn with_max_pages(max_pages: usize) -> Self {
        Self::with_config(VmemConfig {
            max_pages,
            ..Default::default()
        })
    }

    pub fn with_config(config: VmemConfig) -> Self {
        let space = Arc::new(
            AddressSpace::new(config).expect("address space should accept a valid config"),
        );
        Self {
            space,
            get: GetSite::new("GET:ELEMENT:memory").expect("get operation should parse"),
            set: SetSite::new("SET:ELEMENT:memory").expect("set operation should parse"),
        }
    }

    /// Create fixture with one page per listed kind, in order
    pub fn with_pages(kinds: &[PageKind]) -> Self {
        let fixture = Self::with_defaults();
        for kind in kinds {
            fixture.allocate(*kind);
        }
        fixture
    }

    /// Allocate a page and return its start address
    ///
    /// **Bug this finds:** Allocation failures, non-sequential page ids
    pub fn allocate(&self, kind: PageKind) -> Address {
        self.space
            .allocate_page(Some(kind))
            .unwrap_or_else(|e| panic!("allocation of a {} page failed: {:?}", kind, e))
    }

    pub fn get(&mut self, addr: Address) -> i32 {
        self.get
            .get(&self.space, addr)
            .unwrap_or_else(|e| panic!("get {:#010x} failed: {:?}", addr, e))
    }

    pub fn set(&mut self, addr: Address, value: i32) {
        self.set
            .set(&self.space, addr, value)
            .unwrap_or_else(|e| panic!("set {:#010x} failed: {:?}", addr, e))
    }
}

/// Deterministic random ints
pub fn random_ints(count: usize, seed: u64) -> Vec<i32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| rng.gen()).collect()
}

/// ============================================================================
/// STRICT ASSERTION HELPERS
/// ============================================================================

/// Assert that all addresses are unique
///
/// **Bug this finds:** Race conditions in page id assignment
#[track_caller]
pub fn assert_all_addresses_unique(addresses: &[Address], context: &str) {
    let unique: HashSet<_> = addresses.iter().collect();
    assert_eq!(
        unique.len(),
        addresses.len(),
        "{}: found {} duplicate page addresses out of {}",
        context,
        addresses.len() - unique.len(),
        addresses.len()
    );
}

/// Assert that a page's contents match `expected` element for element
///
/// **Bug this finds:** Lost writes, writes landing in the wrong page
#[track_caller]
pub fn assert_page_contents(space: &AddressSpace, base: Address, expected: &[i32], context: &str) {
    for (i, want) in expected.iter().enumerate() {
        let addr = base + (i as u32) * 4;
        let got = space
            .read_int(addr)
            .unwrap_or_else(|e| panic!("{}: read {:#010x} failed: {:?}", context, addr, e));
        assert_eq!(
            got, *want,
            "{}: element {} at {:#010x} is {}, expected {}",
            context, i, addr, got, want
        );
    }
}
