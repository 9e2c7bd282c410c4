//! Memtest command implementation.
//!
//! Writes pseudo-random ints into a bump-allocated region through one call
//! site, then reads them back through another.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};
use vmem::address::ELEMENT_SIZE;
use vmem::{Address, AddressSpace, GetSite, SetSite, VmemConfig, VmemError, PAGE_SIZE};

use crate::alloc::{BumpAllocator, PagePolicy};
use crate::error::{Result, VmemtError};

/// Default number of ints written.
pub const DEFAULT_COUNT: usize = 100;

/// Arguments for the memtest command.
#[derive(Debug, Clone)]
pub struct MemtestArgs {
    pub config: VmemConfig,
    /// Number of ints to write.
    pub count: usize,
    /// Seed for the data; random when absent.
    pub seed: Option<u64>,
}

impl Default for MemtestArgs {
    fn default() -> Self {
        Self {
            config: VmemConfig::default(),
            count: DEFAULT_COUNT,
            seed: None,
        }
    }
}

/// Outcome of a passing memtest.
#[derive(Debug, Clone, Serialize)]
pub struct MemtestReport {
    pub count: usize,
    pub base: Address,
    pub seed: u64,
    pub relinks: u64,
    pub pages: usize,
}

/// Execute the memtest command.
pub fn run_memtest(args: MemtestArgs) -> Result<MemtestReport> {
    let bytes = args
        .count
        .checked_mul(ELEMENT_SIZE)
        .ok_or(VmemError::AllocationTooLarge {
            requested: usize::MAX,
            capacity: PAGE_SIZE,
        })?;

    let space = AddressSpace::new(args.config)?;
    let mut alloc = BumpAllocator::new(PagePolicy::Default);
    let base = alloc.malloc(&space, bytes)?;

    let seed = args.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut rng = StdRng::seed_from_u64(seed);
    let data: Vec<i32> = (0..args.count).map(|_| rng.gen()).collect();
    debug!("memtest region {:#010x}, {} ints, seed {}", base, args.count, seed);

    let mut set = SetSite::new("SET:ELEMENT:memory")?;
    for (i, value) in data.iter().enumerate() {
        set.set(&space, element_at(base, i), *value)?;
    }

    let mut get = GetSite::new("GET:ELEMENT:memory")?;
    for (i, expected) in data.iter().enumerate() {
        let address = element_at(base, i);
        let actual = get.get(&space, address)?;
        if actual != *expected {
            return Err(VmemtError::Mismatch {
                index: i,
                expected: *expected,
                actual,
                address,
            });
        }
    }

    let report = MemtestReport {
        count: args.count,
        base,
        seed,
        relinks: set.relink_count() + get.relink_count(),
        pages: space.page_count(),
    };
    info!("memtest passed: {} ints at {:#010x}", report.count, report.base);
    Ok(report)
}

fn element_at(base: Address, index: usize) -> Address {
    base + (index * ELEMENT_SIZE) as Address
}
