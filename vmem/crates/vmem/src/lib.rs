//! # Vmem - Paged Virtual Memory with Self-Specializing Access
//!
//! Vmem emulates a flat, growable 32-bit address space on top of fixed-size
//! pages whose representation is chosen per page at run time. Access goes
//! through call sites that speculate on a page representation and a page
//! table snapshot, run a monomorphized fast path while the speculation
//! holds, and re-resolve themselves when it does not.
//!
//! ## Overview
//!
//! - **Paged Address Space**: 4KB pages appended on demand, up to 2^20 pages
//! - **Heterogeneous Pages**: heap buffers and anonymous OS mappings in one table
//! - **Versioned Page Tables**: immutable snapshots published by replacement
//! - **Guarded Accessors**: fast paths that report `Relink` instead of failing
//! - **Operation Resolver**: maps `VERB:NAMESPACE:TARGET` names to accessors
//!
//! ## Quick Start
//!
//! ```rust
//! use vmem::{AddressSpace, GetSite, PageKind, SetSite, VmemConfig};
//!
//! fn main() -> Result<(), vmem::VmemError> {
//!     let space = AddressSpace::new(VmemConfig::default())?;
//!     let heap = space.allocate_page(Some(PageKind::Heap))?;
//!     let direct = space.allocate_page(Some(PageKind::Direct))?;
//!
//!     let mut set = SetSite::new("SET:ELEMENT:memory")?;
//!     let mut get = GetSite::new("GET:ELEMENT:memory")?;
//!
//!     set.set(&space, heap, 1)?;
//!     set.set(&space, direct, 2)?; // different page kind: relinks once
//!
//!     assert_eq!(get.get(&space, heap)?, 1);
//!     assert_eq!(get.get(&space, direct)?, 2);
//!     assert_eq!(set.relink_count(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  CallSite<L>            cached accessor, relink counter  │
//! │        │ Access::Relink                                  │
//! │        ▼                                                 │
//! │  resolver::resolve      operation + signature + args     │
//! │        │                                                 │
//! │        ▼                                                 │
//! │  Guard { owner, Arc<PageTable>, kind } + fn pointer      │
//! └────────┼─────────────────────────────────────────────────┘
//!          │
//! ┌────────┼─────────────────────────────────────────────────┐
//! │  AddressSpace           epoch-protected current table    │
//! │        ▼                                                 │
//! │  PageTable (gen N)  ──extend──▶  PageTable (gen N+1)     │
//! │  [Heap, Direct, ...]             old token invalidated   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Address Layout
//!
//! ```text
//! ┌──────────────────────────────┬──────────────────┐
//! │          Page Id             │   Byte Offset    │
//! │           31-12              │      11-0        │
//! └──────────────────────────────┴──────────────────┘
//! ```
//!
//! ## Thread Safety
//!
//! - `AddressSpace` is `Send + Sync`; growth is serialized, snapshot reads
//!   and fast paths never lock
//! - Element cells are relaxed atomics: unsynchronized writers to one cell
//!   race as on raw memory, without undefined behaviour
//! - `CallSite` is a per-thread value (`&mut self`)
//!
//! ## Modules
//!
//! - [`address`]: address codec and layout constants
//! - [`page`]: page representations
//! - [`table`]: immutable page table snapshots
//! - [`space`]: address space manager
//! - [`link`]: operation names, signatures, resolver and guarded accessors
//! - [`callsite`]: resolve-once call sites with relink
//! - [`config`]: configuration and environment overrides
//! - [`stats`]: allocation and link counters
//! - [`logging`]: structured event log
//! - [`error`]: error types
//!
//! ## Limitations
//!
//! - Accesses never span pages and pages are never freed individually
//! - Misaligned offsets are rounded down to the containing element

pub mod address;
pub mod callsite;
pub mod config;
pub mod error;
pub mod link;
pub mod logging;
pub mod page;
pub mod space;
pub mod stats;
pub mod table;

pub use address::{Address, PageId, INDEX_BITS, PAGE_SIZE};
pub use callsite::{CallSite, GetSite, Linkable, PageSite, SetSite};
pub use config::{ConfigError, VmemConfig};
pub use error::{Result, VmemError};
pub use link::{Access, Linked, Operation, Signature, Value, ValueType};
pub use page::{PageHandle, PageKind};
pub use space::{AddressSpace, SpaceId};
pub use stats::StatsSnapshot;
pub use table::PageTable;

/// Vmem version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Create an address space configured from the environment
///
/// Reads `VMEM_*` overrides (see [`VmemConfig::from_env`]) and validates them.
///
/// # Examples
///
/// ```rust
/// let space = vmem::init()?;
/// let base = space.allocate_page(None)?;
/// space.write_int(base, 1)?;
/// # Ok::<(), vmem::VmemError>(())
/// ```
pub fn init() -> Result<AddressSpace> {
    AddressSpace::new(VmemConfig::from_env())
}

/// Create an address space with a custom configuration
pub fn init_with_config(config: VmemConfig) -> Result<AddressSpace> {
    AddressSpace::new(config)
}
