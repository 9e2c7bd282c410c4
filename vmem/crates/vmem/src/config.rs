//! Configuration Module - Address Space Parameters
//!
//! Page size and address layout are compile-time constants (see
//! [`crate::address`]). What remains tunable is which page representation
//! new pages use, how many pages an address space may hold, and how much
//! the runtime reports about itself.

use crate::address::MAX_PAGES;
use crate::page::PageKind;
use serde::{Deserialize, Serialize};

/// Main configuration for an address space
///
/// # Examples
///
/// ```rust
/// use vmem::{PageKind, VmemConfig};
///
/// let config = VmemConfig {
///     default_page_kind: PageKind::Direct,
///     max_pages: 1024,
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmemConfig {
    /// Representation used when `allocate_page` is not given a kind
    ///
    /// Default: `PageKind::Heap`
    pub default_page_kind: PageKind,

    /// Maximum number of pages in one address space
    ///
    /// Must be between 1 and `MAX_PAGES` (the number of page ids a 32-bit
    /// address can name).
    ///
    /// Default: `MAX_PAGES`
    pub max_pages: usize,

    /// Emit structured events for allocations and links
    ///
    /// Default: false
    pub verbose: bool,

    /// Collect allocation and link counters
    ///
    /// Default: true
    pub stats_enabled: bool,
}

impl Default for VmemConfig {
    fn default() -> Self {
        VmemConfig {
            default_page_kind: PageKind::Heap,
            max_pages: MAX_PAGES,
            verbose: false,
            stats_enabled: true,
        }
    }
}

impl VmemConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pages == 0 {
            return Err(ConfigError::InvalidMaxPages(
                "max_pages must be > 0".to_string(),
            ));
        }

        if self.max_pages > MAX_PAGES {
            return Err(ConfigError::InvalidMaxPages(format!(
                "max_pages must be <= {} (32-bit addresses with 4KB pages)",
                MAX_PAGES
            )));
        }

        Ok(())
    }

    /// Build configuration from environment variables
    ///
    /// Overrides defaults with environment variables:
    /// - VMEM_PAGE_KIND (`heap` or `direct`)
    /// - VMEM_MAX_PAGES
    /// - VMEM_VERBOSE
    /// - VMEM_STATS
    ///
    /// Unparsable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("VMEM_PAGE_KIND") {
            if let Ok(kind) = val.parse::<PageKind>() {
                config.default_page_kind = kind;
            }
        }

        if let Ok(val) = std::env::var("VMEM_MAX_PAGES") {
            if let Ok(pages) = val.parse::<usize>() {
                config.max_pages = pages;
            }
        }

        if let Ok(val) = std::env::var("VMEM_VERBOSE") {
            config.verbose = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("VMEM_STATS") {
            config.stats_enabled = parse_flag(&val);
        }

        config
    }

    /// Largest address this configuration can hand out, plus one
    pub fn address_limit(&self) -> u64 {
        (self.max_pages as u64) << crate::address::INDEX_BITS
    }
}

fn parse_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid max pages: {0}")]
    InvalidMaxPages(String),
}
