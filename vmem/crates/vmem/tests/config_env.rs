//! Configuration Environment Tests
//!
//! Environment variables are process-wide, so every case runs inside one
//! test function.

use vmem::address::MAX_PAGES;
use vmem::{AddressSpace, PageKind, VmemConfig, VmemError};

const VARS: [&str; 4] = [
    "VMEM_PAGE_KIND",
    "VMEM_MAX_PAGES",
    "VMEM_VERBOSE",
    "VMEM_STATS",
];

fn clear() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
fn test_env_overrides() {
    clear();
    assert_eq!(VmemConfig::from_env(), VmemConfig::default());

    std::env::set_var("VMEM_PAGE_KIND", "direct");
    std::env::set_var("VMEM_MAX_PAGES", "4");
    std::env::set_var("VMEM_VERBOSE", "true");
    std::env::set_var("VMEM_STATS", "0");
    let config = VmemConfig::from_env();
    assert_eq!(config.default_page_kind, PageKind::Direct);
    assert_eq!(config.max_pages, 4);
    assert!(config.verbose);
    assert!(!config.stats_enabled);

    let space = vmem::init().unwrap();
    space.allocate_page(None).unwrap();
    assert_eq!(space.current_snapshot().kind_of(0), Some(PageKind::Direct));
    assert_eq!(space.stats().snapshot().pages(), 0);

    // unparsable values fall back to defaults
    std::env::set_var("VMEM_PAGE_KIND", "swap");
    std::env::set_var("VMEM_MAX_PAGES", "lots");
    let config = VmemConfig::from_env();
    assert_eq!(config.default_page_kind, PageKind::Heap);
    assert_eq!(config.max_pages, MAX_PAGES);

    // parsable but invalid values are caught by validation
    std::env::set_var("VMEM_MAX_PAGES", "0");
    assert!(matches!(vmem::init(), Err(VmemError::Configuration(_))));

    clear();
    assert!(AddressSpace::new(VmemConfig::from_env()).is_ok());
}
