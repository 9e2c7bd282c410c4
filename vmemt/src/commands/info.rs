//! Info command implementation.
//!
//! Prints the address layout constants and the effective configuration.

use serde::Serialize;
use vmem::address::{ELEMENTS_PER_PAGE, ELEMENT_SIZE, MAX_PAGES};
use vmem::page::os_page_size;
use vmem::{VmemConfig, INDEX_BITS, PAGE_SIZE};

use crate::error::Result;

/// Arguments for the info command.
#[derive(Debug, Clone, Default)]
pub struct InfoArgs {
    /// Effective configuration.
    pub config: VmemConfig,
}

/// Address layout and configuration summary.
#[derive(Debug, Clone, Serialize)]
pub struct InfoReport {
    pub version: &'static str,
    pub index_bits: u32,
    pub page_size: usize,
    pub element_size: usize,
    pub elements_per_page: usize,
    pub max_pages: usize,
    pub os_page_size: usize,
    pub config: VmemConfig,
}

impl InfoReport {
    /// Render as aligned `key: value` lines.
    pub fn to_text(&self) -> String {
        let rows = [
            ("version", self.version.to_string()),
            ("index bits", self.index_bits.to_string()),
            ("page size", format!("{} bytes", self.page_size)),
            ("element size", format!("{} bytes", self.element_size)),
            ("elements per page", self.elements_per_page.to_string()),
            ("address pages", self.max_pages.to_string()),
            ("os page size", format!("{} bytes", self.os_page_size)),
            ("default page kind", self.config.default_page_kind.to_string()),
            ("max pages", self.config.max_pages.to_string()),
            ("stats", self.config.stats_enabled.to_string()),
        ];
        rows.iter()
            .map(|(key, value)| format!("{:<18} {}\n", format!("{}:", key), value))
            .collect()
    }
}

/// Execute the info command.
pub fn run_info(args: InfoArgs) -> Result<InfoReport> {
    Ok(InfoReport {
        version: vmem::VERSION,
        index_bits: INDEX_BITS,
        page_size: PAGE_SIZE,
        element_size: ELEMENT_SIZE,
        elements_per_page: ELEMENTS_PER_PAGE,
        max_pages: MAX_PAGES,
        os_page_size: os_page_size(),
        config: args.config,
    })
}
