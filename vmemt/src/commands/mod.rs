//! Command modules for the vmemt CLI.
//!
//! Each subcommand lives in its own file with an `Args` struct, a report
//! type and a `run_*` entry point.

pub mod info;
pub mod matmul;
pub mod memtest;

pub use info::{run_info, InfoArgs, InfoReport};
pub use matmul::{run_matmul, MatmulArgs, MatmulReport};
pub use memtest::{run_memtest, MemtestArgs, MemtestReport};

use serde::Serialize;

use crate::error::Result;

/// Print a report as pretty JSON on stdout.
pub fn print_json<T: Serialize>(report: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}
