//! Vmemt CLI - a command-line driver for the vmem paged memory runtime.
//!
//! This is the main entry point for the vmemt CLI application.
//! It uses clap for argument parsing and dispatches to the command
//! handlers, which exercise an address space end to end.

mod alloc;
mod commands;
mod error;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vmem::{PageKind, VmemConfig};

use commands::{
    matmul::{DEFAULT_ITERATIONS, DEFAULT_SIZE},
    memtest::DEFAULT_COUNT,
    print_json, run_info, run_matmul, run_memtest, InfoArgs, MatmulArgs, MemtestArgs,
};
use error::{Result, VmemtError};

/// Vmemt - exercise a paged virtual address space
///
/// Vmemt allocates memory through a bump allocator, reads and writes it
/// through self-relinking call sites, and reports what happened.
#[derive(Parser, Debug)]
#[command(name = "vmemt")]
#[command(author = "Vmem Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A command-line driver for the vmem paged memory runtime", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, env = "VMEMT_VERBOSE")]
    verbose: bool,

    /// Disable color output
    #[arg(long, global = true, env = "VMEMT_NO_COLOR")]
    no_color: bool,

    /// Page kind for new pages (heap, direct)
    #[arg(long, global = true)]
    page_kind: Option<PageKind>,

    /// Maximum number of pages in the address space
    #[arg(long, global = true)]
    max_pages: Option<usize>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the vmemt CLI.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Show address layout and effective configuration
    Info,

    /// Write random ints and read them back
    ///
    /// Allocates `4 * count` bytes, writes through one call site and
    /// verifies through another.
    Memtest(MemtestCommand),

    /// Multiply matrices in paged memory
    ///
    /// Runs `C = A*B; B = C*A; A = B*C` repeatedly through call sites and
    /// verifies against plain vectors.
    Matmul(MatmulCommand),
}

/// Arguments for the memtest subcommand.
#[derive(Parser, Debug)]
struct MemtestCommand {
    /// Number of ints to write (at most one page worth)
    #[arg(short, long, default_value_t = DEFAULT_COUNT)]
    count: usize,

    /// Seed for the random data
    #[arg(short, long)]
    seed: Option<u64>,
}

/// Arguments for the matmul subcommand.
#[derive(Parser, Debug)]
struct MatmulCommand {
    /// Matrix dimension (a matrix must fit one page)
    #[arg(short = 'm', long, default_value_t = DEFAULT_SIZE)]
    size: usize,

    /// Rounds of three multiplications
    #[arg(short, long, default_value_t = DEFAULT_ITERATIONS)]
    iterations: usize,

    /// Seed for the input matrices
    #[arg(short, long)]
    seed: Option<u64>,

    /// Print the final C matrix
    #[arg(short, long)]
    print: bool,

    /// Put consecutive matrices on pages of alternating kinds
    #[arg(long)]
    mixed: bool,
}

/// Main entry point for the vmemt CLI.
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.no_color).context("failed to set up logging")?;

    let config = build_config(&cli).context("invalid configuration")?;

    execute_command(cli.command, cli.json, config).context("command failed")?;
    Ok(())
}

/// Initialize the logging system.
///
/// `log` records from the vmem library are forwarded through the same
/// subscriber.
fn init_logging(verbose: bool, no_color: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let subscriber = fmt::layer()
        .with_ansi(!no_color)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .map_err(|e| VmemtError::Config(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

/// Build the address space configuration.
///
/// Starts from `VMEM_*` environment overrides; command-line flags win.
fn build_config(cli: &Cli) -> Result<VmemConfig> {
    let mut config = VmemConfig::from_env();
    if let Some(kind) = cli.page_kind {
        config.default_page_kind = kind;
    }
    if let Some(max_pages) = cli.max_pages {
        config.max_pages = max_pages;
    }
    config.verbose |= cli.verbose;
    config.validate().map_err(vmem::VmemError::from)?;
    Ok(config)
}

/// Execute the selected command.
fn execute_command(command: Commands, json: bool, config: VmemConfig) -> Result<()> {
    match command {
        Commands::Info => execute_info(json, config),
        Commands::Memtest(args) => execute_memtest(args, json, config),
        Commands::Matmul(args) => execute_matmul(args, json, config),
    }
}

/// Execute the info command.
fn execute_info(json: bool, config: VmemConfig) -> Result<()> {
    let report = run_info(InfoArgs { config })?;
    if json {
        return print_json(&report);
    }
    print!("{}", report.to_text());
    Ok(())
}

/// Execute the memtest command.
fn execute_memtest(args: MemtestCommand, json: bool, config: VmemConfig) -> Result<()> {
    let report = run_memtest(MemtestArgs {
        config,
        count: args.count,
        seed: args.seed,
    })?;
    if json {
        return print_json(&report);
    }
    println!(
        "memtest ok: {} ints at {:#010x} (seed {}, {} relinks)",
        report.count, report.base, report.seed, report.relinks
    );
    Ok(())
}

/// Execute the matmul command.
fn execute_matmul(args: MatmulCommand, json: bool, config: VmemConfig) -> Result<()> {
    let report = run_matmul(MatmulArgs {
        config,
        size: args.size,
        iterations: args.iterations,
        seed: args.seed,
        print: args.print,
        mixed: args.mixed,
    })?;
    if json {
        return print_json(&report);
    }

    println!(
        "a = {:#010x}, b = {:#010x}, c = {:#010x}",
        report.matrices[0], report.matrices[1], report.matrices[2]
    );
    if let Some(rows) = &report.result {
        for row in rows {
            let line: Vec<String> = row.iter().map(|v| format!("[{}]", v)).collect();
            println!("{}", line.join(" "));
        }
    }
    println!(
        "matmul ok: {}x{}, {} iterations in {:.3} ms ({} relinks, checksum {})",
        report.size,
        report.size,
        report.iterations,
        report.elapsed_ms,
        report.relinks,
        report.checksum
    );
    Ok(())
}
