//! CLI Interface E2E Tests
//!
//! These tests run the vmemt binary and check help output, the info
//! report, and verified memtest and matmul runs.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

/// Get the path to the vmemt binary
fn vmemt_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_vmemt"))
}

fn vmemt() -> Command {
    let mut cmd = Command::new(vmemt_bin());
    cmd.env_remove("VMEMT_VERBOSE")
        .env_remove("VMEM_PAGE_KIND")
        .env_remove("VMEM_MAX_PAGES")
        .env_remove("VMEM_VERBOSE")
        .arg("--no-color");
    cmd
}

#[test]
fn test_cli_help() {
    vmemt()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("memtest").and(predicate::str::contains("matmul")));
}

#[test]
fn test_cli_version() {
    vmemt()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vmemt"));
}

#[test]
fn test_cli_info_text() {
    vmemt()
        .args(["--page-kind", "direct", "info"])
        .assert()
        .success()
        .stdout(predicate::str::contains("page size:         4096 bytes"))
        .stdout(predicate::str::contains("default page kind: direct"));
}

#[test]
fn test_cli_info_json() {
    let output = vmemt().args(["--json", "info"]).output().unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["index_bits"], 12);
    assert_eq!(report["elements_per_page"], 1024);
}

#[test]
fn test_cli_memtest() {
    vmemt()
        .args(["memtest", "--count", "1024", "--seed", "11"])
        .assert()
        .success()
        .stdout(predicate::str::contains("memtest ok: 1024 ints"));
}

#[test]
fn test_cli_memtest_too_large() {
    vmemt()
        .args(["memtest", "--count", "2000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("command failed"));
}

#[test]
fn test_cli_matmul_mixed() {
    let output = vmemt()
        .args([
            "--json", "matmul", "--size", "30", "-i", "1", "--seed", "3", "--mixed",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["size"], 30);
    assert_eq!(report["pages"], 3);
    assert!(report["relinks"].as_u64().unwrap() > 0);
}

#[test]
fn test_cli_matmul_print() {
    vmemt()
        .args(["matmul", "--size", "3", "-i", "1", "--print"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[").and(predicate::str::contains("matmul ok: 3x3")));
}

#[test]
fn test_cli_rejects_zero_max_pages() {
    vmemt()
        .args(["--max-pages", "0", "info"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}
