//! Error handling module for the vmemt CLI.
//!
//! Errors from the memory runtime convert into [`VmemtError`] through
//! `#[from]`; everything the commands detect themselves gets its own variant.

use thiserror::Error;
use vmem::VmemError;

/// Main error type for the vmemt CLI application.
#[derive(Error, Debug)]
pub enum VmemtError {
    /// Error raised by the memory runtime.
    #[error(transparent)]
    Vmem(#[from] VmemError),

    /// A value read back differs from the value written.
    #[error(
        "memtest mismatch at element {index}: wrote {expected:#010x}, read {actual:#010x} (address {address:#010x})"
    )]
    Mismatch {
        index: usize,
        expected: i32,
        actual: i32,
        address: u32,
    },

    /// Result differs from the plain-vector baseline.
    #[error("Verification failed: {0}")]
    Verification(String),

    /// Error when input validation fails.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Error when logging or configuration setup fails.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error when JSON serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using VmemtError.
pub type Result<T> = std::result::Result<T, VmemtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mismatch_display() {
        let err = VmemtError::Mismatch {
            index: 3,
            expected: 0x10,
            actual: 0,
            address: 0x100c,
        };
        assert_eq!(
            err.to_string(),
            "memtest mismatch at element 3: wrote 0x00000010, read 0x00000000 (address 0x0000100c)"
        );
    }

    #[test]
    fn test_vmem_error_conversion() {
        let err: VmemtError = VmemError::AddressSpaceExhausted { pages: 1 }.into();
        assert!(matches!(err, VmemtError::Vmem(_)));
        assert_eq!(
            err.to_string(),
            "Address space exhausted: 1 pages already allocated"
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = VmemtError::Validation("size must be > 0".to_string());
        assert_eq!(err.to_string(), "Validation error: size must be > 0");
    }
}
