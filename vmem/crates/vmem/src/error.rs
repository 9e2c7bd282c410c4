//! Error Module - Vmem Error Types
//!
//! Defines all error types used in vmem.
//!
//! # Error Categories
//!
//! ## Permanent Errors
//! - `UnsupportedOperation` - Operation name or call shape matches nothing
//! - `AllocationTooLarge` - Request does not fit in a single page
//!
//! ## Address Space Errors
//! - `AddressSpaceExhausted` - No page ids left
//! - `UnmappedAddress` - Address names a page that does not exist
//! - `UnmappedPage` - Page id names a page that does not exist
//! - `PageAllocation` - Backing storage for a page could not be created
//!
//! ## Configuration Errors
//! - `Configuration` - Invalid configuration
//!
//! A relink is *not* an error. Guarded accessors report it through
//! [`crate::link::Access::Relink`] and call sites consume it before it can
//! reach a caller.

use crate::config::ConfigError;
use thiserror::Error;

/// Main error type for all vmem operations
///
/// # Examples
///
/// ```rust
/// use vmem::VmemError;
///
/// fn handle_error(err: VmemError) {
///     match err {
///         VmemError::AllocationTooLarge { requested, capacity } => {
///             eprintln!("requested {} bytes, a page holds {}", requested, capacity);
///         }
///         VmemError::UnsupportedOperation { operation, .. } => {
///             eprintln!("cannot link {}", operation);
///         }
///         _ => eprintln!("other error: {}", err),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum VmemError {
    /// Operation cannot be resolved
    ///
    /// **When returned:** The operation name does not parse, or the
    /// verb/namespace/target combination or call signature is not one the
    /// resolver knows.
    ///
    /// **Recovery strategy:** None. The same request shape will always fail.
    #[error("Unsupported operation {operation}: {reason}")]
    UnsupportedOperation { operation: String, reason: String },

    /// Allocation larger than one page
    ///
    /// **When returned:** `reserve` called with more bytes than `PAGE_SIZE`
    ///
    /// **Recovery strategy:** Split the allocation; multi-page spans are
    /// not supported.
    #[error("Allocation too large: requested {requested} bytes, page capacity is {capacity} bytes")]
    AllocationTooLarge { requested: usize, capacity: usize },

    /// Page id space used up
    ///
    /// **When returned:** `allocate_page` after `max_pages` pages exist
    #[error("Address space exhausted: {pages} pages already allocated")]
    AddressSpaceExhausted { pages: usize },

    /// Address does not belong to any allocated page
    ///
    /// **When returned:** Resolution or a slow-path access decodes a page id
    /// the current snapshot does not contain.
    #[error("Unmapped address: {address:#010x}")]
    UnmappedAddress { address: u32 },

    /// Page id does not name an allocated page
    ///
    /// **When returned:** Page lookup resolution with a page id the current
    /// snapshot does not contain. Ids may exceed what an address can encode.
    #[error("Unmapped page: {page_id}")]
    UnmappedPage { page_id: u32 },

    /// Backing storage for a page could not be created
    ///
    /// **When returned:** The OS refused an anonymous mapping for a direct page
    #[error("Page allocation failed: {0}")]
    PageAllocation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Internal error - indicates a bug in vmem
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VmemError {
    /// Build an `UnsupportedOperation` error
    pub fn unsupported(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        VmemError::UnsupportedOperation {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error is recoverable
    ///
    /// Only resource failures may succeed if tried again later.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, VmemError::PageAllocation(_))
    }

    /// Check if this error is permanent for the request that produced it
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            VmemError::UnsupportedOperation { .. }
                | VmemError::AllocationTooLarge { .. }
                | VmemError::Configuration(_)
        )
    }

    /// Check if this error indicates a bug in the code
    pub fn is_bug(&self) -> bool {
        matches!(self, VmemError::Internal(_))
    }
}

/// Result type alias for vmem operations
pub type Result<T> = std::result::Result<T, VmemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_is_permanent() {
        let err = VmemError::unsupported("FROB:ELEMENT:memory", "unknown verb");
        assert!(err.is_permanent());
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("FROB:ELEMENT:memory"));
    }

    #[test]
    fn test_allocation_too_large_message() {
        let err = VmemError::AllocationTooLarge {
            requested: 8192,
            capacity: 4096,
        };
        assert_eq!(
            err.to_string(),
            "Allocation too large: requested 8192 bytes, page capacity is 4096 bytes"
        );
    }

    #[test]
    fn test_unmapped_address_formatting() {
        let err = VmemError::UnmappedAddress { address: 0x3000 };
        assert_eq!(err.to_string(), "Unmapped address: 0x00003000");
    }

    #[test]
    fn test_unmapped_page_formatting() {
        let err = VmemError::UnmappedPage { page_id: u32::MAX };
        assert_eq!(err.to_string(), "Unmapped page: 4294967295");
        assert!(!err.is_permanent());
    }
}
