//! Security validation constants and helpers
//!
//! Limits applied before allocating buffers sized by values read from an
//! archive, so a hostile header cannot force huge allocations.

use crate::Error;

/// Maximum allocation size for single buffer (256 MB)
pub const MAX_ALLOCATION_SIZE: usize = 256 * 1024 * 1024;

/// Maximum number of tree nodes pre-reserved from an advisory record count
pub const MAX_TREE_PREALLOC: usize = 1_000_000;

/// Validate that a size is within allocation limits
///
/// # Security
/// Prevents memory exhaustion from malicious section sizes
pub fn validate_allocation_size(size: u64, limit: usize, context: &str) -> crate::Result<usize> {
    if size > limit as u64 {
        return Err(Error::resource(format!(
            "{} size {} exceeds limit {}",
            context, size, limit
        )));
    }

    size.try_into()
        .map_err(|_| Error::resource(format!("{} size exceeds platform limits", context)))
}

/// Narrow a 64-bit on-disk quantity to 32 bits, failing instead of truncating
pub fn narrow_u32(value: u64, message: &str) -> crate::Result<u32> {
    u32::try_from(value).map_err(|_| Error::malformed(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_allocation_size() {
        assert_eq!(validate_allocation_size(1024, MAX_ALLOCATION_SIZE, "test").unwrap(), 1024);

        assert!(validate_allocation_size(
            MAX_ALLOCATION_SIZE as u64 + 1,
            MAX_ALLOCATION_SIZE,
            "test"
        )
        .is_err());
    }

    #[test]
    fn test_narrow_u32() {
        assert_eq!(narrow_u32(5, "Stable too large").unwrap(), 5);
        assert_eq!(narrow_u32(u32::MAX as u64, "x").unwrap(), u32::MAX);

        let err = narrow_u32(u32::MAX as u64 + 1, "Stable too large").unwrap_err();
        assert_eq!(err.to_string(), "Stable too large");
    }
}
