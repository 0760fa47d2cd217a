//! Reader configuration

use affread_core::{MAX_ALLOCATION_SIZE, MAX_TREE_PREALLOC};

/// Limits and options applied while opening an archive
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Largest string table section that will be buffered
    pub max_stable_bytes: usize,
    /// Cap on the node capacity reserved from the advisory record count
    pub max_tree_prealloc: usize,
    /// Also verify the data section digest while opening
    pub verify_data: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_stable_bytes: MAX_ALLOCATION_SIZE,
            max_tree_prealloc: MAX_TREE_PREALLOC,
            verify_data: false,
        }
    }
}

impl ReaderConfig {
    /// Default limits with data verification switched on
    pub fn verifying() -> Self {
        Self {
            verify_data: true,
            ..Self::default()
        }
    }
}
