//! Configuration options for opening a table.

use std::sync::Arc;

use crate::comparator::{BytewiseComparator, Comparator};

/// Options consumed by [`Reader::new`](crate::Reader::new).
///
/// The comparator must be the same total order the table was written
/// under; the reader has no way to detect a mismatch.
#[derive(Clone)]
pub struct Options {
    /// Total order over keys.
    /// Default: [`BytewiseComparator`].
    pub comparator: Arc<dyn Comparator>,

    /// Verify the CRC-32C trailer of every block read.
    /// Default: false
    pub verify_checksums: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            comparator: Arc::new(BytewiseComparator),
            verify_checksums: false,
        }
    }
}

impl Options {
    /// Creates a new Options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the key comparator.
    pub fn comparator(mut self, comparator: Arc<dyn Comparator>) -> Self {
        self.comparator = comparator;
        self
    }

    /// Enables or disables per-block checksum verification.
    pub fn verify_checksums(mut self, value: bool) -> Self {
        self.verify_checksums = value;
        self
    }
}
