//! Shared key/value types and store capabilities.

use crate::error::Result;

/// Raw key bytes.
pub type Key = Vec<u8>;

/// Raw value bytes.
pub type Value = Vec<u8>;

/// The read-only capability over a keyed byte store.
///
/// This is the shape a table reader satisfies natively. Callers that only
/// need lookups should accept this rather than [`Store`].
pub trait ReadStore {
    /// Returns the value stored under `key`, or
    /// [`Error::NotFound`](crate::Error::NotFound).
    fn get(&self, key: &[u8]) -> Result<Value>;
}

/// The full read-write store contract.
///
/// A table reader implements this shape for callers handed the wider
/// capability, but its mutating operations always fail with
/// [`Error::ReadOnly`](crate::Error::ReadOnly): a table, once written, is
/// an immutable byte stream.
pub trait Store: ReadStore {
    /// Stores `value` under `key`.
    fn set(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Removes `key`.
    fn delete(&mut self, key: &[u8]) -> Result<()>;
}
