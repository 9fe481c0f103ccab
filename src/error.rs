//! Error types for the sstable crate.

use std::fmt;
use std::io;

/// The result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for table operations.
#[derive(Debug)]
pub enum Error {
    /// An I/O error occurred while reading the table file.
    Io(io::Error),

    /// Structural corruption was detected in the table file.
    Corruption(String),

    /// A block checksum did not match its stored value.
    ChecksumMismatch {
        /// The masked checksum stored in the block trailer.
        expected: u32,
        /// The masked checksum recomputed over the block contents.
        actual: u32,
    },

    /// A block trailer carried a compression type this format does not define.
    UnknownCompression(u8),

    /// A compressed block body failed to decompress.
    Decompression(String),

    /// The requested key is not present in the table.
    NotFound,

    /// A mutation was attempted on a read-only table.
    ReadOnly(String),
}

impl Error {
    /// Creates a new corruption error.
    pub fn corruption(msg: impl Into<String>) -> Self {
        Error::Corruption(msg.into())
    }

    /// Creates a new decompression error.
    pub fn decompression(msg: impl Into<String>) -> Self {
        Error::Decompression(msg.into())
    }

    /// Creates a new read-only error.
    pub fn read_only(msg: impl Into<String>) -> Self {
        Error::ReadOnly(msg.into())
    }

    /// Returns true for the corruption-class kinds: structural corruption,
    /// checksum mismatches, unknown compression types, and decompression
    /// failures.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::Corruption(_)
                | Error::ChecksumMismatch { .. }
                | Error::UnknownCompression(_)
                | Error::Decompression(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Corruption(msg) => write!(f, "Data corruption: {}", msg),
            Error::ChecksumMismatch { expected, actual } => {
                write!(f, "Checksum mismatch: expected {:#x}, got {:#x}", expected, actual)
            }
            Error::UnknownCompression(t) => write!(f, "Unknown block compression: {}", t),
            Error::Decompression(msg) => write!(f, "Decompression failed: {}", msg),
            Error::NotFound => write!(f, "Not found"),
            Error::ReadOnly(msg) => write!(f, "Read-only table: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
