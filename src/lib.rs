//! # sstable - A Read-Only Sorted Table Reader
//!
//! This crate reads immutable, sorted key-value table files ("SSTables"):
//! block-structured containers mapping byte-string keys to byte-string
//! values, sorted by a pluggable comparator. It exposes point lookup and
//! range iteration, decoding on demand from the underlying file.
//!
//! ## Architecture
//!
//! A table file is a sequence of data blocks, a metaindex block, an index
//! block, and a fixed 48-byte footer. The reader works in two levels:
//!
//! - **Footer**: located at the end of the file, points at the index block
//! - **Index block**: kept in memory, maps separator keys to data blocks
//! - **Data blocks**: read, checksum-verified, and decompressed on demand
//! - **Blocks**: prefix-compressed entries plus a restart-point index
//!   enabling in-block binary search
//!
//! The reader is strictly read-only: a table, once opened, describes an
//! immutable byte stream. Writing tables is a separate concern.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use sstable::{Error, Options, Reader};
//!
//! # fn main() -> Result<(), sstable::Error> {
//! let reader = Reader::open("table.sst", Options::default())?;
//!
//! // Point lookup
//! match reader.get(b"key1") {
//!     Ok(value) => println!("Found: {:?}", value),
//!     Err(Error::NotFound) => println!("No such key"),
//!     Err(e) => return Err(e),
//! }
//!
//! // Range scan from a lower bound
//! let mut iter = reader.find(b"key1");
//! while iter.next() {
//!     println!("{:?} => {:?}", iter.key(), iter.value());
//! }
//! iter.close()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Module declarations
pub mod block;
pub mod checksum;
pub mod comparator;
pub mod config;
pub mod error;
pub mod format;
pub mod reader;
pub mod types;
pub mod varint;

// Re-exports
pub use block::{Block, BlockIterator};
pub use comparator::{BytewiseComparator, Comparator};
pub use config::Options;
pub use error::{Error, Result};
pub use format::{BlockHandle, CompressionType, Footer};
pub use reader::{RandomAccessFile, Reader, TableIterator};
pub use types::{Key, ReadStore, Store, Value};
