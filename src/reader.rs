//! Table reader: open, point lookup, and range iteration.
//!
//! Opening a table reads its footer, validates the magic number, and loads
//! the index block into memory. Data blocks are read, verified, and
//! decompressed on demand, so lookup cost is proportional to the entries
//! actually examined rather than to the table size.

use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;

use crate::block::{Block, BlockIterator};
use crate::checksum;
use crate::comparator::Comparator;
use crate::config::Options;
use crate::error::{Error, Result};
use crate::format::{BlockHandle, CompressionType, Footer, BLOCK_TRAILER_SIZE, FOOTER_SIZE};
use crate::types::{ReadStore, Store, Value};

/// The file capability a table reader consumes.
///
/// Reads are positional and exact-length: a short read anywhere but end of
/// file is an error. Implementations must be safe to call from a shared
/// reference; the reader never seeks a shared cursor.
pub trait RandomAccessFile: Send + Sync {
    /// Reads exactly `buf.len()` bytes starting at `offset`.
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()>;

    /// Returns the file size in bytes.
    fn size(&self) -> io::Result<u64>;
}

impl RandomAccessFile for File {
    #[cfg(unix)]
    fn read_at(&self, buf: &mut [u8], offset: u64) -> io::Result<()> {
        std::os::unix::fs::FileExt::read_exact_at(self, buf, offset)
    }

    #[cfg(windows)]
    fn read_at(&self, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
        use std::os::windows::fs::FileExt;
        while !buf.is_empty() {
            match self.seek_read(buf, offset) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "failed to fill whole buffer",
                    ))
                }
                Ok(n) => {
                    buf = &mut buf[n..];
                    offset += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}

/// A handle over one immutable table file.
///
/// The reader owns the file and the decoded index block; both are
/// immutable after open. Lookups and scans decode data blocks on demand.
///
/// Usage:
/// ```no_run
/// use sstable::{Options, Reader};
///
/// let reader = Reader::open("table.sst", Options::default()).unwrap();
/// let value = reader.get(b"key1").unwrap();
/// println!("Found: {:?}", value);
/// ```
pub struct Reader {
    file: Box<dyn RandomAccessFile>,
    index: Block,
    comparator: Arc<dyn Comparator>,
    verify_checksums: bool,
}

impl fmt::Debug for Reader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("index", &self.index)
            .field("verify_checksums", &self.verify_checksums)
            .finish()
    }
}

impl Reader {
    /// Opens the table file at `path`.
    pub fn open<P: AsRef<Path>>(path: P, options: Options) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(file, options)
    }

    /// Opens a table over an already-acquired file capability.
    ///
    /// Reads and validates the footer, then loads the index block into
    /// memory. The file is consumed either way; on failure it is dropped
    /// along with the error path.
    pub fn new<F: RandomAccessFile + 'static>(file: F, options: Options) -> Result<Self> {
        let size = file.size()?;
        if size < FOOTER_SIZE as u64 {
            return Err(Error::corruption("file too small to hold a footer"));
        }

        let mut buf = [0u8; FOOTER_SIZE];
        file.read_at(&mut buf, size - FOOTER_SIZE as u64)?;
        let footer = Footer::decode(&buf)?;

        let index = read_block(&file, &footer.index_handle, options.verify_checksums)?;

        Ok(Self {
            file: Box::new(file),
            index,
            comparator: options.comparator,
            verify_checksums: options.verify_checksums,
        })
    }

    /// Returns the value stored under `key`.
    ///
    /// The match is by exact byte equality on the key that
    /// [`find`](Reader::find) surfaces; a miss is
    /// [`Error::NotFound`].
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let mut iter = self.find(key);
        if !iter.next() || iter.key() != Some(key) {
            iter.close()?;
            return Err(Error::NotFound);
        }
        let value = iter.value().map(|v| v.to_vec()).unwrap_or_default();
        iter.close()?;
        Ok(value)
    }

    /// Returns an iterator positioned so that its first `next()` yields the
    /// first entry whose key is >= `key`, scanning forward from there in
    /// comparator order. An empty key scans the whole table.
    ///
    /// Errors hit while positioning are latched onto the returned iterator.
    pub fn find(&self, key: &[u8]) -> TableIterator<'_> {
        let index = match self.index.seek(self.comparator.as_ref(), key) {
            Ok(iter) => iter,
            Err(err) => {
                return TableIterator {
                    reader: self,
                    index: BlockIterator::exhausted(),
                    data: None,
                    err: Some(err),
                }
            }
        };
        let mut iter = TableIterator { reader: self, index, data: None, err: None };
        iter.next_block(key);
        iter
    }

    /// Closes the table, releasing the underlying file.
    pub fn close(self) -> Result<()> {
        Ok(())
    }

    fn read_block(&self, handle: &BlockHandle) -> Result<Block> {
        read_block(self.file.as_ref(), handle, self.verify_checksums)
    }
}

impl ReadStore for Reader {
    fn get(&self, key: &[u8]) -> Result<Value> {
        Reader::get(self, key)
    }
}

impl Store for Reader {
    fn set(&mut self, _key: &[u8], _value: &[u8]) -> Result<()> {
        Err(Error::read_only("cannot set into a table"))
    }

    fn delete(&mut self, _key: &[u8]) -> Result<()> {
        Err(Error::read_only("cannot delete from a table"))
    }
}

/// Reads one block: body plus trailer, checksum verification, and
/// decompression.
fn read_block(
    file: &dyn RandomAccessFile,
    handle: &BlockHandle,
    verify_checksums: bool,
) -> Result<Block> {
    let body_len = usize::try_from(handle.length)
        .map_err(|_| Error::corruption("block length out of range"))?;
    let total = body_len
        .checked_add(BLOCK_TRAILER_SIZE)
        .ok_or_else(|| Error::corruption("block length out of range"))?;

    let mut buf = vec![0u8; total];
    file.read_at(&mut buf, handle.offset)?;

    if verify_checksums {
        let expected = u32::from_le_bytes(buf[body_len + 1..].try_into().unwrap());
        // The checksum covers the body and the compression-type byte.
        let actual = checksum::masked_crc32c(&buf[..body_len + 1]);
        if expected != actual {
            return Err(Error::ChecksumMismatch { expected, actual });
        }
    }

    let type_byte = buf[body_len];
    let compression =
        CompressionType::from_u8(type_byte).ok_or(Error::UnknownCompression(type_byte))?;
    let body = match compression {
        CompressionType::None => {
            let mut body = Bytes::from(buf);
            body.truncate(body_len);
            body
        }
        CompressionType::Snappy => {
            #[cfg(feature = "snappy")]
            {
                let decoded = snap::raw::Decoder::new()
                    .decompress_vec(&buf[..body_len])
                    .map_err(|e| Error::decompression(e.to_string()))?;
                Bytes::from(decoded)
            }
            #[cfg(not(feature = "snappy"))]
            {
                return Err(Error::decompression("snappy support not enabled"));
            }
        }
    };
    Ok(Block::new(body))
}

/// A two-level iterator over an entire table.
///
/// The outer level walks the in-memory index block; the inner level walks
/// the data block the current index entry points at. When the inner
/// iterator is exhausted the next index entry's block is loaded, so a full
/// scan touches each data block exactly once.
pub struct TableIterator<'a> {
    reader: &'a Reader,
    index: BlockIterator,
    /// Iterator over the current data block; `None` once the iterator is
    /// done or was born errored.
    data: Option<BlockIterator>,
    err: Option<Error>,
}

impl TableIterator<'_> {
    /// Advances to the next entry. Returns false at end or after an error.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        if self.data.is_none() {
            return false;
        }
        loop {
            if let Some(data) = self.data.as_mut() {
                if data.next() {
                    return true;
                }
                if let Some(err) = data.take_err() {
                    self.err = Some(err);
                    break;
                }
            }
            if !self.next_block(&[]) {
                break;
            }
        }
        self.data = None;
        false
    }

    /// Returns the current entry's key, if positioned on one.
    ///
    /// The slice is only valid until the next call to
    /// [`next`](TableIterator::next).
    pub fn key(&self) -> Option<&[u8]> {
        self.data.as_ref().filter(|d| d.valid()).map(|d| d.key())
    }

    /// Returns the current entry's value, if positioned on one.
    pub fn value(&self) -> Option<&[u8]> {
        self.data.as_ref().filter(|d| d.valid()).map(|d| d.value())
    }

    /// Releases the iterator and reports any latched error.
    pub fn close(mut self) -> Result<()> {
        self.data = None;
        match self.err.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Advances the index iterator and loads the block its entry points
    /// at, positioned at the first key >= `target`. Returns false when the
    /// index is exhausted or an error was latched.
    fn next_block(&mut self, target: &[u8]) -> bool {
        if !self.index.next() {
            self.err = self.index.take_err();
            return false;
        }
        let handle = {
            let value = self.index.value();
            // The handle must account for the entire index entry value.
            match BlockHandle::decode(value) {
                Some((handle, n)) if n == value.len() => handle,
                _ => {
                    self.err = Some(Error::corruption("corrupt index entry"));
                    return false;
                }
            }
        };
        let block = match self.reader.read_block(&handle) {
            Ok(block) => block,
            Err(err) => {
                self.err = Some(err);
                return false;
            }
        };
        match block.seek(self.reader.comparator.as_ref(), target) {
            Ok(data) => {
                self.data = Some(data);
                true
            }
            Err(err) => {
                self.err = Some(err);
                false
            }
        }
    }
}
