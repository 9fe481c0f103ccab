//! Reference table writer for the integration tests.
//!
//! Produces bit-exact table files (prefix-compressed blocks with restart
//! points, block trailers, metaindex and index blocks, footer) so the
//! reader can be exercised against known contents, including deliberately
//! corrupted ones.

#![allow(dead_code)]

use std::io::Write;
use std::mem;

use sstable::checksum;
use sstable::format::{BlockHandle, CompressionType, Footer};
use sstable::varint;
use sstable::{Options, Reader};
use tempfile::NamedTempFile;

pub const DEFAULT_BLOCK_SIZE: usize = 4096;
pub const DEFAULT_RESTART_INTERVAL: usize = 16;

/// Builds one block body: prefix-compressed entries plus the restart array.
pub struct BlockBuilder {
    buf: Vec<u8>,
    restarts: Vec<u32>,
    counter: usize,
    last_key: Vec<u8>,
    restart_interval: usize,
}

impl BlockBuilder {
    pub fn new(restart_interval: usize) -> Self {
        Self {
            buf: Vec::new(),
            restarts: vec![0],
            counter: 0,
            last_key: Vec::new(),
            restart_interval,
        }
    }

    /// Appends an entry. Keys must arrive in the table's sort order.
    pub fn add(&mut self, key: &[u8], value: &[u8]) {
        let shared = if self.counter >= self.restart_interval {
            self.restarts.push(self.buf.len() as u32);
            self.counter = 0;
            0
        } else {
            common_prefix(&self.last_key, key)
        };

        varint::encode(&mut self.buf, shared as u64);
        varint::encode(&mut self.buf, (key.len() - shared) as u64);
        varint::encode(&mut self.buf, value.len() as u64);
        self.buf.extend_from_slice(&key[shared..]);
        self.buf.extend_from_slice(value);

        self.last_key.clear();
        self.last_key.extend_from_slice(key);
        self.counter += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn size_estimate(&self) -> usize {
        self.buf.len() + 4 * self.restarts.len() + 4
    }

    pub fn finish(mut self) -> Vec<u8> {
        for restart in &self.restarts {
            self.buf.extend_from_slice(&restart.to_le_bytes());
        }
        self.buf.extend_from_slice(&(self.restarts.len() as u32).to_le_bytes());
        self.buf
    }
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Appends `body` to `buf` as a block: payload, compression type byte, and
/// masked CRC-32C trailer. Returns the handle locating the payload.
pub fn append_block(buf: &mut Vec<u8>, body: &[u8], compression: CompressionType) -> BlockHandle {
    let payload: Vec<u8> = match compression {
        CompressionType::None => body.to_vec(),
        CompressionType::Snappy => {
            #[cfg(feature = "snappy")]
            {
                snap::raw::Encoder::new().compress_vec(body).unwrap()
            }
            #[cfg(not(feature = "snappy"))]
            panic!("snappy feature required to write compressed tables")
        }
    };

    let offset = buf.len() as u64;
    let length = payload.len() as u64;
    buf.extend_from_slice(&payload);
    buf.push(compression as u8);
    let crc = checksum::masked_crc32c(&buf[offset as usize..]);
    buf.extend_from_slice(&crc.to_le_bytes());
    BlockHandle::new(offset, length)
}

/// Builds a complete table file in memory.
pub struct TableBuilder {
    buf: Vec<u8>,
    block: BlockBuilder,
    index_entries: Vec<(Vec<u8>, BlockHandle)>,
    data_handles: Vec<BlockHandle>,
    last_key: Vec<u8>,
    block_size: usize,
    compression: CompressionType,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            block: BlockBuilder::new(DEFAULT_RESTART_INTERVAL),
            index_entries: Vec::new(),
            data_handles: Vec::new(),
            last_key: Vec::new(),
            block_size: DEFAULT_BLOCK_SIZE,
            compression: CompressionType::None,
        }
    }

    pub fn block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    pub fn compression(mut self, compression: CompressionType) -> Self {
        self.compression = compression;
        self
    }

    /// Appends an entry. Keys must arrive in the table's sort order.
    pub fn add(&mut self, key: &[u8], value: &[u8]) {
        self.block.add(key, value);
        self.last_key.clear();
        self.last_key.extend_from_slice(key);
        if self.block.size_estimate() >= self.block_size {
            self.flush_block();
        }
    }

    fn flush_block(&mut self) {
        if self.block.is_empty() {
            return;
        }
        let block =
            mem::replace(&mut self.block, BlockBuilder::new(DEFAULT_RESTART_INTERVAL));
        let handle = append_block(&mut self.buf, &block.finish(), self.compression);
        // The block's last key separates it from its successor.
        self.index_entries.push((self.last_key.clone(), handle));
        self.data_handles.push(handle);
    }

    pub fn finish(mut self) -> BuiltTable {
        self.flush_block();

        // Metaindex block: empty but structurally valid.
        let metaindex_handle = append_block(
            &mut self.buf,
            &BlockBuilder::new(1).finish(),
            CompressionType::None,
        );

        let mut index = BlockBuilder::new(1);
        for (separator, handle) in &self.index_entries {
            let mut value = Vec::new();
            handle.encode_to(&mut value);
            index.add(separator, &value);
        }
        let index_handle =
            append_block(&mut self.buf, &index.finish(), CompressionType::None);

        let footer = Footer::new(metaindex_handle, index_handle);
        self.buf.extend_from_slice(&footer.encode());

        BuiltTable { bytes: self.buf, data_handles: self.data_handles, index_handle }
    }
}

/// A finished table image plus the handles needed to aim corruption at
/// specific blocks.
pub struct BuiltTable {
    pub bytes: Vec<u8>,
    pub data_handles: Vec<BlockHandle>,
    pub index_handle: BlockHandle,
}

impl BuiltTable {
    pub fn open(&self, options: Options) -> (NamedTempFile, Reader) {
        open_bytes(&self.bytes, options)
    }
}

/// Lands `bytes` in a temp file and opens a reader over it.
pub fn open_bytes(bytes: &[u8], options: Options) -> (NamedTempFile, Reader) {
    let (file, reader) = try_open_bytes(bytes, options);
    (file, reader.unwrap())
}

/// Like [`open_bytes`] but surfaces the open error.
pub fn try_open_bytes(
    bytes: &[u8],
    options: Options,
) -> (NamedTempFile, sstable::Result<Reader>) {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    let reader = Reader::open(file.path(), options);
    (file, reader)
}

pub fn numbered_key(i: usize) -> Vec<u8> {
    format!("k{:05}", i).into_bytes()
}

pub fn reversed_value(key: &[u8]) -> Vec<u8> {
    key.iter().rev().copied().collect()
}

/// Builds a table of `count` entries `k00000..` with each value being its
/// key reversed.
pub fn numbered_table(count: usize, block_size: usize) -> BuiltTable {
    let mut builder = TableBuilder::new().block_size(block_size);
    for i in 0..count {
        let key = numbered_key(i);
        let value = reversed_value(&key);
        builder.add(&key, &value);
    }
    builder.finish()
}
