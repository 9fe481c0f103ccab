//! On-disk format vocabulary.
//!
//! A table file is laid out as:
//!
//! ```text
//! [Data Block 1]
//! [Data Block 2]
//! ...
//! [Data Block N]
//! [Metaindex Block]
//! [Index Block]
//! [Footer: 48B]
//! ```
//!
//! Every block is stored as its body followed by a five-byte trailer:
//!
//! ```text
//! [body: length bytes][compression_type: u8][masked_crc32c: u32 LE]
//! ```
//!
//! The checksum covers `body ++ compression_type`. A [`BlockHandle`]
//! locates the body only; the trailer sits in the five bytes after it.

use crate::error::{Error, Result};
use crate::varint;

/// Size of the fixed footer at the end of every table file.
pub const FOOTER_SIZE: usize = 48;

/// Size of the per-block trailer (compression type + checksum).
pub const BLOCK_TRAILER_SIZE: usize = 5;

/// Magic number terminating the footer, stored little-endian.
pub const MAGIC: u64 = 0xdb47_7524_8b80_fb57;

/// Compression applied to a block body, recorded in its trailer byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionType {
    /// The body is stored as-is.
    None = 0,

    /// The body is a raw Snappy-compressed buffer.
    Snappy = 1,
}

impl CompressionType {
    /// Converts a trailer byte into a compression type.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(CompressionType::None),
            1 => Some(CompressionType::Snappy),
            _ => None,
        }
    }
}

/// BlockHandle locates a block body within the table file.
///
/// Encoded as two consecutive unsigned varints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHandle {
    /// File offset of the block body.
    pub offset: u64,
    /// Length of the block body, excluding the trailer.
    pub length: u64,
}

impl BlockHandle {
    /// Creates a new BlockHandle.
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// Decodes a handle from the front of `src`.
    ///
    /// Returns the handle and the number of bytes consumed, or `None` if
    /// either varint is invalid.
    pub fn decode(src: &[u8]) -> Option<(Self, usize)> {
        let (offset, n) = varint::decode(src)?;
        let (length, m) = varint::decode(&src[n..])?;
        Some((Self { offset, length }, n + m))
    }

    /// Appends the varint encoding of this handle to `dst`.
    pub fn encode_to(&self, dst: &mut Vec<u8>) {
        varint::encode(dst, self.offset);
        varint::encode(dst, self.length);
    }
}

/// Footer is the last 48 bytes of a table file.
///
/// Format:
/// ```text
/// [metaindex handle: varint pair]
/// [index handle: varint pair]
/// [zero padding to 40 bytes]
/// [magic: 8 bytes LE]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    /// Handle to the metaindex block. Validated but otherwise unused.
    pub metaindex_handle: BlockHandle,
    /// Handle to the index block.
    pub index_handle: BlockHandle,
}

impl Footer {
    /// Creates a new Footer.
    pub fn new(metaindex_handle: BlockHandle, index_handle: BlockHandle) -> Self {
        Self { metaindex_handle, index_handle }
    }

    /// Decodes a footer from exactly [`FOOTER_SIZE`] bytes.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != FOOTER_SIZE {
            return Err(Error::corruption(format!(
                "footer size mismatch: expected {}, got {}",
                FOOTER_SIZE,
                data.len()
            )));
        }

        let magic = u64::from_le_bytes(data[FOOTER_SIZE - 8..].try_into().unwrap());
        if magic != MAGIC {
            return Err(Error::corruption("bad magic number"));
        }

        let (metaindex_handle, n) = BlockHandle::decode(data)
            .ok_or_else(|| Error::corruption("bad metaindex block handle"))?;
        let (index_handle, _) = BlockHandle::decode(&data[n..])
            .ok_or_else(|| Error::corruption("bad index block handle"))?;

        Ok(Self { metaindex_handle, index_handle })
    }

    /// Encodes the footer to its fixed 48-byte form.
    pub fn encode(&self) -> [u8; FOOTER_SIZE] {
        let mut handles = Vec::with_capacity(4 * varint::MAX_LEN);
        self.metaindex_handle.encode_to(&mut handles);
        self.index_handle.encode_to(&mut handles);

        let mut buf = [0u8; FOOTER_SIZE];
        buf[..handles.len()].copy_from_slice(&handles);
        buf[FOOTER_SIZE - 8..].copy_from_slice(&MAGIC.to_le_bytes());
        buf
    }
}
