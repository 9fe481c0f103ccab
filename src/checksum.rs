//! Masked CRC-32C block checksums.
//!
//! Block trailers store a CRC-32C (Castagnoli) of the block body plus its
//! compression-type byte. The raw CRC is never stored directly: a fixed
//! rotate-and-add transform is applied first, so that checksumming a buffer
//! that itself contains checksums does not degenerate.

/// The constant added after rotation when masking a CRC.
const MASK_DELTA: u32 = 0xa282_ead8;

/// Computes the masked CRC-32C of `data`, as stored in block trailers.
pub fn masked_crc32c(data: &[u8]) -> u32 {
    mask(crc32c::crc32c(data))
}

/// Applies the storage mask to a raw CRC-32C value.
pub fn mask(crc: u32) -> u32 {
    ((crc >> 15) | (crc << 17)).wrapping_add(MASK_DELTA)
}
