//! Block decoding and in-block seek.
//!
//! A block body holds prefix-compressed key/value entries followed by a
//! restart-point index:
//!
//! ```text
//! [Entry 1]
//! [Entry 2]
//! ...
//! [Entry N]
//! [Restart Point 1: u32 LE]
//! ...
//! [Restart Point M: u32 LE]
//! [Num Restarts: u32 LE]
//! ```
//!
//! Each entry is three varints `shared`, `unshared`, `value_len` followed
//! by `unshared` bytes of key suffix and `value_len` bytes of value; the
//! full key is the previous key's first `shared` bytes plus the suffix.
//! Every restart point marks an entry with `shared == 0`, which is what
//! makes the restart array binary-searchable.

use std::cmp::Ordering;

use bytes::{Buf, Bytes};

use crate::comparator::Comparator;
use crate::error::{Error, Result};
use crate::varint;

/// An immutable, decoded block body.
#[derive(Debug, Clone)]
pub struct Block {
    data: Bytes,
}

impl Block {
    /// Wraps a decoded block body.
    ///
    /// Structural validation happens lazily: [`seek`](Block::seek) rejects
    /// a missing or zero restart count, and iteration latches a corruption
    /// error on the first malformed entry.
    pub fn new(data: Bytes) -> Self {
        Self { data }
    }

    /// Returns an iterator positioned so that its first `next()` yields the
    /// first entry whose key is >= `target`.
    ///
    /// If no such entry exists the iterator is at end. An empty target
    /// positions at the very first entry.
    pub fn seek(&self, cmp: &dyn Comparator, target: &[u8]) -> Result<BlockIterator> {
        let len = self.data.len();
        if len < 4 {
            return Err(Error::corruption("block too small for restart count"));
        }
        let num_restarts =
            u32::from_le_bytes(self.data[len - 4..].try_into().unwrap()) as usize;
        if num_restarts == 0 {
            return Err(Error::corruption("block has no restart points"));
        }
        let tail = 4 * (num_restarts + 1);
        if tail > len {
            return Err(Error::corruption("restart array overruns block"));
        }
        let entries_end = len - tail;

        let mut offset = 0;
        if !target.is_empty() {
            // Find the smallest restart index whose key is strictly greater
            // than the target. Keys are strictly increasing, so the restart
            // before it (if any) is the rightmost one whose key is <= the
            // target, and the scan below starts there.
            let (mut lo, mut hi) = (0, num_restarts);
            while lo < hi {
                let mid = lo + (hi - lo) / 2;
                if cmp.compare(self.restart_key(mid, entries_end), target) == Ordering::Greater
                {
                    hi = mid;
                } else {
                    lo = mid + 1;
                }
            }
            if lo > 0 {
                offset = self.restart_offset(lo - 1, entries_end);
                if offset > entries_end {
                    return Err(Error::corruption("restart offset out of range"));
                }
            }
        }

        let mut iter = BlockIterator::new(self.data.slice(offset..entries_end));
        while iter.next() && cmp.compare(iter.key(), target) == Ordering::Less {}
        if let Some(err) = iter.err.take() {
            return Err(err);
        }
        // Rewind one step: the caller's first next() must surface the entry
        // the scan stopped on, not the one after it.
        iter.soi = !iter.eoi;
        Ok(iter)
    }

    /// Reads the byte offset stored in restart slot `index`.
    fn restart_offset(&self, index: usize, entries_end: usize) -> usize {
        let at = entries_end + 4 * index;
        u32::from_le_bytes(self.data[at..at + 4].try_into().unwrap()) as usize
    }

    /// Decodes the key at restart slot `index`.
    ///
    /// Restart entries carry their whole key (`shared == 0`). Malformed
    /// slots yield an empty key here; the linear scan reports the
    /// corruption instead, keeping the search predicate infallible.
    fn restart_key(&self, index: usize, entries_end: usize) -> &[u8] {
        let offset = self.restart_offset(index, entries_end);
        let entry = match self.data.get(offset..entries_end) {
            Some(entry) => entry,
            None => return &[],
        };
        let Some((_, n0)) = varint::decode(entry) else { return &[] };
        let Some((unshared, n1)) = varint::decode(&entry[n0..]) else { return &[] };
        let Some((_, n2)) = varint::decode(&entry[n0 + n1..]) else { return &[] };
        let start = n0 + n1 + n2;
        let Ok(unshared) = usize::try_from(unshared) else { return &[] };
        entry.get(start..start.saturating_add(unshared)).unwrap_or(&[])
    }
}

/// An iterator over a single block's entries.
///
/// The current key lives in a buffer owned by the iterator and is rebuilt
/// in place on every step; the returned slice is only valid until the next
/// call to [`next`](BlockIterator::next). Values are shared sub-slices of
/// the block body.
#[derive(Debug)]
pub struct BlockIterator {
    /// Unconsumed entry bytes.
    data: Bytes,
    /// Reassembled key of the current entry.
    key: Vec<u8>,
    /// Value of the current entry.
    value: Bytes,
    err: Option<Error>,
    /// Start-of-iteration: the current entry is already decoded and the
    /// next `next()` surfaces it without consuming input. Never true
    /// together with `eoi`.
    soi: bool,
    /// End-of-iteration.
    eoi: bool,
}

impl BlockIterator {
    fn new(data: Bytes) -> Self {
        Self {
            data,
            key: Vec::new(),
            value: Bytes::new(),
            err: None,
            soi: false,
            eoi: false,
        }
    }

    /// An iterator that is already at end.
    pub(crate) fn exhausted() -> Self {
        let mut iter = Self::new(Bytes::new());
        iter.eoi = true;
        iter
    }

    /// Advances to the next entry. Returns false at end or after an error.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        if self.eoi || self.err.is_some() {
            return false;
        }
        if self.soi {
            self.soi = false;
            return true;
        }
        if self.data.is_empty() {
            self.stop();
            return false;
        }
        self.decode_entry()
    }

    fn decode_entry(&mut self) -> bool {
        let Some((shared, n0)) = varint::decode(&self.data) else {
            return self.corrupt("bad entry header");
        };
        let Some((unshared, n1)) = varint::decode(&self.data[n0..]) else {
            return self.corrupt("bad entry header");
        };
        let Some((value_len, n2)) = varint::decode(&self.data[n0 + n1..]) else {
            return self.corrupt("bad entry header");
        };
        let header = n0 + n1 + n2;

        if shared > self.key.len() as u64 {
            return self.corrupt("shared key prefix exceeds current key");
        }
        let end = (header as u64)
            .checked_add(unshared)
            .and_then(|n| n.checked_add(value_len));
        let end = match end {
            Some(end) if end <= self.data.len() as u64 => end as usize,
            _ => return self.corrupt("entry overruns block"),
        };

        let (shared, unshared) = (shared as usize, unshared as usize);
        let suffix_end = header + unshared;
        self.key.truncate(shared);
        self.key.extend_from_slice(&self.data[header..suffix_end]);
        self.value = self.data.slice(suffix_end..end);
        self.data.advance(end);
        true
    }

    /// Returns the current entry's key, or an empty slice when the
    /// iterator is not positioned on an entry.
    pub fn key(&self) -> &[u8] {
        if self.valid() {
            &self.key
        } else {
            &[]
        }
    }

    /// Returns the current entry's value, or an empty slice when the
    /// iterator is not positioned on an entry.
    pub fn value(&self) -> &[u8] {
        if self.valid() {
            &self.value
        } else {
            &[]
        }
    }

    /// Returns true while the iterator is positioned on an entry.
    pub fn valid(&self) -> bool {
        !self.soi && !self.eoi && self.err.is_none()
    }

    /// Releases the iterator's buffers and reports any latched error.
    pub fn close(&mut self) -> Result<()> {
        self.data = Bytes::new();
        self.key = Vec::new();
        self.value = Bytes::new();
        self.soi = false;
        self.eoi = true;
        match self.err.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub(crate) fn take_err(&mut self) -> Option<Error> {
        self.err.take()
    }

    fn corrupt(&mut self, msg: &str) -> bool {
        self.err = Some(Error::corruption(msg));
        false
    }

    fn stop(&mut self) {
        self.soi = false;
        self.eoi = true;
        self.key.clear();
        self.value = Bytes::new();
    }
}
