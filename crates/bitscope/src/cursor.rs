//! Bit-addressable read cursor over a queue of byte chunks.
//!
//! The cursor never requires its input to be concatenated up front: chunks are
//! queued as [Bytes] and read through in order. Byte-aligned reads (no pending
//! leftover bits) take a fast path that slices chunks directly; everything else
//! goes through a small MSB-first bit accumulator.

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};

use crate::{
    bits::{expand_bytes, fold_be, low_mask, push_bits},
    errors::ReadError,
};

/// Sequential read access to a bit stream.
///
/// Implemented by the root [BitCursor] and by [crate::scoped::ScopedCursor],
/// which bounds reads to a fixed bit budget. Decoders only ever see this trait.
pub trait BitSource {
    /// Reads the next `n` bits (at most 64) as an unsigned integer, MSB-first.
    fn read_bits(&mut self, n: u32) -> Result<u64, ReadError>;

    /// Reads the next `n` whole bytes.
    fn read_bytes(&mut self, n: usize) -> Result<Bytes, ReadError>;

    /// Reads the next `n` bits as a sequence of `0`/`1` values.
    fn read_bit_sequence(&mut self, n: u64) -> Result<Vec<u8>, ReadError>;

    /// Reads every remaining byte. Fails if the remaining bit count is not a multiple of 8.
    fn read_to_end(&mut self) -> Result<Bytes, ReadError>;

    /// Reads every remaining bit.
    fn read_bits_to_end(&mut self) -> Result<Vec<u8>, ReadError>;

    /// Discards the next `n` bits.
    fn skip_bits(&mut self, n: u64) -> Result<(), ReadError>;

    /// Number of bits that can still be read.
    fn total_bits_left(&self) -> u64;

    fn is_end_reached(&self) -> bool {
        self.total_bits_left() == 0
    }
}

/// A byte-bearing input accepted by [BitCursor::append].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk(Bytes);

impl Chunk {
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl From<Bytes> for Chunk {
    fn from(value: Bytes) -> Self {
        Chunk(value)
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(value: Vec<u8>) -> Self {
        Chunk(Bytes::from(value))
    }
}

impl From<&[u8]> for Chunk {
    fn from(value: &[u8]) -> Self {
        Chunk(Bytes::copy_from_slice(value))
    }
}

impl<const N: usize> From<[u8; N]> for Chunk {
    fn from(value: [u8; N]) -> Self {
        Chunk(Bytes::copy_from_slice(&value))
    }
}

impl<const N: usize> From<&[u8; N]> for Chunk {
    fn from(value: &[u8; N]) -> Self {
        Chunk(Bytes::copy_from_slice(value))
    }
}

impl From<u8> for Chunk {
    fn from(value: u8) -> Self {
        Chunk(Bytes::copy_from_slice(&[value]))
    }
}

impl From<bool> for Chunk {
    fn from(value: bool) -> Self {
        Chunk::from(value as u8)
    }
}

impl From<String> for Chunk {
    fn from(value: String) -> Self {
        Chunk(Bytes::from(value))
    }
}

impl From<&str> for Chunk {
    fn from(value: &str) -> Self {
        Chunk(Bytes::copy_from_slice(value.as_bytes()))
    }
}

/// Root cursor owning the chunk queue.
#[derive(Debug, Clone, Default)]
pub struct BitCursor {
    current: Bytes,
    offset: usize,
    pending: VecDeque<Bytes>,
    /// Unread bytes in `current` and `pending` combined.
    bytes_left: u64,
    /// Leftover bits, right-aligned; only the low `cache_len` bits are meaningful.
    cache: u128,
    cache_len: u32,
}

impl BitCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cursor over a single chunk.
    pub fn from_bytes(chunk: impl Into<Chunk>) -> Self {
        let mut cursor = Self::new();
        cursor.append(chunk);
        cursor
    }

    /// Enqueues a chunk after all previously appended data. Empty chunks are ignored.
    pub fn append(&mut self, chunk: impl Into<Chunk>) {
        let Chunk(bytes) = chunk.into();
        if bytes.is_empty() {
            return;
        }

        self.bytes_left += bytes.len() as u64;
        self.pending.push_back(bytes);
    }

    pub fn extend<I, C>(&mut self, chunks: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<Chunk>,
    {
        for chunk in chunks {
            self.append(chunk);
        }
    }

    /// Number of leftover bits from a previous partial-byte read.
    pub fn pending_bits(&self) -> u32 {
        self.cache_len
    }

    fn ensure(&self, requested: u64) -> Result<(), ReadError> {
        let available = self.total_bits_left();
        if requested > available {
            return Err(ReadError::StreamExhausted {
                requested,
                available,
            });
        }

        Ok(())
    }

    fn advance_chunk(&mut self) {
        while self.offset >= self.current.len() {
            match self.pending.pop_front() {
                Some(next) => {
                    self.current = next;
                    self.offset = 0;
                }
                None => break,
            }
        }
    }

    /// Byte-aligned read straight out of the chunks. Callers check availability
    /// and that the accumulator is empty.
    fn take_bytes(&mut self, n: usize) -> Bytes {
        if n == 0 {
            return Bytes::new();
        }

        self.advance_chunk();
        if n <= self.current.len() - self.offset {
            let out = self.current.slice(self.offset..self.offset + n);
            self.offset += n;
            self.bytes_left -= n as u64;
            return out;
        }

        let mut out = BytesMut::with_capacity(n);
        let mut remaining = n;
        while remaining > 0 {
            self.advance_chunk();
            let take = remaining.min(self.current.len() - self.offset);
            out.extend_from_slice(&self.current[self.offset..self.offset + take]);
            self.offset += take;
            remaining -= take;
        }
        self.bytes_left -= n as u64;

        out.freeze()
    }

    fn skip_whole_bytes(&mut self, mut n: u64) {
        while n > 0 {
            self.advance_chunk();
            let step = n.min((self.current.len() - self.offset) as u64);
            self.offset += step as usize;
            self.bytes_left -= step;
            n -= step;
        }
    }

    fn fill_cache(&mut self) {
        self.advance_chunk();
        let byte = self.current[self.offset];
        self.offset += 1;
        self.bytes_left -= 1;

        self.cache = (self.cache << 8) | byte as u128;
        self.cache_len += 8;
    }

    /// Removes the top `n` bits from the accumulator (`n <= cache_len`).
    fn take_cached(&mut self, n: u32) -> u128 {
        let shift = self.cache_len - n;
        let value = (self.cache >> shift) & low_mask(n);

        self.cache_len = shift;
        self.cache &= low_mask(self.cache_len);

        value
    }

    fn read_cached(&mut self, n: u32) -> u128 {
        while self.cache_len < n {
            self.fill_cache();
        }

        self.take_cached(n)
    }
}

impl<C: Into<Chunk>> FromIterator<C> for BitCursor {
    fn from_iter<T: IntoIterator<Item = C>>(iter: T) -> Self {
        let mut cursor = BitCursor::new();
        cursor.extend(iter);
        cursor
    }
}

impl BitSource for BitCursor {
    fn read_bits(&mut self, n: u32) -> Result<u64, ReadError> {
        if n > 64 {
            return Err(ReadError::TooManyBits(n));
        }
        self.ensure(n as u64)?;

        if self.cache_len == 0 && n % 8 == 0 {
            let bytes = self.take_bytes(n as usize / 8);
            return Ok(fold_be(&bytes));
        }

        Ok(self.read_cached(n) as u64)
    }

    fn read_bytes(&mut self, n: usize) -> Result<Bytes, ReadError> {
        self.ensure((n as u64).saturating_mul(8))?;

        if self.cache_len == 0 {
            return Ok(self.take_bytes(n));
        }

        let mut out = BytesMut::with_capacity(n);
        for _ in 0..n {
            out.extend_from_slice(&[self.read_cached(8) as u8]);
        }

        Ok(out.freeze())
    }

    fn read_bit_sequence(&mut self, n: u64) -> Result<Vec<u8>, ReadError> {
        self.ensure(n)?;

        let mut out = Vec::with_capacity(n as usize);
        if self.cache_len == 0 && n % 8 == 0 {
            let bytes = self.take_bytes((n / 8) as usize);
            expand_bytes(&mut out, &bytes);
            return Ok(out);
        }

        let from_cache = n.min(self.cache_len as u64) as u32;
        let head = self.take_cached(from_cache);
        push_bits(&mut out, head, from_cache);

        let remaining = n - from_cache as u64;
        if remaining > 0 {
            let bytes = self.take_bytes((remaining / 8) as usize);
            expand_bytes(&mut out, &bytes);

            let tail = (remaining % 8) as u32;
            if tail > 0 {
                let value = self.read_cached(tail);
                push_bits(&mut out, value, tail);
            }
        }

        Ok(out)
    }

    fn read_to_end(&mut self) -> Result<Bytes, ReadError> {
        if self.cache_len == 0 {
            let n = self.bytes_left as usize;
            let out = self.take_bytes(n);
            self.pending.clear();
            return Ok(out);
        }

        let available = self.total_bits_left();
        if available % 8 != 0 {
            return Err(ReadError::StreamExhausted {
                requested: available.next_multiple_of(8),
                available,
            });
        }

        self.read_bytes((available / 8) as usize)
    }

    fn read_bits_to_end(&mut self) -> Result<Vec<u8>, ReadError> {
        self.read_bit_sequence(self.total_bits_left())
    }

    fn skip_bits(&mut self, n: u64) -> Result<(), ReadError> {
        self.ensure(n)?;

        let from_cache = n.min(self.cache_len as u64) as u32;
        self.take_cached(from_cache);

        let remaining = n - from_cache as u64;
        if remaining > 0 {
            self.skip_whole_bytes(remaining / 8);

            let tail = (remaining % 8) as u32;
            if tail > 0 {
                self.read_cached(tail);
            }
        }

        Ok(())
    }

    fn total_bits_left(&self) -> u64 {
        self.cache_len as u64 + self.bytes_left * 8
    }
}
