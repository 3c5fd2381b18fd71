//! Length-scoped view over another [BitSource].

use bytes::Bytes;
use log::trace;

use crate::{cursor::BitSource, errors::ReadError};

/// Bounds reads from a parent cursor to exactly `bit_limit` bits.
///
/// Used while decoding a record with a declared bit length. Reads past the
/// budget fail with [ReadError::StreamExhausted] even if the parent has more
/// data. Call [ScopedCursor::skip_to_end] once the record is decoded so the
/// parent always advances by the full budget.
pub struct ScopedCursor<'a> {
    parent: &'a mut dyn BitSource,
    bit_limit: u64,
    bits_read: u64,
}

impl<'a> ScopedCursor<'a> {
    pub fn new(parent: &'a mut dyn BitSource, bit_limit: u64) -> Self {
        ScopedCursor {
            parent,
            bit_limit,
            bits_read: 0,
        }
    }

    pub fn bit_limit(&self) -> u64 {
        self.bit_limit
    }

    pub fn bits_read(&self) -> u64 {
        self.bits_read
    }

    /// Bits left in the budget, regardless of what the parent holds.
    pub fn limited_bits_left(&self) -> u64 {
        self.bit_limit - self.bits_read
    }

    fn ends_with_parent(&self) -> bool {
        self.limited_bits_left() == self.parent.total_bits_left()
    }

    fn reserve(&self, requested: u64) -> Result<(), ReadError> {
        let available = self.limited_bits_left();
        if requested > available {
            return Err(ReadError::StreamExhausted {
                requested,
                available,
            });
        }

        Ok(())
    }

    /// Consumes whatever is left of the budget from the parent.
    pub fn skip_to_end(&mut self) -> Result<(), ReadError> {
        let left = self.limited_bits_left();
        if left == 0 {
            return Ok(());
        }

        trace!("skipping {left} unread bits of a {}-bit scope", self.bit_limit);
        self.parent.skip_bits(left)?;
        self.bits_read = self.bit_limit;

        Ok(())
    }
}

impl BitSource for ScopedCursor<'_> {
    fn read_bits(&mut self, n: u32) -> Result<u64, ReadError> {
        self.reserve(n as u64)?;
        let value = self.parent.read_bits(n)?;
        self.bits_read += n as u64;

        Ok(value)
    }

    fn read_bytes(&mut self, n: usize) -> Result<Bytes, ReadError> {
        self.reserve((n as u64).saturating_mul(8))?;
        let bytes = self.parent.read_bytes(n)?;
        self.bits_read += n as u64 * 8;

        Ok(bytes)
    }

    fn read_bit_sequence(&mut self, n: u64) -> Result<Vec<u8>, ReadError> {
        self.reserve(n)?;
        let bits = self.parent.read_bit_sequence(n)?;
        self.bits_read += n;

        Ok(bits)
    }

    fn read_to_end(&mut self) -> Result<Bytes, ReadError> {
        let bytes = if self.ends_with_parent() {
            self.parent.read_to_end()?
        } else {
            let left = self.limited_bits_left();
            if left % 8 != 0 {
                return Err(ReadError::StreamExhausted {
                    requested: left.next_multiple_of(8),
                    available: left,
                });
            }

            self.parent.read_bytes((left / 8) as usize)?
        };
        self.bits_read += bytes.len() as u64 * 8;

        Ok(bytes)
    }

    fn read_bits_to_end(&mut self) -> Result<Vec<u8>, ReadError> {
        let bits = if self.ends_with_parent() {
            self.parent.read_bits_to_end()?
        } else {
            self.parent.read_bit_sequence(self.limited_bits_left())?
        };
        self.bits_read += bits.len() as u64;

        Ok(bits)
    }

    fn skip_bits(&mut self, n: u64) -> Result<(), ReadError> {
        self.reserve(n)?;
        self.parent.skip_bits(n)?;
        self.bits_read += n;

        Ok(())
    }

    fn total_bits_left(&self) -> u64 {
        self.limited_bits_left().min(self.parent.total_bits_left())
    }

    fn is_end_reached(&self) -> bool {
        self.limited_bits_left() == 0 || self.parent.is_end_reached()
    }
}
