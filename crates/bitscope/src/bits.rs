//! Low-level bit manipulation helpers shared by the cursors and decoders.
//!
//! Bits are always handled in MSB-first order: the first bit of the stream is
//! the high bit of the first byte.

/// Mask with the low `len` bits set (`len` up to 128).
pub(crate) fn low_mask(len: u32) -> u128 {
    if len >= 128 {
        u128::MAX
    } else {
        (1u128 << len) - 1
    }
}

/// Appends the low `len` bits of `value` to `out`, one `0`/`1` entry per bit, MSB-first.
pub(crate) fn push_bits(out: &mut Vec<u8>, value: u128, len: u32) {
    for i in (0..len).rev() {
        out.push(((value >> i) & 1) as u8);
    }
}

/// Expands bytes into one `0`/`1` entry per bit, MSB-first.
pub(crate) fn expand_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    out.reserve(bytes.len() * 8);
    for &byte in bytes {
        push_bits(out, byte as u128, 8);
    }
}

/// Interprets up to 8 bytes as a big-endian unsigned integer.
pub(crate) fn fold_be(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |acc, &byte| (acc << 8) | byte as u64)
}

/// Packs a bit sequence (one `0`/`1` entry per bit, MSB-first) into bytes.
/// A trailing partial byte is padded with zero bits.
pub fn bits_to_bytes(bits: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; bits.len().div_ceil(8)];

    for (i, &bit) in bits.iter().enumerate() {
        out[i / 8] |= (bit & 1) << (7 - (i % 8));
    }

    out
}
