//! SQLite style variable length integers.
//!
//! Big-endian base-128: each of the first eight bytes contributes its low
//! seven bits and uses the high bit as a continuation flag. A ninth byte, if
//! reached, contributes all eight bits.

use crate::types::{
    MAX_VARINT_SIZE,
    error::{DatabaseError, Result},
};

const CONTINUATION_BIT: u8 = 0x80;
const PAYLOAD_MASK: u8 = 0x7F;

/// Decode one varint starting at `offset`.
///
/// Returns the value and the number of bytes consumed (1..=9). A buffer
/// that ends before the terminating byte yields
/// [`DatabaseError::TruncatedVarint`].
pub fn decode_varint(buffer: &[u8], offset: usize) -> Result<(u64, usize)> {
    let mut value = 0_u64;
    for i in 0..MAX_VARINT_SIZE {
        let byte = *buffer
            .get(offset + i)
            .ok_or(DatabaseError::TruncatedVarint { offset })?;
        if i == MAX_VARINT_SIZE - 1 {
            value = (value << 8) | byte as u64;
            return Ok((value, MAX_VARINT_SIZE));
        }
        value = (value << 7) | (byte & PAYLOAD_MASK) as u64;
        if byte & CONTINUATION_BIT == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(DatabaseError::TruncatedVarint { offset })
}

/// Encode `value` using the shortest representation.
pub fn encode_varint(value: u64) -> Vec<u8> {
    // values that need more than 56 bits take the 9 byte form
    if value > 0x00FF_FFFF_FFFF_FFFF {
        let mut bytes = [0_u8; MAX_VARINT_SIZE];
        bytes[8] = value as u8;
        let mut rest = value >> 8;
        for byte in bytes[..8].iter_mut().rev() {
            *byte = (rest as u8 & PAYLOAD_MASK) | CONTINUATION_BIT;
            rest >>= 7;
        }
        return bytes.to_vec();
    }

    let mut groups = Vec::with_capacity(MAX_VARINT_SIZE);
    let mut rest = value;
    loop {
        groups.push(rest as u8 & PAYLOAD_MASK);
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    groups.reverse();
    let last = groups.len() - 1;
    for byte in &mut groups[..last] {
        *byte |= CONTINUATION_BIT;
    }
    groups
}

/// Number of bytes [`encode_varint`] produces for `value`.
pub fn varint_len(value: u64) -> usize {
    if value > 0x00FF_FFFF_FFFF_FFFF {
        return MAX_VARINT_SIZE;
    }
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}
