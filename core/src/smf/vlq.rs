//! Variable-length quantities: 7 bits per byte, most significant group first,
//! with the top bit of every byte but the last set.

use super::{Result, SmfError};

pub const MAX_BYTES: usize = 4;

/// Largest value that fits in four 7-bit groups
pub const MAX_QUANTITY: u32 = 0x0FFF_FFFF;

const CONTINUATION: u8 = 0b1000_0000;
const VALUE_MASK: u8 = 0b0111_1111;

/// Decodes the quantity starting at `offset`, returning its value and how many bytes it spans.
pub fn decode(data: &[u8], offset: usize) -> Result<(u32, usize)> {
  let mut value = 0u32;
  for length in 1..=MAX_BYTES {
    let pos = offset + length - 1;
    let byte = *data.get(pos).ok_or_else(|| SmfError::BufferOverrun {
      offset,
      required: length,
      available: data.len().saturating_sub(offset),
    })?;
    value = (value << 7) | u32::from(byte & VALUE_MASK);
    if byte & CONTINUATION == 0 {
      return Ok((value, length));
    }
  }
  Err(SmfError::UnterminatedQuantity { offset })
}

/// Number of bytes `encode` produces for `value`.
pub fn encoded_len(value: u32) -> usize {
  match value {
    0..=0x7F => 1,
    0x80..=0x3FFF => 2,
    0x4000..=0x1F_FFFF => 3,
    _ => 4,
  }
}

pub fn encode(value: u32) -> Result<Vec<u8>> {
  if value > MAX_QUANTITY {
    return Err(SmfError::QuantityOverflow { value });
  }
  let length = encoded_len(value);
  let bytes = (0..length)
    .rev()
    .map(|group| {
      let bits = ((value >> (7 * group)) as u8) & VALUE_MASK;
      if group > 0 {
        bits | CONTINUATION
      } else {
        bits
      }
    })
    .collect();
  Ok(bytes)
}
