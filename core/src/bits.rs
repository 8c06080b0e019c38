//! Text <-> bit stream conversion
//!
//! Each character becomes one byte (its code point), sent most significant
//! bit first. A bit stream is a `Vec<u8>` holding 0/1 values.

use crate::error::{AudioModemError, Result};

pub const BITS_PER_CHAR: usize = 8;

/// Expand text into 8 bits per character, MSB first.
///
/// Code points above 255 cannot be carried and fail with
/// [`AudioModemError::Encoding`] instead of being truncated.
pub fn encode(text: &str) -> Result<Vec<u8>> {
    let mut bits = Vec::with_capacity(text.len() * BITS_PER_CHAR);

    for (index, ch) in text.chars().enumerate() {
        let code = u32::from(ch);
        if code > 0xFF {
            return Err(AudioModemError::Encoding { index, ch });
        }
        for shift in (0..BITS_PER_CHAR).rev() {
            bits.push(((code >> shift) & 1) as u8);
        }
    }

    Ok(bits)
}

/// Pack groups of 8 bits back into characters.
///
/// Any nonzero entry is read as a one. A trailing partial group is an error
/// ([`AudioModemError::MalformedBitstream`]); nothing is returned for it.
pub fn decode(bits: &[u8]) -> Result<String> {
    if bits.len() % BITS_PER_CHAR != 0 {
        return Err(AudioModemError::MalformedBitstream { len: bits.len() });
    }

    Ok(bits
        .chunks(BITS_PER_CHAR)
        .map(|group| {
            let byte = group
                .iter()
                .fold(0u8, |acc, &bit| (acc << 1) | u8::from(bit != 0));
            char::from(byte)
        })
        .collect())
}

/// Render bits as a string of '0' and '1'
pub fn format_bits(bits: &[u8]) -> String {
    bits.iter()
        .map(|&bit| if bit == 0 { '0' } else { '1' })
        .collect()
}

/// Parse a string of '0' and '1'; surrounding whitespace is ignored.
pub fn parse_bits(text: &str) -> Result<Vec<u8>> {
    text.trim()
        .chars()
        .enumerate()
        .map(|(index, symbol)| match symbol {
            '0' => Ok(0),
            '1' => Ok(1),
            _ => Err(AudioModemError::InvalidBitSymbol { index, symbol }),
        })
        .collect()
}
