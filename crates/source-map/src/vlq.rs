//! Base64 VLQ encoding of source map mappings.
//!
//! Each value is split into 5-bit digits, least significant first. The sixth
//! bit of a digit flags continuation and the sign lives in the lowest bit of
//! the first digit. Digits are written with the alphabet `A-Z a-z 0-9 + /`.

use crate::Mapping;
use thiserror::Error;

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const CONTINUATION: u32 = 0b10_0000;
const DIGIT_MASK: u32 = 0b01_1111;

/// An error decoding a `mappings` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A character outside the base64 alphabet.
    #[error("invalid base64 character {0:?} in mappings")]
    InvalidCharacter(char),
    /// A value ended while its continuation bit was set.
    #[error("truncated VLQ value in mappings")]
    Truncated,
    /// A segment that is not 1, 4 or 5 fields long.
    #[error("segment with {0} fields in mappings")]
    InvalidSegment(usize),
    /// A value that leaves the valid range once deltas are applied.
    #[error("mapping value out of range")]
    OutOfRange,
}

/// Appends the VLQ encoding of `value` to `out`.
pub fn encode_value(value: i64, out: &mut String) {
    let mut rest = if value < 0 {
        ((value.unsigned_abs()) << 1) | 1
    } else {
        (value as u64) << 1
    };

    loop {
        let mut digit = (rest & DIGIT_MASK as u64) as u32;
        rest >>= 5;
        if rest > 0 {
            digit |= CONTINUATION;
        }
        out.push(ALPHABET[digit as usize] as char);
        if rest == 0 {
            break;
        }
    }
}

/// Decodes one VLQ value from the front of `chars`.
pub fn decode_value(chars: &mut impl Iterator<Item = char>) -> Result<i64, DecodeError> {
    let mut result: u64 = 0;
    let mut shift = 0u32;

    loop {
        let ch = chars.next().ok_or(DecodeError::Truncated)?;
        let digit = digit_value(ch).ok_or(DecodeError::InvalidCharacter(ch))?;
        if shift > 60 {
            return Err(DecodeError::OutOfRange);
        }
        result |= ((digit & DIGIT_MASK) as u64) << shift;
        shift += 5;
        if digit & CONTINUATION == 0 {
            break;
        }
    }

    let magnitude = (result >> 1) as i64;
    Ok(if result & 1 == 1 { -magnitude } else { magnitude })
}

fn digit_value(ch: char) -> Option<u32> {
    match ch {
        'A'..='Z' => Some(ch as u32 - 'A' as u32),
        'a'..='z' => Some(ch as u32 - 'a' as u32 + 26),
        '0'..='9' => Some(ch as u32 - '0' as u32 + 52),
        '+' => Some(62),
        '/' => Some(63),
        _ => None,
    }
}

/// Encodes mappings (sorted by generated position) as a `mappings` string.
///
/// Lines are separated by `;` and segments by `,`. The generated column is
/// relative to the previous segment on the same line; source index, source
/// line, source column and name index are relative to the previous segment
/// anywhere in the file. Lines without mappings are empty.
pub fn encode_mappings(mappings: &[Mapping]) -> String {
    let mut out = String::new();
    let mut line = 1u32;
    let mut previous_column = 0i64;
    let mut previous_source = 0i64;
    let mut previous_source_line = 0i64;
    let mut previous_source_column = 0i64;
    let mut previous_name = 0i64;
    let mut first_in_line = true;

    for mapping in mappings {
        while line < mapping.generated_line {
            out.push(';');
            line += 1;
            previous_column = 0;
            first_in_line = true;
        }
        if !first_in_line {
            out.push(',');
        }
        first_in_line = false;

        let column = i64::from(mapping.generated_column) - 1;
        let source = i64::from(mapping.source_index);
        let source_line = i64::from(mapping.source_line) - 1;
        let source_column = i64::from(mapping.source_column) - 1;

        encode_value(column - previous_column, &mut out);
        encode_value(source - previous_source, &mut out);
        encode_value(source_line - previous_source_line, &mut out);
        encode_value(source_column - previous_source_column, &mut out);
        if let Some(name) = mapping.name_index {
            let name = i64::from(name);
            encode_value(name - previous_name, &mut out);
            previous_name = name;
        }

        previous_column = column;
        previous_source = source;
        previous_source_line = source_line;
        previous_source_column = source_column;
    }

    out
}

/// Decodes a `mappings` string into mappings.
///
/// Segments with a single field (generated column only) carry no source
/// position and are skipped.
pub fn decode_mappings(encoded: &str) -> Result<Vec<Mapping>, DecodeError> {
    let mut mappings = Vec::new();
    let mut previous_source = 0i64;
    let mut previous_source_line = 0i64;
    let mut previous_source_column = 0i64;
    let mut previous_name = 0i64;

    for (line_idx, line) in encoded.split(';').enumerate() {
        let mut previous_column = 0i64;
        for segment in line.split(',').filter(|s| !s.is_empty()) {
            let mut chars = segment.chars().peekable();
            let mut fields = Vec::with_capacity(5);
            while chars.peek().is_some() {
                fields.push(decode_value(&mut chars)?);
            }

            match fields.len() {
                1 => {
                    previous_column += fields[0];
                    continue;
                }
                4 | 5 => {}
                n => return Err(DecodeError::InvalidSegment(n)),
            }

            previous_column += fields[0];
            previous_source += fields[1];
            previous_source_line += fields[2];
            previous_source_column += fields[3];
            let name_index = if fields.len() == 5 {
                previous_name += fields[4];
                Some(to_u32(previous_name)?)
            } else {
                None
            };

            mappings.push(Mapping {
                generated_line: line_idx as u32 + 1,
                generated_column: to_u32(previous_column + 1)?,
                source_line: to_u32(previous_source_line + 1)?,
                source_column: to_u32(previous_source_column + 1)?,
                source_index: to_u32(previous_source)?,
                name_index,
            });
        }
    }

    Ok(mappings)
}

fn to_u32(value: i64) -> Result<u32, DecodeError> {
    u32::try_from(value).map_err(|_| DecodeError::OutOfRange)
}
