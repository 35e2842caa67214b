/*
 * This file is part of smctemp.
 *
 * Copyright (C) 2025 smctemp contributors
 *
 * smctemp is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * smctemp is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with smctemp. If not, see <https://www.gnu.org/licenses/>.
 */

//! Key codes, type tags and the raw value decoder
//!
//! The controller names every value with four ASCII characters packed
//! big-endian into a `u32`, and declares the encoding of the value bytes with
//! a type tag packed the same way.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::constants::{data_type, wire::MAX_DATA_BYTES};
use crate::error::SmcError;

/// Pack four characters into a key code, first character in the high byte.
pub const fn pack_key(chars: [u8; 4]) -> u32 {
    u32::from_be_bytes(chars)
}

/// Inverse of [`pack_key`].
pub const fn unpack_key(code: u32) -> [u8; 4] {
    code.to_be_bytes()
}

/// A packed four-character SMC key such as `TC0D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyCode(u32);

impl KeyCode {
    pub const fn new(chars: [u8; 4]) -> Self {
        KeyCode(pack_key(chars))
    }

    pub const fn from_raw(code: u32) -> Self {
        KeyCode(code)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn chars(self) -> [u8; 4] {
        unpack_key(self.0)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_four_cc(f, self.chars())
    }
}

impl FromStr for KeyCode {
    type Err = SmcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 4 || !bytes.iter().all(|b| b.is_ascii() && !b.is_ascii_control()) {
            return Err(SmcError::InvalidKey(s.to_string()));
        }
        Ok(KeyCode::new([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

impl TryFrom<&str> for KeyCode {
    type Error = SmcError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Type tag of a key, e.g. `sp78` or `flt `.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataType(u32);

impl DataType {
    pub const fn new(chars: [u8; 4]) -> Self {
        DataType(pack_key(chars))
    }

    pub const fn from_raw(code: u32) -> Self {
        DataType(code)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn chars(self) -> [u8; 4] {
        unpack_key(self.0)
    }

    /// Byte width the encoding requires, or `None` if the tag is not decodable
    /// to a number.
    pub fn width(self) -> Option<usize> {
        match self.chars() {
            data_type::UI8 | data_type::SI8 => Some(1),
            data_type::UI16 | data_type::SI16 => Some(2),
            data_type::FPE2 | data_type::FP78 | data_type::SP78 => Some(2),
            data_type::UI32 | data_type::SI32 | data_type::FLT => Some(4),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_four_cc(f, self.chars())
    }
}

fn write_four_cc(f: &mut fmt::Formatter<'_>, chars: [u8; 4]) -> fmt::Result {
    for b in chars {
        let c = if b.is_ascii() && !b.is_ascii_control() { b as char } else { '?' };
        write!(f, "{}", c)?;
    }
    Ok(())
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unsupported data type '{0}'")]
    UnsupportedType(DataType),
    #[error("data type '{data_type}' needs {expected} bytes, got {actual}")]
    Length {
        data_type: DataType,
        expected: usize,
        actual: usize,
    },
}

/// Decode the first `length` bytes of `bytes` according to `data_type`.
///
/// Bytes past `length` are never looked at. Integer types are read
/// big-endian without scaling; the fixed point types divide by their
/// fractional scale.
pub fn decode(bytes: &[u8], length: usize, data_type: DataType) -> Result<f64, DecodeError> {
    let width = data_type
        .width()
        .ok_or(DecodeError::UnsupportedType(data_type))?;
    if length != width || length > MAX_DATA_BYTES || length > bytes.len() {
        return Err(DecodeError::Length {
            data_type,
            expected: width,
            actual: length.min(bytes.len()),
        });
    }
    let b = &bytes[..length];

    let value = match data_type.chars() {
        data_type::UI8 => f64::from(b[0]),
        data_type::SI8 => f64::from(b[0] as i8),
        data_type::UI16 => f64::from(u16::from_be_bytes([b[0], b[1]])),
        data_type::SI16 => f64::from(i16::from_be_bytes([b[0], b[1]])),
        data_type::UI32 => f64::from(u32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        data_type::SI32 => f64::from(i32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        // big-endian like every other tag; arm64 firmware has been seen
        // storing flt little-endian
        data_type::FLT => f64::from(f32::from_be_bytes([b[0], b[1], b[2], b[3]])),
        // 14 integer bits, 2 fractional bits
        data_type::FPE2 => f64::from(u16::from_be_bytes([b[0], b[1]])) / 4.0,
        // sign bit, 7 integer bits, 8 fractional bits
        data_type::SP78 => f64::from(i16::from_be_bytes([b[0], b[1]])) / 256.0,
        data_type::FP78 => f64::from(u16::from_be_bytes([b[0], b[1]])) / 256.0,
        _ => return Err(DecodeError::UnsupportedType(data_type)),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &[u8; 4]) -> DataType {
        DataType::new(*s)
    }

    #[test]
    fn test_decode_sp78() {
        assert_eq!(decode(&[0x19, 0x00], 2, tag(b"sp78")).unwrap(), 25.0);
        assert_eq!(decode(&[0x2d, 0x80], 2, tag(b"sp78")).unwrap(), 45.5);
        assert_eq!(decode(&[0xff, 0x00], 2, tag(b"sp78")).unwrap(), -1.0);
    }

    #[test]
    fn test_decode_unsigned_fixed_point() {
        assert_eq!(decode(&[0xff, 0x00], 2, tag(b"fp78")).unwrap(), 255.0);
        assert_eq!(decode(&[0x00, 0x80], 2, tag(b"fp78")).unwrap(), 0.5);
        assert_eq!(decode(&[0x01, 0x92], 2, tag(b"fpe2")).unwrap(), 100.5);
    }

    #[test]
    fn test_decode_flt() {
        assert_eq!(decode(&[0, 0, 0, 0], 4, tag(b"flt ")).unwrap(), 0.0);
        assert_eq!(decode(&[0x42, 0x28, 0x00, 0x00], 4, tag(b"flt ")).unwrap(), 42.0);
    }

    #[test]
    fn test_decode_integers() {
        assert_eq!(decode(&[0x00, 0x64], 2, tag(b"ui16")).unwrap(), 100.0);
        assert_eq!(decode(&[0xfe], 1, tag(b"ui8 ")).unwrap(), 254.0);
        assert_eq!(decode(&[0xfe], 1, tag(b"si8 ")).unwrap(), -2.0);
        assert_eq!(decode(&[0xff, 0x38], 2, tag(b"si16")).unwrap(), -200.0);
        assert_eq!(decode(&[0x00, 0x00, 0x01, 0x00], 4, tag(b"ui32")).unwrap(), 256.0);
        assert_eq!(decode(&[0xff, 0xff, 0xff, 0xff], 4, tag(b"si32")).unwrap(), -1.0);
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let mut buf = [0xaa_u8; 32];
        buf[0] = 0x19;
        buf[1] = 0x00;
        assert_eq!(decode(&buf, 2, tag(b"sp78")).unwrap(), 25.0);
    }

    #[test]
    fn test_decode_unknown_type() {
        let err = decode(&[0x19, 0x00], 2, tag(b"zzzz")).unwrap_err();
        assert_eq!(err, DecodeError::UnsupportedType(tag(b"zzzz")));

        // text is not a number
        assert!(matches!(
            decode(b"abcdefgh", 8, tag(b"ch8*")),
            Err(DecodeError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_decode_length_mismatch() {
        assert!(matches!(
            decode(&[0x19], 1, tag(b"sp78")),
            Err(DecodeError::Length { expected: 2, actual: 1, .. })
        ));
        // declared length larger than the buffer handed over
        assert!(matches!(
            decode(&[0x19], 2, tag(b"sp78")),
            Err(DecodeError::Length { .. })
        ));
        assert!(matches!(
            decode(&[0, 0, 0, 0], 2, tag(b"ui32")),
            Err(DecodeError::Length { .. })
        ));
    }

    #[test]
    fn test_pack_key_round_trip() {
        for key in ["TC0D", "Tp0b", "#KEY", "Tm0P", "ch8*"] {
            let code: KeyCode = key.parse().unwrap();
            assert_eq!(code.to_string(), key);
        }
        assert_eq!(pack_key(*b"TC0D"), 0x5443_3044);
        assert_eq!(unpack_key(0x5443_3044), *b"TC0D");
    }

    #[test]
    fn test_key_code_rejects_bad_input() {
        assert!(matches!("TC0".parse::<KeyCode>(), Err(SmcError::InvalidKey(_))));
        assert!(matches!("TC0DX".parse::<KeyCode>(), Err(SmcError::InvalidKey(_))));
        assert!(KeyCode::try_from("TÇ0").is_err());
        assert!(KeyCode::try_from("T\0\0D").is_err());
    }

    #[test]
    fn test_data_type_display() {
        assert_eq!(tag(b"ui8 ").to_string(), "ui8 ");
        assert_eq!(DataType::from_raw(0x7370_3738).to_string(), "sp78");
    }
}
