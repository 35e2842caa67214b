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

//! Input/output structure of the SMC structured call
//!
//! The driver exchanges one 80-byte structure in both directions. Its layout
//! follows the C definition used by the kernel extension, including the
//! alignment padding, and multi-byte fields are in host byte order. The
//! encoder and decoder below spell out every offset instead of relying on
//! `#[repr(C)]` so the ABI is visible in one place.
//!
//! ```text
//!  0  key               u32
//!  4  vers              major u8, minor u8, build u8, reserved u8, release u16
//! 12  p_limit_data      version u16, length u16, cpu u32, gpu u32, mem u32
//! 28  key_info          data_size u32, data_type u32, data_attributes u8
//! 40  result            u8
//! 41  status            u8
//! 42  data8             u8   (sub-command)
//! 44  data32            u32  (index for READ_INDEX)
//! 48  bytes             [u8; 32]
//! ```

use crate::codec::{DataType, KeyCode};
use crate::constants::wire::{KEY_DATA_LEN, MAX_DATA_BYTES};

/// Raw wire form of [`SmcKeyData`]
pub type WireBuf = [u8; KEY_DATA_LEN];

mod offset {
    pub const KEY: usize = 0;
    pub const VERS_MAJOR: usize = 4;
    pub const VERS_MINOR: usize = 5;
    pub const VERS_BUILD: usize = 6;
    pub const VERS_RESERVED: usize = 7;
    pub const VERS_RELEASE: usize = 8;
    pub const PLIMIT_VERSION: usize = 12;
    pub const PLIMIT_LENGTH: usize = 14;
    pub const PLIMIT_CPU: usize = 16;
    pub const PLIMIT_GPU: usize = 20;
    pub const PLIMIT_MEM: usize = 24;
    pub const INFO_DATA_SIZE: usize = 28;
    pub const INFO_DATA_TYPE: usize = 32;
    pub const INFO_ATTRIBUTES: usize = 36;
    pub const RESULT: usize = 40;
    pub const STATUS: usize = 41;
    pub const DATA8: usize = 42;
    pub const DATA32: usize = 44;
    pub const BYTES: usize = 48;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmcVersion {
    pub major: u8,
    pub minor: u8,
    pub build: u8,
    pub reserved: u8,
    pub release: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmcPLimitData {
    pub version: u16,
    pub length: u16,
    pub cpu_p_limit: u32,
    pub gpu_p_limit: u32,
    pub mem_p_limit: u32,
}

/// Metadata the controller reports for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInfo {
    pub data_size: u32,
    pub data_type: DataType,
    pub attributes: u8,
}

impl Default for KeyInfo {
    fn default() -> Self {
        KeyInfo {
            data_size: 0,
            data_type: DataType::from_raw(0),
            attributes: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmcKeyData {
    pub key: KeyCode,
    pub vers: SmcVersion,
    pub p_limit_data: SmcPLimitData,
    pub key_info: KeyInfo,
    pub result: u8,
    pub status: u8,
    pub data8: u8,
    pub data32: u32,
    pub bytes: [u8; MAX_DATA_BYTES],
}

impl Default for SmcKeyData {
    fn default() -> Self {
        SmcKeyData {
            key: KeyCode::from_raw(0),
            vers: SmcVersion::default(),
            p_limit_data: SmcPLimitData::default(),
            key_info: KeyInfo::default(),
            result: 0,
            status: 0,
            data8: 0,
            data32: 0,
            bytes: [0; MAX_DATA_BYTES],
        }
    }
}

impl SmcKeyData {
    /// Request for `command` on `key`
    pub fn request(key: KeyCode, command: u8) -> Self {
        SmcKeyData {
            key,
            data8: command,
            ..Default::default()
        }
    }

    pub fn to_bytes(&self) -> WireBuf {
        let mut buf = [0u8; KEY_DATA_LEN];
        put_u32(&mut buf, offset::KEY, self.key.raw());

        buf[offset::VERS_MAJOR] = self.vers.major;
        buf[offset::VERS_MINOR] = self.vers.minor;
        buf[offset::VERS_BUILD] = self.vers.build;
        buf[offset::VERS_RESERVED] = self.vers.reserved;
        put_u16(&mut buf, offset::VERS_RELEASE, self.vers.release);

        put_u16(&mut buf, offset::PLIMIT_VERSION, self.p_limit_data.version);
        put_u16(&mut buf, offset::PLIMIT_LENGTH, self.p_limit_data.length);
        put_u32(&mut buf, offset::PLIMIT_CPU, self.p_limit_data.cpu_p_limit);
        put_u32(&mut buf, offset::PLIMIT_GPU, self.p_limit_data.gpu_p_limit);
        put_u32(&mut buf, offset::PLIMIT_MEM, self.p_limit_data.mem_p_limit);

        put_u32(&mut buf, offset::INFO_DATA_SIZE, self.key_info.data_size);
        put_u32(&mut buf, offset::INFO_DATA_TYPE, self.key_info.data_type.raw());
        buf[offset::INFO_ATTRIBUTES] = self.key_info.attributes;

        buf[offset::RESULT] = self.result;
        buf[offset::STATUS] = self.status;
        buf[offset::DATA8] = self.data8;
        put_u32(&mut buf, offset::DATA32, self.data32);
        buf[offset::BYTES..].copy_from_slice(&self.bytes);
        buf
    }

    pub fn from_bytes(buf: &WireBuf) -> Self {
        let mut bytes = [0u8; MAX_DATA_BYTES];
        bytes.copy_from_slice(&buf[offset::BYTES..]);

        SmcKeyData {
            key: KeyCode::from_raw(get_u32(buf, offset::KEY)),
            vers: SmcVersion {
                major: buf[offset::VERS_MAJOR],
                minor: buf[offset::VERS_MINOR],
                build: buf[offset::VERS_BUILD],
                reserved: buf[offset::VERS_RESERVED],
                release: get_u16(buf, offset::VERS_RELEASE),
            },
            p_limit_data: SmcPLimitData {
                version: get_u16(buf, offset::PLIMIT_VERSION),
                length: get_u16(buf, offset::PLIMIT_LENGTH),
                cpu_p_limit: get_u32(buf, offset::PLIMIT_CPU),
                gpu_p_limit: get_u32(buf, offset::PLIMIT_GPU),
                mem_p_limit: get_u32(buf, offset::PLIMIT_MEM),
            },
            key_info: KeyInfo {
                data_size: get_u32(buf, offset::INFO_DATA_SIZE),
                data_type: DataType::from_raw(get_u32(buf, offset::INFO_DATA_TYPE)),
                attributes: buf[offset::INFO_ATTRIBUTES],
            },
            result: buf[offset::RESULT],
            status: buf[offset::STATUS],
            data8: buf[offset::DATA8],
            data32: get_u32(buf, offset::DATA32),
            bytes,
        }
    }
}

fn put_u16(buf: &mut WireBuf, at: usize, v: u16) {
    buf[at..at + 2].copy_from_slice(&v.to_ne_bytes());
}

fn put_u32(buf: &mut WireBuf, at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_ne_bytes());
}

fn get_u16(buf: &WireBuf, at: usize) -> u16 {
    u16::from_ne_bytes([buf[at], buf[at + 1]])
}

fn get_u32(buf: &WireBuf, at: usize) -> u32 {
    u32::from_ne_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::command;

    #[test]
    fn test_field_offsets() {
        let mut data = SmcKeyData::request(KeyCode::new(*b"TC0D"), command::READ_BYTES);
        data.key_info.data_size = 2;
        data.key_info.data_type = DataType::new(*b"sp78");
        data.data32 = 7;
        data.bytes[0] = 0x19;
        data.bytes[31] = 0xee;

        let buf = data.to_bytes();
        assert_eq!(buf.len(), 80);
        assert_eq!(&buf[0..4], &0x5443_3044_u32.to_ne_bytes());
        assert_eq!(&buf[28..32], &2_u32.to_ne_bytes());
        assert_eq!(&buf[32..36], &u32::from_be_bytes(*b"sp78").to_ne_bytes());
        assert_eq!(buf[42], 5);
        assert_eq!(&buf[44..48], &7_u32.to_ne_bytes());
        assert_eq!(buf[48], 0x19);
        assert_eq!(buf[79], 0xee);
        // padding stays zero
        assert_eq!(&buf[10..12], &[0, 0]);
        assert_eq!(&buf[37..40], &[0, 0, 0]);
        assert_eq!(buf[43], 0);
    }

    #[test]
    fn test_decode_output_structure() {
        let mut buf = [0u8; KEY_DATA_LEN];
        buf[28..32].copy_from_slice(&4_u32.to_ne_bytes());
        buf[32..36].copy_from_slice(&u32::from_be_bytes(*b"flt ").to_ne_bytes());
        buf[36] = 0xd0;
        buf[40] = 0x84;
        buf[48..52].copy_from_slice(&[0x42, 0x28, 0, 0]);

        let data = SmcKeyData::from_bytes(&buf);
        assert_eq!(data.key_info.data_size, 4);
        assert_eq!(data.key_info.data_type.to_string(), "flt ");
        assert_eq!(data.key_info.attributes, 0xd0);
        assert_eq!(data.result, 0x84);
        assert_eq!(&data.bytes[..4], &[0x42, 0x28, 0, 0]);
        assert_eq!(SmcKeyData::from_bytes(&data.to_bytes()), data);
    }
}
