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

//! Constants for talking to the System Management Controller
//!
//! Opcodes, selector values, wire sizes and status codes used by the session
//! and the gateways. Everything here is part of the driver ABI and must not
//! change independently of the controller firmware.

/// IOKit service class that exposes the SMC
pub const SMC_SERVICE_CLASS: &str = "AppleSMC";

/// Selector of the SMC user client's structured method (kSMCHandleYPCEvent)
pub const KERNEL_INDEX_SMC: u32 = 2;

/// Sentinel key holding the total number of keys as a `ui32`
pub const KEY_COUNT_KEY: [u8; 4] = *b"#KEY";

/// Wire sizes of the structured call
pub mod wire {
    /// Size of the input/output structure exchanged with the driver
    pub const KEY_DATA_LEN: usize = 80;

    /// Capacity of the data area in the output structure
    pub const MAX_DATA_BYTES: usize = 32;
}

/// Sub-commands carried in the `data8` field of the input structure
pub mod command {
    pub const READ_BYTES: u8 = 5;
    pub const READ_INDEX: u8 = 8;
    pub const READ_KEY_INFO: u8 = 9;
}

/// Values of the `result` byte reported by the controller
pub mod status {
    pub const SUCCESS: u8 = 0x00;
    pub const ERROR: u8 = 0x01;
    pub const KEY_NOT_FOUND: u8 = 0x84;
}

/// IOKit return codes the gateways produce or inspect
pub mod kern {
    pub const SUCCESS: i32 = 0;
    /// kIOReturnBadArgument
    pub const BAD_ARGUMENT: i32 = 0xE000_02C2_u32 as i32;
    /// kIOReturnNotPrivileged
    pub const NOT_PRIVILEGED: i32 = 0xE000_02C1_u32 as i32;
    /// kIOReturnNotOpen
    pub const NOT_OPEN: i32 = 0xE000_02CD_u32 as i32;
}

/// Known type tags
pub mod data_type {
    pub const FLT: [u8; 4] = *b"flt ";
    pub const FPE2: [u8; 4] = *b"fpe2";
    pub const FP78: [u8; 4] = *b"fp78";
    pub const SP78: [u8; 4] = *b"sp78";
    pub const UI8: [u8; 4] = *b"ui8 ";
    pub const UI16: [u8; 4] = *b"ui16";
    pub const UI32: [u8; 4] = *b"ui32";
    pub const SI8: [u8; 4] = *b"si8 ";
    pub const SI16: [u8; 4] = *b"si16";
    pub const SI32: [u8; 4] = *b"si32";
    pub const CH8: [u8; 4] = *b"ch8*";
}
