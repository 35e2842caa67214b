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

//! Driver gateway capability
//!
//! The gateway is the only thing that touches the operating system. It knows
//! how to open a connection to a named service class, perform the structured
//! call on it and close it again. Everything above it deals in
//! [`SmcKeyData`](crate::protocol::SmcKeyData) and never sees a raw handle.

#[cfg(target_os = "macos")]
mod iokit;
mod scripted;

#[cfg(target_os = "macos")]
pub use iokit::IoKitGateway;
pub use scripted::ScriptedGateway;

use crate::constants::{kern, wire::KEY_DATA_LEN};
use crate::error::{Result, SmcError};
use crate::protocol::WireBuf;

/// Return code of a structured call, `0` on success
pub type KernReturn = i32;

/// Opaque handle of an open connection to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u32);

#[cfg_attr(test, mockall::automock)]
pub trait Gateway {
    /// Open a connection to the first service matching `service`.
    fn open(&mut self, service: &str) -> Result<ConnectionId>;

    /// Structured call: send `input`, receive the output structure.
    fn call(
        &mut self,
        conn: ConnectionId,
        selector: u32,
        input: &WireBuf,
    ) -> std::result::Result<WireBuf, KernReturn>;

    fn close(&mut self, conn: ConnectionId) -> std::result::Result<(), KernReturn>;
}

/// A reply shorter or longer than the wire structure is rejected rather than
/// read from a partly zeroed buffer.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
pub(crate) fn check_reply_len(len: usize) -> std::result::Result<(), KernReturn> {
    if len == KEY_DATA_LEN {
        Ok(())
    } else {
        Err(kern::BAD_ARGUMENT)
    }
}

/// Gateway for platforms without an SMC driver. Opening always fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedGateway;

impl Gateway for UnsupportedGateway {
    fn open(&mut self, service: &str) -> Result<ConnectionId> {
        Err(SmcError::unavailable(
            service,
            format!("no SMC driver on {}", std::env::consts::OS),
        ))
    }

    fn call(
        &mut self,
        _conn: ConnectionId,
        _selector: u32,
        _input: &WireBuf,
    ) -> std::result::Result<WireBuf, KernReturn> {
        Err(kern::NOT_OPEN)
    }

    fn close(&mut self, _conn: ConnectionId) -> std::result::Result<(), KernReturn> {
        Ok(())
    }
}

/// Gateway backed by the running platform's driver.
#[cfg(target_os = "macos")]
pub type PlatformGateway = IoKitGateway;

#[cfg(not(target_os = "macos"))]
pub type PlatformGateway = UnsupportedGateway;
