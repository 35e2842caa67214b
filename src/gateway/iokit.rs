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

//! IOKit implementation of the driver gateway

use std::ffi::{c_void, CString};

use core_foundation::dictionary::CFMutableDictionaryRef;

use super::{check_reply_len, ConnectionId, Gateway, KernReturn};
use crate::constants::{kern, wire::KEY_DATA_LEN};
use crate::error::{Result, SmcError};
use crate::logger;
use crate::protocol::WireBuf;

type IoObject = u32;

/// kIOMainPortDefault
const MAIN_PORT_DEFAULT: u32 = 0;

#[link(name = "IOKit", kind = "framework")]
extern "C" {
    fn IOServiceMatching(name: *const libc::c_char) -> CFMutableDictionaryRef;
    fn IOServiceGetMatchingServices(
        main_port: u32,
        matching: CFMutableDictionaryRef,
        existing: *mut IoObject,
    ) -> KernReturn;
    fn IOIteratorNext(iterator: IoObject) -> IoObject;
    fn IOObjectRelease(object: IoObject) -> KernReturn;
    fn IOServiceOpen(
        service: IoObject,
        owning_task: u32,
        conn_type: u32,
        connection: *mut IoObject,
    ) -> KernReturn;
    fn IOServiceClose(connection: IoObject) -> KernReturn;
    fn IOConnectCallStructMethod(
        connection: IoObject,
        selector: u32,
        input: *const c_void,
        input_size: libc::size_t,
        output: *mut c_void,
        output_size: *mut libc::size_t,
    ) -> KernReturn;
    fn mach_task_self() -> u32;
}

/// Talks to the AppleSMC user client through IOKit.
#[derive(Debug, Default)]
pub struct IoKitGateway;

impl IoKitGateway {
    pub fn new() -> Self {
        IoKitGateway
    }
}

impl Gateway for IoKitGateway {
    fn open(&mut self, service: &str) -> Result<ConnectionId> {
        let name = CString::new(service)
            .map_err(|_| SmcError::unavailable(service, "service name contains NUL"))?;

        // SAFETY: `name` outlives the call; the matching dictionary is consumed
        // by IOServiceGetMatchingServices, and every object we obtain is
        // released before returning.
        unsafe {
            let matching = IOServiceMatching(name.as_ptr());
            if matching.is_null() {
                return Err(SmcError::unavailable(service, "cannot build matching dictionary"));
            }

            let mut iterator: IoObject = 0;
            let kr = IOServiceGetMatchingServices(MAIN_PORT_DEFAULT, matching, &mut iterator);
            if kr != kern::SUCCESS {
                return Err(SmcError::unavailable(
                    service,
                    format!("service lookup failed ({:#010x})", kr),
                ));
            }

            let device = IOIteratorNext(iterator);
            IOObjectRelease(iterator);
            if device == 0 {
                return Err(SmcError::unavailable(service, "no such service"));
            }

            let mut conn: IoObject = 0;
            let kr = IOServiceOpen(device, mach_task_self(), 0, &mut conn);
            IOObjectRelease(device);
            match kr {
                kern::SUCCESS if conn != 0 => Ok(ConnectionId(conn)),
                kern::NOT_PRIVILEGED => Err(SmcError::unavailable(service, "access denied")),
                _ => Err(SmcError::unavailable(
                    service,
                    format!("IOServiceOpen failed ({:#010x})", kr),
                )),
            }
        }
    }

    fn call(
        &mut self,
        conn: ConnectionId,
        selector: u32,
        input: &WireBuf,
    ) -> std::result::Result<WireBuf, KernReturn> {
        let mut output = [0u8; KEY_DATA_LEN];
        let mut output_size: libc::size_t = KEY_DATA_LEN;

        // SAFETY: both buffers are KEY_DATA_LEN bytes and live across the call.
        let kr = unsafe {
            IOConnectCallStructMethod(
                conn.0,
                selector,
                input.as_ptr() as *const c_void,
                KEY_DATA_LEN,
                output.as_mut_ptr() as *mut c_void,
                &mut output_size,
            )
        };
        if kr != kern::SUCCESS {
            return Err(kr);
        }
        if let Err(code) = check_reply_len(output_size) {
            logger::log_event(
                "smc_short_output",
                serde_json::json!({ "size": output_size, "expected": KEY_DATA_LEN }),
            );
            return Err(code);
        }
        Ok(output)
    }

    fn close(&mut self, conn: ConnectionId) -> std::result::Result<(), KernReturn> {
        // SAFETY: `conn` came from IOServiceOpen and is closed exactly once by the session.
        let kr = unsafe { IOServiceClose(conn.0) };
        if kr == kern::SUCCESS {
            Ok(())
        } else {
            Err(kr)
        }
    }
}
