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

//! Scripted gateway for running the client without hardware
//!
//! Answers each structured call from a table of keys set up by the caller and
//! counts calls per sub-command, so tests can check both what the client
//! decoded and how often it went to the driver.

use std::collections::HashMap;

use super::{ConnectionId, Gateway, KernReturn};
use crate::codec::{DataType, KeyCode};
use crate::constants::{command, data_type, kern, status, wire::MAX_DATA_BYTES, KERNEL_INDEX_SMC, KEY_COUNT_KEY};
use crate::error::{Result, SmcError};
use crate::protocol::{KeyInfo, SmcKeyData, WireBuf};

#[derive(Debug, Clone)]
struct ScriptedKey {
    key: KeyCode,
    /// Key info, or the status byte READ_KEY_INFO reports
    info: std::result::Result<KeyInfo, u8>,
    /// Value bytes, or the status byte READ_BYTES reports
    data: std::result::Result<Vec<u8>, u8>,
}

#[derive(Debug, Default)]
pub struct ScriptedGateway {
    keys: Vec<ScriptedKey>,
    unavailable: Option<String>,
    next_conn: u32,
    open_conn: Option<ConnectionId>,
    calls: HashMap<u8, usize>,
    opens: usize,
    closes: usize,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway whose service cannot be found
    pub fn unavailable(reason: impl Into<String>) -> Self {
        ScriptedGateway {
            unavailable: Some(reason.into()),
            ..Default::default()
        }
    }

    /// Script a key that reads successfully.
    pub fn with_value(self, key: [u8; 4], tag: [u8; 4], bytes: &[u8]) -> Self {
        let info = KeyInfo {
            data_size: bytes.len() as u32,
            data_type: DataType::new(tag),
            attributes: 0,
        };
        self.with_key(key, Ok(info), Ok(bytes.to_vec()))
    }

    /// Script a key the controller does not know.
    pub fn with_missing_key(self, key: [u8; 4]) -> Self {
        self.with_key(key, Err(status::KEY_NOT_FOUND), Err(status::KEY_NOT_FOUND))
    }

    /// Script a key whose info is available but whose read fails with `status`.
    pub fn with_read_failure(self, key: [u8; 4], tag: [u8; 4], size: u32, status: u8) -> Self {
        let info = KeyInfo {
            data_size: size,
            data_type: DataType::new(tag),
            attributes: 0,
        };
        self.with_key(key, Ok(info), Err(status))
    }

    pub fn with_key(
        mut self,
        key: [u8; 4],
        info: std::result::Result<KeyInfo, u8>,
        data: std::result::Result<Vec<u8>, u8>,
    ) -> Self {
        let key = KeyCode::new(key);
        self.keys.retain(|k| k.key != key);
        self.keys.push(ScriptedKey { key, info, data });
        self
    }

    /// Number of structured calls seen for `command`
    pub fn calls(&self, command: u8) -> usize {
        self.calls.get(&command).copied().unwrap_or(0)
    }

    pub fn opens(&self) -> usize {
        self.opens
    }

    pub fn closes(&self) -> usize {
        self.closes
    }

    pub fn is_open(&self) -> bool {
        self.open_conn.is_some()
    }

    fn lookup(&self, key: KeyCode) -> Option<ScriptedKey> {
        if let Some(k) = self.keys.iter().find(|k| k.key == key) {
            return Some(k.clone());
        }
        // #KEY reports the table size unless scripted explicitly
        if key == KeyCode::new(KEY_COUNT_KEY) {
            return Some(ScriptedKey {
                key,
                info: Ok(KeyInfo {
                    data_size: 4,
                    data_type: DataType::new(data_type::UI32),
                    attributes: 0,
                }),
                data: Ok((self.keys.len() as u32).to_be_bytes().to_vec()),
            });
        }
        None
    }

    fn answer(&self, input: &SmcKeyData) -> std::result::Result<SmcKeyData, KernReturn> {
        let mut out = *input;
        out.result = status::SUCCESS;

        match input.data8 {
            command::READ_KEY_INFO => match self.lookup(input.key).map(|k| k.info) {
                Some(Ok(info)) => out.key_info = info,
                Some(Err(s)) => out.result = s,
                None => out.result = status::KEY_NOT_FOUND,
            },
            command::READ_BYTES => match self.lookup(input.key).map(|k| k.data) {
                Some(Ok(data)) => {
                    out.bytes = [0; MAX_DATA_BYTES];
                    let n = data.len().min(MAX_DATA_BYTES);
                    out.bytes[..n].copy_from_slice(&data[..n]);
                }
                Some(Err(s)) => out.result = s,
                None => out.result = status::KEY_NOT_FOUND,
            },
            command::READ_INDEX => match self.keys.get(input.data32 as usize) {
                Some(k) => out.key = k.key,
                None => out.result = status::ERROR,
            },
            _ => return Err(kern::BAD_ARGUMENT),
        }
        Ok(out)
    }
}

impl Gateway for ScriptedGateway {
    fn open(&mut self, service: &str) -> Result<ConnectionId> {
        if let Some(reason) = &self.unavailable {
            return Err(SmcError::unavailable(service, reason.clone()));
        }
        self.opens += 1;
        self.next_conn += 1;
        let conn = ConnectionId(self.next_conn);
        self.open_conn = Some(conn);
        Ok(conn)
    }

    fn call(
        &mut self,
        conn: ConnectionId,
        selector: u32,
        input: &WireBuf,
    ) -> std::result::Result<WireBuf, KernReturn> {
        if self.open_conn != Some(conn) {
            return Err(kern::NOT_OPEN);
        }
        if selector != KERNEL_INDEX_SMC {
            return Err(kern::BAD_ARGUMENT);
        }
        let input = SmcKeyData::from_bytes(input);
        *self.calls.entry(input.data8).or_insert(0) += 1;
        self.answer(&input).map(|out| out.to_bytes())
    }

    fn close(&mut self, conn: ConnectionId) -> std::result::Result<(), KernReturn> {
        if self.open_conn != Some(conn) {
            return Err(kern::NOT_OPEN);
        }
        self.closes += 1;
        self.open_conn = None;
        Ok(())
    }
}
