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

//! SMC session: connection lifecycle and the structured call
//!
//! A session owns one gateway connection between `open` and `close`. All
//! reads go through [`SmcSession::call`], which encodes the request to its
//! wire form, performs the structured call and checks the controller's
//! result byte. Key metadata is cached for as long as the connection stays
//! open.

use serde_json::json;

use crate::cache::KeyInfoCache;
use crate::codec::{decode, DecodeError, KeyCode};
use crate::constants::{command, status, wire::MAX_DATA_BYTES, KERNEL_INDEX_SMC, KEY_COUNT_KEY, SMC_SERVICE_CLASS};
use crate::error::{Result, SmcError};
use crate::gateway::{ConnectionId, Gateway};
use crate::logger;
use crate::protocol::{KeyInfo, SmcKeyData};

/// Raw value of a key together with the metadata needed to decode it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmcVal {
    pub key: KeyCode,
    pub info: KeyInfo,
    pub bytes: [u8; MAX_DATA_BYTES],
}

impl SmcVal {
    /// The meaningful prefix of the buffer
    pub fn data(&self) -> &[u8] {
        let len = (self.info.data_size as usize).min(MAX_DATA_BYTES);
        &self.bytes[..len]
    }

    pub fn decode(&self) -> std::result::Result<f64, DecodeError> {
        decode(&self.bytes, self.info.data_size as usize, self.info.data_type)
    }
}

/// One row of the full key table
#[derive(Debug)]
pub struct KeyListing {
    pub index: u32,
    pub key: KeyCode,
    pub value: Result<SmcVal>,
}

pub struct SmcSession<G: Gateway> {
    gateway: G,
    service: String,
    conn: Option<ConnectionId>,
    cache: KeyInfoCache,
}

impl<G: Gateway> SmcSession<G> {
    /// Closed session on the default SMC service class
    pub fn new(gateway: G) -> Self {
        Self::with_service(gateway, SMC_SERVICE_CLASS)
    }

    pub fn with_service(gateway: G, service: impl Into<String>) -> Self {
        SmcSession {
            gateway,
            service: service.into(),
            conn: None,
            cache: KeyInfoCache::new(),
        }
    }

    /// Create a session and open it
    pub fn connect(gateway: G) -> Result<Self> {
        let mut session = Self::new(gateway);
        session.open()?;
        Ok(session)
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Number of keys whose info is currently cached
    pub fn cached_keys(&self) -> usize {
        self.cache.len()
    }

    pub fn open(&mut self) -> Result<()> {
        if self.conn.is_some() {
            return Err(SmcError::AlreadyOpen);
        }
        match self.gateway.open(&self.service) {
            Ok(conn) => {
                logger::log_event("smc_open", json!({ "service": self.service, "conn": conn.0 }));
                self.conn = Some(conn);
                Ok(())
            }
            Err(e) => {
                logger::log_event(
                    "smc_open_failed",
                    json!({ "service": self.service, "error": e.to_string() }),
                );
                Err(e)
            }
        }
    }

    /// Release the connection. Closing a closed session does nothing.
    pub fn close(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        self.cache.clear();
        let res = self.gateway.close(conn);
        logger::log_event("smc_close", json!({ "conn": conn.0, "ok": res.is_ok() }));
        res.map_err(|code| SmcError::CloseFailed { code })
    }

    /// Perform one structured call with `command` as the sub-command.
    pub fn call(&mut self, command: u8, input: &SmcKeyData) -> Result<SmcKeyData> {
        let conn = self.conn.ok_or(SmcError::NotOpen)?;
        let mut request = *input;
        request.data8 = command;

        let raw = self
            .gateway
            .call(conn, KERNEL_INDEX_SMC, &request.to_bytes())
            .map_err(|code| {
                logger::log_event(
                    "smc_call_failed",
                    json!({ "command": command, "key": request.key.to_string(), "code": code }),
                );
                SmcError::CallFailed { command, key: request.key, code }
            })?;

        let output = SmcKeyData::from_bytes(&raw);
        if output.result != status::SUCCESS {
            return Err(SmcError::Status {
                command,
                key: request.key,
                status: output.result,
            });
        }
        Ok(output)
    }

    pub fn key_info(&mut self, key: KeyCode) -> Result<KeyInfo> {
        if let Some(info) = self.cache.get(key) {
            return Ok(info);
        }
        logger::log_event("smc_key_info_miss", json!({ "key": key.to_string() }));
        let output = self.call(command::READ_KEY_INFO, &SmcKeyData::request(key, command::READ_KEY_INFO))?;
        self.cache.insert(key, output.key_info);
        Ok(output.key_info)
    }

    pub fn read_smc_val(&mut self, key: KeyCode) -> Result<SmcVal> {
        let info = self.key_info(key)?;
        if info.data_size as usize > MAX_DATA_BYTES {
            return Err(SmcError::InvalidKeyInfo { key, size: info.data_size });
        }

        let mut input = SmcKeyData::request(key, command::READ_BYTES);
        input.key_info.data_size = info.data_size;
        let output = self.call(command::READ_BYTES, &input)?;

        Ok(SmcVal { key, info, bytes: output.bytes })
    }

    /// Read and decode a key
    pub fn read_value(&mut self, key: KeyCode) -> Result<f64> {
        self.read_smc_val(key)?
            .decode()
            .map_err(|source| SmcError::Decode { key, source })
    }

    /// Total number of keys the controller exposes, from the `#KEY` sentinel.
    pub fn read_index_count(&mut self) -> Result<u32> {
        let key = KeyCode::new(KEY_COUNT_KEY);
        let count = self.read_value(key)?;
        Ok(count as u32)
    }

    /// Resolve the key stored at ordinal `index` of the controller's table.
    pub fn read_key_at_index(&mut self, index: u32) -> Result<KeyCode> {
        let mut input = SmcKeyData::request(KeyCode::from_raw(0), command::READ_INDEX);
        input.data32 = index;
        let output = self.call(command::READ_INDEX, &input)?;
        Ok(output.key)
    }

    /// Walk the whole key table. A key that fails to read is kept with its
    /// error; an index the transport fails on is skipped. The walk ends at
    /// the first index the controller rejects, whatever `#KEY` claimed.
    pub fn list_keys(&mut self) -> Result<Vec<KeyListing>> {
        let count = self.read_index_count()?;
        let mut rows = Vec::new();
        for index in 0..count {
            let key = match self.read_key_at_index(index) {
                Ok(key) => key,
                Err(e @ SmcError::Status { .. }) => {
                    logger::log_event(
                        "smc_index_end",
                        json!({ "index": index, "count": count, "error": e.to_string() }),
                    );
                    break;
                }
                Err(e) => {
                    logger::log_event("smc_index_failed", json!({ "index": index, "error": e.to_string() }));
                    continue;
                }
            };
            let value = self.read_smc_val(key);
            rows.push(KeyListing { index, key, value });
        }
        Ok(rows)
    }
}

impl<G: Gateway> Drop for SmcSession<G> {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DataType;
    use crate::constants::kern;
    use crate::gateway::{MockGateway, ScriptedGateway};
    use crate::protocol::WireBuf;

    fn sp78_info_reply(input: &WireBuf) -> WireBuf {
        let mut out = SmcKeyData::from_bytes(input);
        out.key_info = KeyInfo {
            data_size: 2,
            data_type: DataType::new(*b"sp78"),
            attributes: 0,
        };
        out.to_bytes()
    }

    fn open_mock() -> MockGateway {
        let mut mock = MockGateway::new();
        mock.expect_open().times(1).returning(|_| Ok(ConnectionId(7)));
        mock.expect_close().returning(|_| Ok(()));
        mock
    }

    #[test]
    fn test_key_info_is_cached() {
        let mut mock = open_mock();
        mock.expect_call()
            .times(1)
            .returning(|_, _, input| Ok(sp78_info_reply(input)));

        let mut session = SmcSession::connect(mock).unwrap();
        let key = KeyCode::new(*b"TC0D");
        let first = session.key_info(key).unwrap();
        let second = session.key_info(key).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.data_size, 2);
        assert_eq!(session.cached_keys(), 1);
    }

    #[test]
    fn test_failed_key_info_is_not_cached() {
        let mut mock = open_mock();
        mock.expect_call().times(2).returning(|_, _, input| {
            let mut out = SmcKeyData::from_bytes(input);
            out.result = status::KEY_NOT_FOUND;
            Ok(out.to_bytes())
        });

        let mut session = SmcSession::connect(mock).unwrap();
        let key = KeyCode::new(*b"TC0D");
        for _ in 0..2 {
            let err = session.key_info(key).unwrap_err();
            assert!(matches!(err, SmcError::Status { status: 0x84, .. }));
        }
        assert_eq!(session.cached_keys(), 0);
    }

    #[test]
    fn test_call_uses_smc_selector_and_command() {
        let mut mock = open_mock();
        mock.expect_call()
            .withf(|conn, selector, input| {
                *conn == ConnectionId(7)
                    && *selector == KERNEL_INDEX_SMC
                    && SmcKeyData::from_bytes(input).data8 == command::READ_KEY_INFO
            })
            .times(1)
            .returning(|_, _, input| Ok(sp78_info_reply(input)));

        let mut session = SmcSession::connect(mock).unwrap();
        session.key_info(KeyCode::new(*b"TC0P")).unwrap();
    }

    #[test]
    fn test_gateway_error_is_call_failure() {
        let mut mock = open_mock();
        mock.expect_call().returning(|_, _, _| Err(kern::NOT_PRIVILEGED));

        let mut session = SmcSession::connect(mock).unwrap();
        let err = session.read_value(KeyCode::new(*b"TC0D")).unwrap_err();
        assert!(err.is_call_failure());
        assert!(matches!(err, SmcError::CallFailed { command: 9, .. }));
    }

    #[test]
    fn test_open_twice_is_an_error() {
        let mut session = SmcSession::new(open_mock());
        session.open().unwrap();
        assert!(matches!(session.open(), Err(SmcError::AlreadyOpen)));
        assert!(session.is_open());
    }

    #[test]
    fn test_close_twice_releases_once() {
        let mut mock = MockGateway::new();
        mock.expect_open().times(1).returning(|_| Ok(ConnectionId(3)));
        mock.expect_close().times(1).returning(|_| Ok(()));

        let mut session = SmcSession::connect(mock).unwrap();
        session.close().unwrap();
        session.close().unwrap();
        assert!(!session.is_open());
    }

    #[test]
    fn test_call_on_closed_session() {
        let mut session = SmcSession::new(MockGateway::new());
        let input = SmcKeyData::request(KeyCode::new(*b"TC0D"), command::READ_KEY_INFO);
        assert!(matches!(
            session.call(command::READ_KEY_INFO, &input),
            Err(SmcError::NotOpen)
        ));
    }

    #[test]
    fn test_open_failure_leaves_session_closed() {
        let mut mock = MockGateway::new();
        mock.expect_open()
            .returning(|service| Err(SmcError::unavailable(service, "no such service")));

        let mut session = SmcSession::new(mock);
        assert!(session.open().unwrap_err().is_gateway_unavailable());
        assert!(!session.is_open());
    }

    #[test]
    fn test_close_clears_cache_and_reopen_refetches() {
        let gw = ScriptedGateway::new().with_value(*b"TC0D", *b"sp78", &[0x19, 0x00]);
        let mut session = SmcSession::connect(gw).unwrap();
        let key = KeyCode::new(*b"TC0D");

        assert_eq!(session.read_value(key).unwrap(), 25.0);
        assert_eq!(session.cached_keys(), 1);
        session.close().unwrap();
        assert_eq!(session.cached_keys(), 0);

        session.open().unwrap();
        assert_eq!(session.read_value(key).unwrap(), 25.0);
        assert_eq!(session.gateway().calls(command::READ_KEY_INFO), 2);
        assert_eq!(session.gateway().opens(), 2);
    }

    #[test]
    fn test_drop_closes_connection() {
        let mut mock = MockGateway::new();
        mock.expect_open().returning(|_| Ok(ConnectionId(1)));
        mock.expect_close()
            .withf(|conn| *conn == ConnectionId(1))
            .times(1)
            .returning(|_| Ok(()));

        let session = SmcSession::connect(mock).unwrap();
        drop(session);
    }

    #[test]
    fn test_read_smc_val_limits_to_declared_length() {
        let gw = ScriptedGateway::new().with_value(*b"TC0P", *b"sp78", &[0x2d, 0x80]);
        let mut session = SmcSession::connect(gw).unwrap();

        let val = session.read_smc_val(KeyCode::new(*b"TC0P")).unwrap();
        assert_eq!(val.data(), &[0x2d, 0x80]);
        assert_eq!(val.decode().unwrap(), 45.5);
    }

    #[test]
    fn test_oversized_key_info_is_rejected() {
        let info = KeyInfo {
            data_size: 40,
            data_type: DataType::new(*b"ch8*"),
            attributes: 0,
        };
        let gw = ScriptedGateway::new().with_key(*b"BIG!", Ok(info), Ok(vec![0; 32]));
        let mut session = SmcSession::connect(gw).unwrap();

        let err = session.read_smc_val(KeyCode::new(*b"BIG!")).unwrap_err();
        assert!(matches!(err, SmcError::InvalidKeyInfo { size: 40, .. }));
        assert_eq!(session.gateway().calls(command::READ_BYTES), 0);
    }

    #[test]
    fn test_read_value_distinguishes_decode_from_call_failure() {
        let gw = ScriptedGateway::new()
            .with_value(*b"RPlt", *b"ch8*", b"j314")
            .with_missing_key(*b"TC0D");
        let mut session = SmcSession::connect(gw).unwrap();

        let err = session.read_value(KeyCode::new(*b"RPlt")).unwrap_err();
        assert!(err.is_decode_failure());

        let err = session.read_value(KeyCode::new(*b"TC0D")).unwrap_err();
        assert!(err.is_call_failure());
    }

    #[test]
    fn test_read_index_count_and_list_keys() {
        let gw = ScriptedGateway::new()
            .with_value(*b"TC0D", *b"sp78", &[0x19, 0x00])
            .with_read_failure(*b"TC0E", *b"sp78", 2, status::ERROR)
            .with_value(*b"FNum", *b"ui8 ", &[0x02]);
        let mut session = SmcSession::connect(gw).unwrap();

        assert_eq!(session.read_index_count().unwrap(), 3);
        assert_eq!(session.read_key_at_index(2).unwrap().to_string(), "FNum");

        let rows = session.list_keys().unwrap();
        let keys: Vec<String> = rows.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(keys, ["TC0D", "TC0E", "FNum"]);
        assert!(rows[0].value.is_ok());
        assert!(rows[1].value.is_err());
        assert_eq!(rows[2].value.as_ref().unwrap().data(), &[0x02]);
    }

    #[test]
    fn test_list_keys_with_bogus_key_count() {
        let gw = ScriptedGateway::new()
            .with_value(*b"#KEY", *b"ui32", &[0xff; 4])
            .with_value(*b"TC0D", *b"sp78", &[0x19, 0x00]);
        let mut session = SmcSession::connect(gw).unwrap();

        assert_eq!(session.read_index_count().unwrap(), u32::MAX);
        let rows = session.list_keys().unwrap();
        let keys: Vec<String> = rows.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(keys, ["#KEY", "TC0D"]);
        // two resolved indices plus the rejected one that ends the walk
        assert_eq!(session.gateway().calls(command::READ_INDEX), 3);
    }
}
