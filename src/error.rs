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

//! Error type shared by every layer of the SMC client
//!
//! The variants are grouped by how a caller is expected to react: the gateway
//! being unreachable is fatal for a session, a failed call is recoverable at
//! the call site, a decode failure means the sensor exists but its bytes are
//! unusable, and catalog exhaustion ends a single temperature query.

use crate::codec::{DecodeError, KeyCode};

/// Result type alias using SmcError
pub type Result<T> = std::result::Result<T, SmcError>;

#[derive(thiserror::Error, Debug)]
pub enum SmcError {
    // ============================================================================
    // Gateway and session lifecycle
    // ============================================================================
    #[error("SMC gateway '{service}' unavailable: {reason}")]
    GatewayUnavailable {
        service: String,
        reason: String,
    },

    #[error("SMC session is already open")]
    AlreadyOpen,

    #[error("SMC session is not open")]
    NotOpen,

    #[error("closing SMC connection failed with code {code:#010x}")]
    CloseFailed {
        code: i32,
    },

    // ============================================================================
    // Structured call failures
    // ============================================================================
    #[error("SMC call {command} for key {key} failed with code {code:#010x}")]
    CallFailed {
        command: u8,
        key: KeyCode,
        code: i32,
    },

    #[error("SMC call {command} for key {key} returned status {status:#04x}")]
    Status {
        command: u8,
        key: KeyCode,
        status: u8,
    },

    #[error("SMC key {key} declares {size} data bytes (max 32)")]
    InvalidKeyInfo {
        key: KeyCode,
        size: u32,
    },

    // ============================================================================
    // Decoding
    // ============================================================================
    #[error("cannot decode SMC key {key}: {source}")]
    Decode {
        key: KeyCode,
        #[source]
        source: DecodeError,
    },

    #[error("invalid SMC key '{0}' (must be exactly 4 ASCII characters)")]
    InvalidKey(String),

    // ============================================================================
    // Aggregation
    // ============================================================================
    #[error("no readable temperature sensor for this architecture")]
    NoReadableSensor,
}

impl SmcError {
    pub fn unavailable(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::GatewayUnavailable {
            service: service.into(),
            reason: reason.into(),
        }
    }

    /// The driver could not be reached; nothing on this session will work.
    pub fn is_gateway_unavailable(&self) -> bool {
        matches!(self, Self::GatewayUnavailable { .. })
    }

    /// A structured call was rejected by the gateway or the controller.
    pub fn is_call_failure(&self) -> bool {
        matches!(
            self,
            Self::CallFailed { .. } | Self::Status { .. } | Self::InvalidKeyInfo { .. }
        )
    }

    /// Bytes were read but could not be turned into a number.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::DataType;

    #[test]
    fn test_error_classification() {
        let key = KeyCode::new(*b"TC0D");

        let unavailable = SmcError::unavailable("AppleSMC", "no such service");
        assert!(unavailable.is_gateway_unavailable());
        assert!(!unavailable.is_call_failure());

        let status = SmcError::Status { command: 9, key, status: 0x84 };
        assert!(status.is_call_failure());
        assert!(!status.is_decode_failure());

        let decode = SmcError::Decode {
            key,
            source: DecodeError::UnsupportedType(DataType::new(*b"zzzz")),
        };
        assert!(decode.is_decode_failure());
        assert!(!decode.is_call_failure());
    }

    #[test]
    fn test_error_display() {
        let key = KeyCode::new(*b"TC0D");
        let err = SmcError::Status { command: 5, key, status: 0x84 };
        assert_eq!(err.to_string(), "SMC call 5 for key TC0D returned status 0x84");

        let err = SmcError::CallFailed { command: 9, key, code: crate::constants::kern::NOT_OPEN };
        assert_eq!(err.to_string(), "SMC call 9 for key TC0D failed with code 0xe00002cd");

        let err = SmcError::InvalidKey("TC0".into());
        assert!(err.to_string().contains("'TC0'"));
    }
}
