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

//! smctemp - read CPU temperatures from the System Management Controller
//!
//! The crate is layered leaf-first: [`codec`] turns raw key bytes into numbers,
//! [`protocol`] lays out the structured call, [`gateway`] performs it against
//! the driver, [`session`] owns a connection and caches key metadata, and
//! [`aggregator`] reduces the architecture's [`catalog`] to a temperature.

pub mod aggregator;
pub mod cache;
pub mod catalog;
pub mod codec;
pub mod constants;
pub mod display;
pub mod error;
pub mod gateway;
pub mod logger;
pub mod protocol;
pub mod session;

pub use aggregator::{ReadingReport, SensorReading, SmcTemp};
pub use catalog::{Sensor, ACTIVE_SENSORS};
pub use codec::{decode, pack_key, unpack_key, DataType, DecodeError, KeyCode};
pub use error::{Result, SmcError};
pub use gateway::{Gateway, PlatformGateway, ScriptedGateway};
pub use session::{KeyListing, SmcSession, SmcVal};
