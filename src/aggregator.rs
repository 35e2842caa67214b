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

//! Reduce catalog readings to reported temperatures

use serde::Serialize;
use serde_json::json;

use crate::catalog::{Sensor, ACTIVE_SENSORS};
use crate::error::{Result, SmcError};
use crate::gateway::Gateway;
use crate::logger;
use crate::session::SmcSession;

/// Outcome of reading one catalog entry
#[derive(Debug)]
pub struct SensorReading {
    pub sensor: Sensor,
    pub value: Result<f64>,
}

/// Serializable form of a [`SensorReading`]
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReadingReport {
    pub key: String,
    pub name: String,
    pub celsius: Option<f64>,
    pub error: Option<String>,
}

impl From<&SensorReading> for ReadingReport {
    fn from(r: &SensorReading) -> Self {
        ReadingReport {
            key: r.sensor.key.to_string(),
            name: r.sensor.name.to_string(),
            celsius: r.value.as_ref().ok().copied(),
            error: r.value.as_ref().err().map(|e| e.to_string()),
        }
    }
}

pub struct SmcTemp<'c, G: Gateway> {
    session: SmcSession<G>,
    catalog: &'c [Sensor],
}

impl<G: Gateway> SmcTemp<'static, G> {
    /// Reader over this architecture's catalog
    pub fn new(session: SmcSession<G>) -> Self {
        SmcTemp::with_catalog(session, ACTIVE_SENSORS)
    }
}

impl<'c, G: Gateway> SmcTemp<'c, G> {
    pub fn with_catalog(session: SmcSession<G>, catalog: &'c [Sensor]) -> Self {
        SmcTemp { session, catalog }
    }

    pub fn session(&self) -> &SmcSession<G> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SmcSession<G> {
        &mut self.session
    }

    /// First catalog entry that reads and decodes successfully.
    pub fn cpu_temp(&mut self) -> Result<f64> {
        for sensor in self.catalog {
            match self.session.read_value(sensor.key) {
                Ok(value) => return Ok(value),
                Err(e) if e.is_gateway_unavailable() || matches!(e, SmcError::NotOpen) => {
                    return Err(e)
                }
                Err(e) => logger::log_event(
                    "sensor_skipped",
                    json!({ "key": sensor.key.to_string(), "error": e.to_string() }),
                ),
            }
        }
        Err(SmcError::NoReadableSensor)
    }

    /// Every catalog entry in order, each with its own outcome.
    pub fn all_cpu_temps(&mut self) -> Vec<SensorReading> {
        let catalog = self.catalog;
        catalog
            .iter()
            .map(|&sensor| SensorReading {
                sensor,
                value: self.session.read_value(sensor.key),
            })
            .collect()
    }
}
