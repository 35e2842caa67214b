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

//! Temperature sensor keys known per processor architecture
//!
//! Intel and Apple Silicon machines expose entirely different key sets, so the
//! catalog is picked when the crate is compiled. Order matters: the CPU
//! temperature is the first entry that reads successfully.
//!
//! Key names follow the community tables in exelban/stats and
//! acidanthera/VirtualSMC.

use crate::codec::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sensor {
    pub key: KeyCode,
    pub name: &'static str,
}

impl Sensor {
    pub const fn new(key: [u8; 4], name: &'static str) -> Self {
        Sensor {
            key: KeyCode::new(key),
            name,
        }
    }
}

pub const X86_64_SENSORS: &[Sensor] = &[
    Sensor::new(*b"TC0D", "CPU die"),
    Sensor::new(*b"TC0E", "CPU PECI die filtered"),
    Sensor::new(*b"TC0F", "CPU PECI die filtered and adjusted"),
    Sensor::new(*b"TC0P", "CPU proximity"),
    Sensor::new(*b"TC0C", "CPU core 0"),
    Sensor::new(*b"TC1C", "CPU core 1"),
    Sensor::new(*b"TC2C", "CPU core 2"),
    Sensor::new(*b"TC3C", "CPU core 3"),
    Sensor::new(*b"TC4C", "CPU core 4"),
    Sensor::new(*b"TG0D", "GPU AMD Radeon"),
    Sensor::new(*b"TCGC", "GPU Intel Graphics"),
    Sensor::new(*b"Tm0P", "Mainboard"),
];

pub const ARM64_SENSORS: &[Sensor] = &[
    Sensor::new(*b"Tp01", "CPU performance core 1"),
    Sensor::new(*b"Tp05", "CPU performance core 2"),
    Sensor::new(*b"Tp0D", "CPU performance core 3"),
    Sensor::new(*b"Tp0H", "CPU performance core 4"),
    Sensor::new(*b"Tp0L", "CPU performance core 5"),
    Sensor::new(*b"Tp0P", "CPU performance core 6"),
    Sensor::new(*b"Tp0X", "CPU performance core 7"),
    Sensor::new(*b"Tp0b", "CPU performance core 8"),
    Sensor::new(*b"Tp09", "CPU efficiency core 1"),
    Sensor::new(*b"Tp0T", "CPU efficiency core 2"),
    Sensor::new(*b"Tg05", "GPU"),
];

#[cfg(target_arch = "x86_64")]
pub const ACTIVE_SENSORS: &[Sensor] = X86_64_SENSORS;

#[cfg(target_arch = "aarch64")]
pub const ACTIVE_SENSORS: &[Sensor] = ARM64_SENSORS;

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
pub const ACTIVE_SENSORS: &[Sensor] = &[];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogs_are_disjoint() {
        for s in X86_64_SENSORS {
            assert!(
                !ARM64_SENSORS.iter().any(|a| a.key == s.key),
                "{} present in both catalogs",
                s.key
            );
        }
    }

    #[test]
    fn test_catalog_keys_are_printable() {
        for s in X86_64_SENSORS.iter().chain(ARM64_SENSORS) {
            let name = s.key.to_string();
            assert_eq!(name.len(), 4);
            assert_eq!(name.parse::<KeyCode>().unwrap(), s.key);
            assert!(!s.name.is_empty());
        }
    }

    #[test]
    fn test_catalog_order() {
        assert_eq!(X86_64_SENSORS[0].key.to_string(), "TC0D");
        assert_eq!(ARM64_SENSORS[0].key.to_string(), "Tp01");
        assert_eq!(X86_64_SENSORS.len(), 12);
        assert_eq!(ARM64_SENSORS.len(), 11);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_active_catalog_matches_arch() {
        assert_eq!(ACTIVE_SENSORS, X86_64_SENSORS);
    }

    #[cfg(target_arch = "aarch64")]
    #[test]
    fn test_active_catalog_matches_arch() {
        assert_eq!(ACTIVE_SENSORS, ARM64_SENSORS);
    }
}
