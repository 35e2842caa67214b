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

//! Text formatting for readings and the key table dump

use crate::aggregator::SensorReading;
use crate::constants::data_type;
use crate::session::{KeyListing, SmcVal};

/// Temperature with one decimal place, as printed by `smctemp -c`
pub fn format_temp(celsius: f64) -> String {
    format!("{:.1}", celsius)
}

/// Space separated hex dump, e.g. `2d 80`
pub fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Human readable value of any key: the number if the type decodes, the
/// text for `ch8*`, otherwise the raw bytes.
pub fn render_value(val: &SmcVal) -> String {
    if let Ok(v) = val.decode() {
        return if v.fract() == 0.0 { format!("{}", v) } else { format!("{:.3}", v) };
    }
    if val.info.data_type.chars() == data_type::CH8 {
        let text: String = val
            .data()
            .iter()
            .take_while(|&&b| b != 0)
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        return format!("\"{}\"", text);
    }
    format!("({})", hex_bytes(val.data()))
}

/// One line of `smctemp -l`
pub fn format_listing(row: &KeyListing) -> String {
    match &row.value {
        Ok(val) => format!(
            "  {}  [{}]  {} (bytes {})",
            row.key,
            val.info.data_type,
            render_value(val),
            hex_bytes(val.data())
        ),
        Err(e) => format!("  {}  [----]  error: {}", row.key, e),
    }
}

/// One line of `smctemp -a`
pub fn format_reading(reading: &SensorReading) -> String {
    match &reading.value {
        Ok(v) => format!("{}  {:<36} {}", reading.sensor.key, reading.sensor.name, format_temp(*v)),
        Err(e) => format!("{}  {:<36} -- ({})", reading.sensor.key, reading.sensor.name, e),
    }
}
