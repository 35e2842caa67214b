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

//! Per-session cache of key metadata

use std::collections::HashMap;

use crate::codec::KeyCode;
use crate::protocol::KeyInfo;

/// Key info fetched during one open session. Only successful lookups are
/// stored, so a key that failed once is asked for again on the next read.
#[derive(Debug, Default)]
pub struct KeyInfoCache {
    entries: HashMap<KeyCode, KeyInfo>,
}

impl KeyInfoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: KeyCode) -> Option<KeyInfo> {
        self.entries.get(&key).copied()
    }

    pub fn insert(&mut self, key: KeyCode, info: KeyInfo) {
        self.entries.insert(key, info);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
