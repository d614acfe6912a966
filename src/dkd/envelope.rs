/* This file is part of dimcore.
 *
 * Copyright (C) 2020-2026 dimcore contributors
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

//! Envelope: `{sender, receiver, time?, group?}` (spec §3, §4.3).

use crate::mkm::id::Identifier;

#[derive(Debug, Clone)]
pub struct Envelope {
    pub sender: Identifier,
    pub receiver: Identifier,
    pub time: Option<f64>,
    pub group: Option<Identifier>,
}

impl Envelope {
    pub fn new(sender: Identifier, receiver: Identifier, time: Option<f64>) -> Self {
        Self { sender, receiver, time, group: None }
    }

    pub fn with_group(mut self, group: Identifier) -> Self {
        self.group = Some(group);
        self
    }

    /// Cycle guard: a message whose sender equals its receiver must be
    /// dropped with a warning (spec §4.4.1 step 3).
    pub fn is_loopback(&self) -> bool {
        self.sender == self.receiver
    }
}
