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

//! Dock: the Porter's in-memory receive hall (`ArrivalHall`) and send hall
//! (`DepartureHall`), bundled behind a purge rate-limit (spec §4.6's
//! `LockedDock`).

pub mod arrival;
pub mod departure;

pub use arrival::ArrivalHall;
pub use departure::{DepartureHall, DepartureOutcome, DepartureTask};

/// Purges of both halls are rate-limited to at most once per
/// `PURGE_INTERVAL`, since a purge walks every live entry and callers may
/// invoke `Dock::try_purge` on every `Porter::process()` tick.
pub const PURGE_INTERVAL: f64 = 30.0;

#[derive(Default)]
pub struct Dock {
    pub arrival_hall: ArrivalHall,
    pub departure_hall: DepartureHall,
    last_purge: Option<f64>,
}

impl Dock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs both halls' purges iff `PURGE_INTERVAL` has elapsed since the
    /// last purge (or none has happened yet). Returns `None` when skipped,
    /// otherwise the number of arrival entries expired plus departure
    /// ships dropped.
    pub fn try_purge(&mut self, now: f64) -> Option<usize> {
        if self.last_purge.is_some_and(|t| now - t < PURGE_INTERVAL) {
            return None
        }
        self.last_purge = Some(now);
        Some(self.arrival_hall.purge(now) + self.departure_hall.purge_completed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purge_is_rate_limited() {
        let mut dock = Dock::new();
        assert!(dock.try_purge(0.0).is_some());
        assert!(dock.try_purge(10.0).is_none());
        assert!(dock.try_purge(PURGE_INTERVAL + 1.0).is_some());
    }
}
