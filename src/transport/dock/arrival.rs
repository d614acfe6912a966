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

//! ArrivalHall: reassembles fragmented inbound ships keyed by `sn` (spec
//! §4.6). A fragment whose `sn` is absent is already a complete ship. A
//! completed `sn` is remembered for `FINISHED_RETENTION` to defeat replays
//! of the same reassembly; incomplete entries are purged after
//! `ENTRY_EXPIRES` of inactivity.

use std::collections::HashMap;

pub const ENTRY_EXPIRES: f64 = 5.0 * 60.0;
pub const FINISHED_RETENTION: f64 = 60.0 * 60.0;

/// One inbound fragment. `total`/`index` let the Hall know when every
/// piece of a multi-fragment ship has arrived.
#[derive(Debug, Clone)]
pub struct IncomingFragment {
    pub sn: Option<u32>,
    pub index: u32,
    pub total: u32,
    pub payload: Vec<u8>,
}

struct PendingArrival {
    total: u32,
    parts: HashMap<u32, Vec<u8>>,
    last_touch: f64,
}

#[derive(Default)]
pub struct ArrivalHall {
    live: HashMap<u32, PendingArrival>,
    finished: HashMap<u32, f64>,
}

impl ArrivalHall {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one fragment in. Returns the fully assembled payload once
    /// every fragment of its ship has arrived, else `None` — either
    /// because the ship is still incomplete, or because its `sn` was
    /// already finished and this fragment is a replay.
    pub fn receive(&mut self, fragment: IncomingFragment, now: f64) -> Option<Vec<u8>> {
        let Some(sn) = fragment.sn else { return Some(fragment.payload) };
        if self.finished.contains_key(&sn) {
            return None
        }
        let entry = self.live.entry(sn).or_insert_with(|| PendingArrival {
            total: fragment.total,
            parts: HashMap::new(),
            last_touch: now,
        });
        entry.last_touch = now;
        entry.parts.insert(fragment.index, fragment.payload);
        if entry.parts.len() as u32 >= entry.total {
            let entry = self.live.remove(&sn).expect("just inserted above");
            let mut assembled = Vec::new();
            for i in 0..entry.total {
                if let Some(part) = entry.parts.get(&i) {
                    assembled.extend_from_slice(part);
                }
            }
            self.finished.insert(sn, now);
            Some(assembled)
        } else {
            None
        }
    }

    /// Drops live entries idle past `ENTRY_EXPIRES` and finished markers
    /// older than `FINISHED_RETENTION`. Returns the number of live
    /// entries dropped.
    pub fn purge(&mut self, now: f64) -> usize {
        let before = self.live.len();
        self.live.retain(|_, v| now - v.last_touch < ENTRY_EXPIRES);
        self.finished.retain(|_, &mut t| now - t < FINISHED_RETENTION);
        before - self.live.len()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(sn: u32, index: u32, total: u32, payload: &[u8]) -> IncomingFragment {
        IncomingFragment { sn: Some(sn), index, total, payload: payload.to_vec() }
    }

    #[test]
    fn single_fragment_ship_completes_immediately() {
        let mut hall = ArrivalHall::new();
        let fragment = IncomingFragment { sn: None, index: 0, total: 1, payload: b"hi".to_vec() };
        assert_eq!(hall.receive(fragment, 0.0), Some(b"hi".to_vec()));
    }

    #[test]
    fn multi_fragment_ship_assembles_in_order() {
        let mut hall = ArrivalHall::new();
        assert!(hall.receive(frag(1, 1, 2, b"world"), 0.0).is_none());
        let assembled = hall.receive(frag(1, 0, 2, b"hello "), 1.0).unwrap();
        assert_eq!(assembled, b"hello world");
    }

    #[test]
    fn replay_of_finished_sn_is_dropped() {
        let mut hall = ArrivalHall::new();
        hall.receive(frag(7, 0, 1, b"once"), 0.0);
        assert!(hall.receive(frag(7, 0, 1, b"once"), 1.0).is_none());
    }

    #[test]
    fn purge_drops_stale_live_entries() {
        let mut hall = ArrivalHall::new();
        hall.receive(frag(1, 0, 2, b"partial"), 0.0);
        assert_eq!(hall.live_count(), 1);
        let removed = hall.purge(ENTRY_EXPIRES + 1.0);
        assert_eq!(removed, 1);
        assert_eq!(hall.live_count(), 0);
    }
}
