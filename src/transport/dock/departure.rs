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

//! DepartureHall: the priority/retry send queue (spec §4.6). Lower
//! `priority` wins; among equal priorities, insertion order wins. A ship
//! that isn't acknowledged within `max_tries` attempts surfaces as
//! `DepartureOutcome::Failed` so the Porter can report `onPorterFailed`.

use std::collections::HashMap;

pub const T_RETRY: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Fresh,
    Waiting,
    Done,
    Failed,
}

struct Departure {
    priority: i32,
    insertion: u64,
    payload: Vec<u8>,
    max_tries: u32,
    tries_left: u32,
    is_important: bool,
    next_retry_at: Option<f64>,
    status: Status,
}

/// One ship handed back to the Porter to (re)transmit or report as timed
/// out.
#[derive(Debug, Clone)]
pub struct DepartureTask {
    pub sn: u32,
    pub payload: Vec<u8>,
    pub is_important: bool,
}

#[derive(Debug)]
pub enum DepartureOutcome {
    Send(DepartureTask),
    Failed(DepartureTask),
}

#[derive(Default)]
pub struct DepartureHall {
    ships: HashMap<u32, Departure>,
    fresh_order: Vec<u32>,
    next_insertion: u64,
}

impl DepartureHall {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a ship to the queue. Returns `false` (idempotent no-op) if
    /// `sn` is already tracked, matching spec §8 property 8.
    pub fn add_departure(&mut self, sn: u32, payload: Vec<u8>, priority: i32, max_tries: u32, is_important: bool) -> bool {
        if self.ships.contains_key(&sn) {
            return false
        }
        let insertion = self.next_insertion;
        self.next_insertion += 1;
        self.ships.insert(
            sn,
            Departure {
                priority,
                insertion,
                payload,
                max_tries,
                tries_left: max_tries,
                is_important,
                next_retry_at: None,
                status: Status::Fresh,
            },
        );
        self.fresh_order.push(sn);
        true
    }

    /// Spec §4.6 step order: prefer a fired retry clock over popping a
    /// fresh ship; within fresh ships, lowest `priority` value first,
    /// FIFO among ties.
    pub fn get_next_departure(&mut self, now: f64) -> Option<DepartureOutcome> {
        if let Some(&sn) = self
            .ships
            .iter()
            .filter(|(_, s)| s.status == Status::Waiting && s.next_retry_at.is_some_and(|t| now >= t))
            .map(|(sn, _)| sn)
            .min()
        {
            return self.advance(sn, now)
        }

        let idx = self
            .fresh_order
            .iter()
            .enumerate()
            .filter(|(_, sn)| self.ships.get(sn).is_some_and(|s| s.status == Status::Fresh))
            .min_by_key(|(_, sn)| {
                let s = &self.ships[sn];
                (s.priority, s.insertion)
            })
            .map(|(i, _)| i)?;
        let sn = self.fresh_order.remove(idx);
        self.advance(sn, now)
    }

    fn advance(&mut self, sn: u32, now: f64) -> Option<DepartureOutcome> {
        let ship = self.ships.get_mut(&sn)?;
        if ship.tries_left == 0 {
            ship.status = Status::Failed;
            let task = DepartureTask { sn, payload: ship.payload.clone(), is_important: ship.is_important };
            log::warn!(target: "dimcore::transport::dock", "departure {sn} exceeded max tries");
            return Some(DepartureOutcome::Failed(task))
        }
        ship.tries_left -= 1;
        ship.status = Status::Waiting;
        ship.next_retry_at = Some(now + T_RETRY);
        Some(DepartureOutcome::Send(DepartureTask { sn, payload: ship.payload.clone(), is_important: ship.is_important }))
    }

    /// Matches an incoming Arrival's `sn` against a tracked departure,
    /// marking it done regardless of remaining tries. Returns the ship
    /// exactly once; `None` on any later call for the same `sn` (spec §8
    /// property 8).
    pub fn check_response(&mut self, sn: u32) -> Option<DepartureTask> {
        let ship = self.ships.get_mut(&sn)?;
        if ship.status == Status::Done {
            return None
        }
        ship.status = Status::Done;
        Some(DepartureTask { sn, payload: ship.payload.clone(), is_important: ship.is_important })
    }

    pub fn pending_count(&self) -> usize {
        self.ships.values().filter(|s| matches!(s.status, Status::Fresh | Status::Waiting)).count()
    }

    /// Drops ships that have reached a terminal status (`Done` via
    /// `check_response`, `Failed` via exhausted retries) so the map
    /// doesn't grow unbounded over the life of a long-lived connection.
    /// `Fresh`/`Waiting` ships are untouched. Returns the number dropped.
    pub fn purge_completed(&mut self) -> usize {
        let before = self.ships.len();
        self.ships.retain(|_, s| !matches!(s.status, Status::Done | Status::Failed));
        before - self.ships.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_departure_is_idempotent() {
        let mut hall = DepartureHall::new();
        assert!(hall.add_departure(1, b"a".to_vec(), 0, 3, false));
        assert!(!hall.add_departure(1, b"b".to_vec(), 0, 3, false));
    }

    #[test]
    fn higher_priority_ship_goes_first() {
        let mut hall = DepartureHall::new();
        hall.add_departure(1, b"low".to_vec(), 10, 3, false);
        hall.add_departure(2, b"high".to_vec(), 0, 3, false);
        match hall.get_next_departure(0.0) {
            Some(DepartureOutcome::Send(task)) => assert_eq!(task.sn, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn equal_priority_is_fifo() {
        let mut hall = DepartureHall::new();
        hall.add_departure(1, b"first".to_vec(), 0, 3, false);
        hall.add_departure(2, b"second".to_vec(), 0, 3, false);
        match hall.get_next_departure(0.0) {
            Some(DepartureOutcome::Send(task)) => assert_eq!(task.sn, 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn retry_fires_before_a_fresh_ship() {
        let mut hall = DepartureHall::new();
        hall.add_departure(1, b"a".to_vec(), 5, 3, false);
        hall.get_next_departure(0.0); // sends ship 1, arms retry at T_RETRY
        hall.add_departure(2, b"b".to_vec(), 0, 3, false);
        match hall.get_next_departure(T_RETRY + 1.0) {
            Some(DepartureOutcome::Send(task)) => assert_eq!(task.sn, 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn exceeding_max_tries_fails() {
        let mut hall = DepartureHall::new();
        hall.add_departure(1, b"a".to_vec(), 0, 1, false);
        assert!(matches!(hall.get_next_departure(0.0), Some(DepartureOutcome::Send(_))));
        match hall.get_next_departure(T_RETRY + 1.0) {
            Some(DepartureOutcome::Failed(task)) => assert_eq!(task.sn, 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn check_response_is_single_shot() {
        let mut hall = DepartureHall::new();
        hall.add_departure(9, b"ship".to_vec(), 0, 3, true);
        assert!(hall.check_response(9).is_some());
        assert!(hall.check_response(9).is_none());
    }

    #[test]
    fn purge_completed_drops_done_and_failed_only() {
        let mut hall = DepartureHall::new();
        hall.add_departure(1, b"done".to_vec(), 0, 3, false);
        hall.check_response(1);
        hall.add_departure(2, b"failed".to_vec(), 0, 1, false);
        hall.get_next_departure(0.0);
        hall.get_next_departure(T_RETRY + 1.0);
        hall.add_departure(3, b"fresh".to_vec(), 0, 3, false);

        let removed = hall.purge_completed();
        assert_eq!(removed, 2);
        assert!(hall.check_response(3).is_some());
    }
}
