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

//! Serial number generation (spec §4.3, §6): `0 < sn <= 2^31 - 1`, seeded
//! with a process-start random value and incremented per call. Generation
//! is deliberately *not* time-derived — two contents produced in the same
//! millisecond must still differ; only process-wide uniqueness within one
//! chat is required.

use std::sync::atomic::{AtomicU32, Ordering};

use rand::Rng;

pub const SN_MAX: u32 = (1u32 << 31) - 1;

pub struct SerialNumberGenerator {
    counter: AtomicU32,
}

impl Default for SerialNumberGenerator {
    fn default() -> Self {
        let seed = rand::thread_rng().gen_range(0..(1u32 << 31));
        Self { counter: AtomicU32::new(seed) }
    }
}

impl SerialNumberGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments, wrapping to 1 at `2^31 - 1`, and returns the new value.
    /// Zero is reserved and is never produced.
    pub fn generate(&self) -> u32 {
        loop {
            let current = self.counter.load(Ordering::Relaxed);
            let next = if current >= SN_MAX { 1 } else { current + 1 };
            if self
                .counter
                .compare_exchange(current, next, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return next
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successive_calls_are_distinct() {
        let gen = SerialNumberGenerator::new();
        let a = gen.generate();
        let b = gen.generate();
        assert_ne!(a, b);
        assert!(a >= 1 && a <= SN_MAX);
        assert!(b >= 1 && b <= SN_MAX);
    }

    #[test]
    fn wraps_to_one_past_max() {
        let gen = SerialNumberGenerator { counter: AtomicU32::new(SN_MAX) };
        let next = gen.generate();
        assert_eq!(next, 1);
    }

    #[test]
    fn never_yields_zero() {
        let gen = SerialNumberGenerator::new();
        for _ in 0..10_000 {
            assert_ne!(gen.generate(), 0);
        }
    }
}
