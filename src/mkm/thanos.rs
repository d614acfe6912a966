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

//! Thanos eviction: a semi-bulk policy shared by the identity caches
//! (spec §4.2). On memory pressure, walk the mapping in insertion order
//! and drop every entry at an odd position; two sweeps approximate
//! halving the cache. Since `HashMap` has no stable iteration order, we
//! keep an explicit insertion-ordered vector of keys alongside the map
//! (spec §9's design note on this exact tradeoff).

use std::collections::HashMap;
use std::hash::Hash;

pub struct ThanosCache<K, V> {
    order: Vec<K>,
    map: HashMap<K, V>,
}

impl<K: Clone + Eq + Hash, V> Default for ThanosCache<K, V> {
    fn default() -> Self {
        Self { order: Vec::new(), map: HashMap::new() }
    }
}

impl<K: Clone + Eq + Hash, V> ThanosCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Lookup-miss-parse-insert, per spec §4.2's factory caching rule.
    pub fn insert(&mut self, key: K, value: V) {
        if !self.map.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.map.insert(key, value);
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.map.remove(key)
    }

    /// Removes every entry at an odd position (1, 3, 5, ...) in insertion
    /// order. Returns the number of entries removed.
    pub fn thanos_sweep(&mut self) -> usize {
        let doomed: Vec<K> =
            self.order.iter().enumerate().filter(|(i, _)| i % 2 == 1).map(|(_, k)| k.clone()).collect();
        let removed = doomed.len();
        for key in doomed {
            self.map.remove(&key);
        }
        self.order.retain(|k| self.map.contains_key(k));
        removed
    }
}
