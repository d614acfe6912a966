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

//! EntityChecker (spec §4.4.4): two timed structures keyed by ID that
//! decide whether a refresh query is warranted. Neither performs I/O —
//! the decision is returned to the caller, which issues the actual query
//! through its own hook (`queryMeta`/`queryDocuments`/`queryMembers`).

use std::collections::HashMap;

/// `FrequencyChecker`'s permit period: at most one query per ID per kind
/// within this window.
pub const QUERY_EXPIRES: f64 = 10.0 * 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Meta,
    Docs,
    Members,
}

/// Permits at most one query per `(id, kind)` within `QUERY_EXPIRES`.
#[derive(Default)]
pub struct FrequencyChecker {
    last_query: HashMap<(String, QueryKind), f64>,
}

impl FrequencyChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` and records `now` iff no query for this `(id, kind)`
    /// was recorded within the last `QUERY_EXPIRES` seconds.
    pub fn try_query(&mut self, id: &str, kind: QueryKind, now: f64) -> bool {
        let key = (id.to_string(), kind);
        match self.last_query.get(&key) {
            Some(&last) if now - last < QUERY_EXPIRES => false,
            _ => {
                self.last_query.insert(key, now);
                true
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeKind {
    Document,
    GroupHistory,
}

/// Stores the maximum observed timestamp per `(id, kind)`; a remote time
/// strictly greater than what's stored means our snapshot is expired.
#[derive(Default)]
pub struct RecentTimeChecker {
    newest: HashMap<(String, TimeKind), f64>,
}

impl RecentTimeChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expired(&self, id: &str, kind: TimeKind, remote_time: f64) -> bool {
        match self.newest.get(&(id.to_string(), kind)) {
            Some(&stored) => remote_time > stored,
            None => true,
        }
    }

    /// Bumps the stored snapshot time after a successful refresh. A
    /// smaller `observed_time` is ignored — the checker only ever moves
    /// forward.
    pub fn update(&mut self, id: &str, kind: TimeKind, observed_time: f64) {
        let key = (id.to_string(), kind);
        let entry = self.newest.entry(key).or_insert(observed_time);
        if observed_time > *entry {
            *entry = observed_time;
        }
    }
}

/// Bundles both timed structures plus the caller-supplied query hooks
/// (spec §4.4.4's "subclass hook"). Kept as plain closures/trait object
/// rather than inheritance, matching the tagged-dispatch approach used
/// for `ContentProcessor`.
#[derive(Default)]
pub struct EntityChecker {
    pub frequency: FrequencyChecker,
    pub recent: RecentTimeChecker,
}

impl EntityChecker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_checker_permits_once_per_window() {
        let mut checker = FrequencyChecker::new();
        assert!(checker.try_query("alice", QueryKind::Meta, 0.0));
        assert!(!checker.try_query("alice", QueryKind::Meta, 1.0));
        assert!(!checker.try_query("alice", QueryKind::Meta, QUERY_EXPIRES - 1.0));
        assert!(checker.try_query("alice", QueryKind::Meta, QUERY_EXPIRES + 1.0));
    }

    #[test]
    fn frequency_checker_is_per_kind() {
        let mut checker = FrequencyChecker::new();
        assert!(checker.try_query("alice", QueryKind::Meta, 0.0));
        assert!(checker.try_query("alice", QueryKind::Docs, 0.0));
    }

    #[test]
    fn recent_time_checker_detects_staleness() {
        let mut checker = RecentTimeChecker::new();
        assert!(checker.is_expired("alice", TimeKind::Document, 100.0));
        checker.update("alice", TimeKind::Document, 100.0);
        assert!(!checker.is_expired("alice", TimeKind::Document, 100.0));
        assert!(!checker.is_expired("alice", TimeKind::Document, 50.0));
        assert!(checker.is_expired("alice", TimeKind::Document, 150.0));
    }

    #[test]
    fn recent_time_checker_never_moves_backward() {
        let mut checker = RecentTimeChecker::new();
        checker.update("alice", TimeKind::Document, 100.0);
        checker.update("alice", TimeKind::Document, 50.0);
        assert!(!checker.is_expired("alice", TimeKind::Document, 100.0));
    }
}
