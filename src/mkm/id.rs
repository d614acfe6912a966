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

//! Identifier: `[name@]address[/terminal]` (spec §3). Parsing is
//! split-then-cache; the canonical string is the cache key.

use std::fmt;

use super::address::Address;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub name: Option<String>,
    pub address: Address,
    pub terminal: Option<String>,
    canonical: String,
}

impl Identifier {
    pub fn new(name: Option<String>, address: Address, terminal: Option<String>) -> Self {
        let mut canonical = String::new();
        if let Some(n) = &name {
            canonical.push_str(n);
            canonical.push('@');
        }
        canonical.push_str(&address.to_string());
        if let Some(t) = &terminal {
            canonical.push('/');
            canonical.push_str(t);
        }
        Self { name, address, terminal, canonical }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let (body, terminal) = match s.split_once('/') {
            Some((b, t)) => (b, Some(t.to_string())),
            None => (s, None),
        };
        let (name, addr_str) = match body.split_once('@') {
            Some((n, a)) => (Some(n.to_string()), a),
            None => (None, body),
        };
        let address = Address::parse(addr_str)?;
        Ok(Self::new(name, address, terminal))
    }

    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    pub fn network(&self) -> u8 {
        self.address.network()
    }

    pub fn is_broadcast(&self) -> bool {
        self.address.is_broadcast()
    }

    pub fn is_user(&self) -> bool {
        self.address.is_user()
    }

    pub fn is_group(&self) -> bool {
        self.address.is_group()
    }

    pub fn anyone() -> Self {
        Self::new(Some("anyone".into()), Address::anywhere(), None)
    }

    pub fn everyone() -> Self {
        Self::new(Some("everyone".into()), Address::everywhere(), None)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical)
    }
}

/// Insertion-indexed, Thanos-evictable cache from canonical string to a
/// live `Identifier`, per spec §4.2 ("lookup -> miss -> parse -> insert").
#[derive(Default)]
pub struct IdFactory {
    cache: super::thanos::ThanosCache<String, Identifier>,
}

impl IdFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(&mut self, s: &str) -> Result<Identifier> {
        if let Some(id) = self.cache.get(&s.to_string()) {
            return Ok(id.clone())
        }
        let id = Identifier::parse(s)?;
        self.cache.insert(s.to_string(), id.clone());
        Ok(id)
    }

    pub fn thanos_sweep(&mut self) -> usize {
        self.cache.thanos_sweep()
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_address_terminal() {
        let id = Identifier::parse("ANYWHERE").unwrap();
        assert_eq!(id.as_str(), "ANYWHERE");
        assert!(id.is_broadcast());

        let id = Identifier::parse("alice@ANYWHERE/desktop").unwrap();
        assert_eq!(id.name.as_deref(), Some("alice"));
        assert_eq!(id.terminal.as_deref(), Some("desktop"));
        assert_eq!(id.as_str(), "alice@ANYWHERE/desktop");
    }

    #[test]
    fn factory_caches_by_canonical_string() {
        let mut factory = IdFactory::new();
        let a = factory.parse("alice@ANYWHERE").unwrap();
        let b = factory.parse("alice@ANYWHERE").unwrap();
        assert_eq!(a, b);
        assert_eq!(factory.len(), 1);
    }

    #[test]
    fn everyone_is_group_broadcast() {
        let id = Identifier::everyone();
        assert!(id.is_group());
        assert!(id.is_broadcast());
    }
}
