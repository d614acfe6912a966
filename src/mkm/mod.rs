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

//! Identity layer (MKM): addresses, identifiers, metas, and documents
//! (spec §4.2).

pub mod address;
pub mod anonymous;
pub mod document;
pub mod id;
pub mod meta;
pub mod thanos;

use std::collections::HashMap;

use self::{document::Document, id::Identifier, meta::Meta, thanos::ThanosCache};

/// Singleton-style Meta cache, keyed by the owning ID's canonical string.
/// Kept as an explicit struct per spec §9's design note rather than
/// ambient module-level state, so tests can swap instances freely.
#[derive(Default)]
pub struct MetaFactory {
    cache: ThanosCache<String, std::sync::Arc<Meta>>,
}

impl MetaFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &Identifier) -> Option<std::sync::Arc<Meta>> {
        self.cache.get(&id.as_str().to_string()).cloned()
    }

    pub fn put(&mut self, id: &Identifier, meta: Meta) {
        self.cache.insert(id.as_str().to_string(), std::sync::Arc::new(meta));
    }

    pub fn thanos_sweep(&mut self) -> usize {
        self.cache.thanos_sweep()
    }
}

/// Singleton-style Document store, keyed by owning ID. Holds the
/// currently-accepted set (at most one per `DocumentType`, enforced by
/// `document::accept_document`) rather than full history.
#[derive(Default)]
pub struct DocumentFactory {
    by_id: HashMap<String, Vec<Document>>,
}

impl DocumentFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accept(&mut self, id: &Identifier, candidate: Document, meta: &Meta, now: f64) -> bool {
        let store = self.by_id.entry(id.as_str().to_string()).or_default();
        document::accept_document(store, candidate, meta, now)
    }

    pub fn latest(&self, id: &Identifier, doc_type: document::DocumentType) -> Option<&Document> {
        self.by_id.get(id.as_str()).and_then(|store| document::latest_of_type(store, doc_type))
    }

    pub fn all(&self, id: &Identifier) -> &[Document] {
        self.by_id.get(id.as_str()).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Total number of entries removed across both factories — the
/// aggregate count spec §4.2 asks `Thanos eviction` to report.
pub fn thanos_eviction(id_factory: &mut id::IdFactory, meta_factory: &mut MetaFactory) -> usize {
    id_factory.thanos_sweep() + meta_factory.thanos_sweep()
}
