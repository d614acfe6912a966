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

//! ContentProcessor dispatch (spec §4.4.2 step 6, §9): a tagged union on
//! `Content::content_type` routed through a trait-keyed table, with `*` as
//! the catch-all registration. Concrete processors (text/image/command
//! bodies) are an external collaborator per spec §1's exclusions; this
//! module only owns the registry and dispatch, plus a no-op default.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    dkd::{content::Content, envelope::Envelope},
    error::Result,
    registry::Registry,
};

pub const CATCH_ALL: &str = "*";

/// Handles one content type. `process` may consult and mutate the
/// registry (e.g. to accept an attached Meta/Document) and returns zero
/// or more response Contents, each re-entering the pipeline via 4.4.1.
#[async_trait]
pub trait ContentProcessor: Send + Sync {
    async fn process(&self, content: &Content, envelope: &Envelope, registry: &mut Registry) -> Result<Vec<Content>>;
}

/// Dispatch table keyed by `content_type`; falls back to the `*`
/// registration if the specific type has no processor.
#[derive(Default)]
pub struct ProcessorTable {
    by_type: HashMap<String, Box<dyn ContentProcessor>>,
}

impl ProcessorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, content_type: impl Into<String>, processor: Box<dyn ContentProcessor>) {
        self.by_type.insert(content_type.into(), processor);
    }

    pub fn register_catch_all(&mut self, processor: Box<dyn ContentProcessor>) {
        self.register(CATCH_ALL, processor);
    }

    pub async fn dispatch(&self, content: &Content, envelope: &Envelope, registry: &mut Registry) -> Result<Vec<Content>> {
        let processor = self
            .by_type
            .get(&content.content_type)
            .or_else(|| self.by_type.get(CATCH_ALL));
        match processor {
            Some(p) => p.process(content, envelope, registry).await,
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mkm::{address::Address, id::Identifier};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoProcessor {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ContentProcessor for EchoProcessor {
        async fn process(&self, content: &Content, _envelope: &Envelope, _registry: &mut Registry) -> Result<Vec<Content>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Content::new("receipt", content.sn)])
        }
    }

    fn envelope() -> Envelope {
        let a = Identifier::new(None, Address::anywhere(), None);
        let b = Identifier::new(None, Address::everywhere(), None);
        Envelope::new(a, b, None)
    }

    #[test]
    fn dispatches_to_registered_type() {
        smol::block_on(async {
            let mut table = ProcessorTable::new();
            table.register("text", Box::new(EchoProcessor { calls: AtomicUsize::new(0) }));
            let mut registry = Registry::new();
            let content = Content::new("text", 1);
            let responses = table.dispatch(&content, &envelope(), &mut registry).await.unwrap();
            assert_eq!(responses.len(), 1);
            assert_eq!(responses[0].content_type, "receipt");
        })
    }

    #[test]
    fn falls_back_to_catch_all() {
        smol::block_on(async {
            let mut table = ProcessorTable::new();
            table.register_catch_all(Box::new(EchoProcessor { calls: AtomicUsize::new(0) }));
            let mut registry = Registry::new();
            let content = Content::new("unregistered", 7);
            let responses = table.dispatch(&content, &envelope(), &mut registry).await.unwrap();
            assert_eq!(responses.len(), 1);
        })
    }

    #[test]
    fn unregistered_without_catch_all_is_a_no_op() {
        smol::block_on(async {
            let table = ProcessorTable::new();
            let mut registry = Registry::new();
            let content = Content::new("unregistered", 7);
            let responses = table.dispatch(&content, &envelope(), &mut registry).await.unwrap();
            assert!(responses.is_empty());
        })
    }
}
