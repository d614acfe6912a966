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

//! Packer: receiver-readiness gating (spec §4.4.1 step 2) and the
//! suspension queue that readiness failures feed into, rather than the
//! exceptions-for-control-flow the original models this with (spec §9).

use std::collections::HashMap;

use super::facebook;
use crate::{mkm::id::Identifier, registry::Registry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// Missing a dependency (typically a Visa encrypt-key); the caller
    /// should suspend and retry once it arrives.
    Suspend { reason: String, user: Identifier },
    /// Never retriable as-is — the caller must change what it's doing.
    Refuse(String),
}

/// For broadcast receivers: always ready. For a single user: ready iff a
/// Visa encrypt-key is known locally. For a group: refused outright —
/// group messages are fanned out to members individually, never
/// encrypted to the group ID itself.
pub fn check_receiver_readiness(registry: &Registry, receiver: &Identifier) -> Readiness {
    if receiver.is_broadcast() {
        return Readiness::Ready
    }
    if receiver.is_group() {
        return Readiness::Refuse(
            "group messages must be delivered individually to group bots, not to the group ID".into(),
        )
    }
    match facebook::visa_encrypt_key(registry, receiver) {
        Some(_) => Readiness::Ready,
        None => Readiness::Suspend { reason: "visa encrypt-key not found".into(), user: receiver.clone() },
    }
}

/// One message parked on a missing dependency, with the `{message, user}`
/// error map spec §4.4.1/§4.4.2 attach to the suspended item.
pub struct SuspendedItem<T> {
    pub item: T,
    pub message: String,
    pub user: Identifier,
}

/// Keyed by the canonical string of the missing dependency (a Visa
/// owner's ID, or a sender whose verify-key is unknown). `drain_ready`
/// is called once that dependency's Meta/Document arrives.
#[derive(Default)]
pub struct SuspensionQueue<T> {
    by_dependency: HashMap<String, Vec<SuspendedItem<T>>>,
}

impl<T> SuspensionQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, dependency: &Identifier, item: T, message: impl Into<String>) {
        self.by_dependency.entry(dependency.as_str().to_string()).or_default().push(SuspendedItem {
            item,
            message: message.into(),
            user: dependency.clone(),
        });
    }

    pub fn drain_ready(&mut self, dependency: &Identifier) -> Vec<SuspendedItem<T>> {
        self.by_dependency.remove(dependency.as_str()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_dependency.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        crypto::PrivateKey,
        mkm::meta::{Meta, MetaType},
        registry::Registry,
    };

    fn identity(seed: &str) -> Identifier {
        let sk = PrivateKey::generate_ecc();
        let meta = Meta::generate(MetaType::Btc, &sk, None).unwrap();
        Identifier::new(Some(seed.to_string()), meta.generate_address(0), None)
    }

    #[test]
    fn broadcast_is_always_ready() {
        let registry = Registry::new();
        let anywhere = Identifier::parse("ANYWHERE").unwrap();
        assert_eq!(check_receiver_readiness(&registry, &anywhere), Readiness::Ready);
    }

    #[test]
    fn group_is_refused() {
        let registry = Registry::new();
        let group_meta = Meta::generate(MetaType::Mkm, &PrivateKey::generate_ecc(), Some("g".into())).unwrap();
        let group = Identifier::new(Some("g".into()), group_meta.generate_address(1), None);
        assert!(matches!(check_receiver_readiness(&registry, &group), Readiness::Refuse(_)));
    }

    #[test]
    fn user_without_visa_suspends() {
        let registry = Registry::new();
        let bob = identity("bob");
        assert!(matches!(check_receiver_readiness(&registry, &bob), Readiness::Suspend { .. }));
    }

    #[test]
    fn suspension_queue_enqueues_and_drains() {
        let mut queue: SuspensionQueue<&str> = SuspensionQueue::new();
        let bob = identity("bob");
        queue.enqueue(&bob, "hello", "visa encrypt-key not found");
        assert_eq!(queue.len(), 1);
        let drained = queue.drain_ready(&bob);
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].item, "hello");
        assert!(queue.is_empty());
    }
}
