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

//! The explicit, constructed-at-startup registry spec §9 asks for in
//! place of ambient module-level singletons: every factory and cache the
//! identity and pipeline layers need, bundled into one struct passed by
//! reference so tests can swap in fresh instances instead of sharing
//! process-wide state.

use crate::{
    crypto::PrivateKey,
    mkm::{document::DocumentFactory, id::IdFactory, meta::MetaFactory, id::Identifier},
    pipeline::entity_checker::EntityChecker,
};

/// A locally-held identity: its signature key plus the ordered list of
/// decrypt-key candidates tried in turn when unwrapping an inbound
/// session key (spec §4.4.2 step 4).
pub struct LocalUser {
    pub identifier: Identifier,
    pub sign_key: PrivateKey,
    pub decrypt_keys: Vec<PrivateKey>,
    /// Local group memberships, consulted by §4.4.3's local-user
    /// selection rule when the receiver is a group.
    pub group_memberships: Vec<Identifier>,
}

impl LocalUser {
    pub fn new(identifier: Identifier, sign_key: PrivateKey, decrypt_keys: Vec<PrivateKey>) -> Self {
        Self { identifier, sign_key, decrypt_keys, group_memberships: Vec::new() }
    }

    pub fn joins(&self, group: &Identifier) -> bool {
        self.group_memberships.iter().any(|g| g == group)
    }
}

#[derive(Default)]
pub struct Registry {
    pub id_factory: IdFactory,
    pub meta_factory: MetaFactory,
    pub document_factory: DocumentFactory,
    pub local_users: Vec<LocalUser>,
    pub entity_checker: EntityChecker,
    /// The "current user" a broadcast-addressed receiver resolves to
    /// (spec §4.4.3). Defaults to the first local user added.
    current: Option<Identifier>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_local_user(&mut self, user: LocalUser) {
        if self.current.is_none() {
            self.current = Some(user.identifier.clone());
        }
        self.local_users.push(user);
    }

    pub fn set_current_user(&mut self, id: Identifier) {
        self.current = Some(id);
    }

    pub fn local_user(&self, id: &Identifier) -> Option<&LocalUser> {
        self.local_users.iter().find(|u| &u.identifier == id)
    }

    pub fn current_user(&self) -> Option<&LocalUser> {
        self.current.as_ref().and_then(|id| self.local_user(id))
    }

    /// Aggregate Thanos sweep across the identity factories (spec §4.2).
    pub fn thanos_eviction(&mut self) -> usize {
        crate::mkm::thanos_eviction(&mut self.id_factory, &mut self.meta_factory)
    }
}
