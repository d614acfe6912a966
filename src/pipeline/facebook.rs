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

//! Facebook: the identity facade the Messenger queries for everything
//! that isn't crypto math — local-user selection (spec §4.4.3), Visa
//! encrypt-keys, and Meta lookups. Kept as free functions over `&Registry`
//! rather than a struct owning its own Archivist, since spec §9 calls for
//! breaking the Facebook↔Archivist cycle with a non-owning reference.

use crate::{
    crypto::PublicKey,
    mkm::{document::DocumentType, id::Identifier, meta::Meta},
    registry::{LocalUser, Registry},
};

/// Resolves which local user a given receiver routes to (spec §4.4.3):
/// broadcast -> current user; group -> a local member, fail closed if
/// none; concrete user -> that user iff it is local.
pub fn select_local_user<'a>(registry: &'a Registry, receiver: &Identifier) -> Option<&'a LocalUser> {
    if receiver.is_broadcast() {
        return registry.current_user()
    }
    if receiver.is_group() {
        return registry.local_users.iter().find(|u| u.joins(receiver))
    }
    registry.local_user(receiver)
}

/// The public key a Visa carries for wrapping a symmetric session key,
/// if we hold an accepted Visa for `id`.
pub fn visa_encrypt_key(registry: &Registry, id: &Identifier) -> Option<PublicKey> {
    let visa = registry.document_factory.latest(id, DocumentType::Visa)?;
    visa.encrypt_key().ok().flatten()
}

pub fn meta(registry: &Registry, id: &Identifier) -> Option<std::sync::Arc<Meta>> {
    registry.meta_factory.get(id)
}

/// Latest Visa timestamp for `id`, used to attach `SDT` on outbound
/// messages (spec §4.4.1 step 1).
pub fn visa_time(registry: &Registry, id: &Identifier) -> Option<f64> {
    registry.document_factory.latest(id, DocumentType::Visa).map(|v| v.time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        crypto::PrivateKey,
        mkm::{address::Address, meta::MetaType},
        registry::LocalUser,
    };

    fn identity(seed: &str) -> (PrivateKey, Identifier) {
        let sk = PrivateKey::generate_ecc();
        let meta = Meta::generate(MetaType::Btc, &sk, None).unwrap();
        let addr = meta.generate_address(0);
        (sk, Identifier::new(Some(seed.to_string()), addr, None))
    }

    #[test]
    fn broadcast_resolves_to_current_user() {
        let mut registry = Registry::new();
        let (sk, alice) = identity("alice");
        registry.add_local_user(LocalUser::new(alice.clone(), sk, vec![]));

        let resolved = select_local_user(&registry, &Identifier::parse("ANYWHERE").unwrap()).unwrap();
        assert_eq!(resolved.identifier, alice);
    }

    #[test]
    fn group_requires_local_membership() {
        let mut registry = Registry::new();
        let (sk, alice) = identity("alice");
        let mut user = LocalUser::new(alice.clone(), sk, vec![]);
        let group_meta = Meta::generate(MetaType::Mkm, &PrivateKey::generate_ecc(), Some("team".into())).unwrap();
        let group = Identifier::new(Some("team".into()), group_meta.generate_address(1), None);
        user.group_memberships.push(group.clone());
        registry.add_local_user(user);

        assert!(select_local_user(&registry, &group).is_some());

        let other_meta = Meta::generate(MetaType::Mkm, &PrivateKey::generate_ecc(), Some("other".into())).unwrap();
        let other_group = Identifier::new(Some("other".into()), other_meta.generate_address(1), None);
        assert!(select_local_user(&registry, &other_group).is_none());
    }

    #[test]
    fn concrete_user_must_be_local() {
        let mut registry = Registry::new();
        let (sk, alice) = identity("alice");
        registry.add_local_user(LocalUser::new(alice.clone(), sk, vec![]));
        let (_, bob) = identity("bob");

        assert!(select_local_user(&registry, &alice).is_some());
        assert!(select_local_user(&registry, &bob).is_none());
    }
}
