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

//! Messenger: the outbound (spec §4.4.1) and inbound (spec §4.4.2)
//! pipeline. Readiness failures and verification failures are modelled as
//! `SendOutcome`/`ReceiveOutcome` sum types rather than exceptions, per
//! spec §9's design note — callers match on the outcome instead of
//! catching.

use std::collections::HashMap;

use crate::{
    crypto::{keys::Extra, PrivateKey, SessionKey, SymmetricKey},
    dkd::{
        content::Content,
        instant::InstantMessage,
        reliable::ReliableMessage,
        secure::{KeyWrap, SecureMessage},
        serial_number::SerialNumberGenerator,
    },
    error::{Error, Result},
    mkm::id::Identifier,
    pipeline::{
        compat,
        entity_checker::{QueryKind, TimeKind},
        facebook,
        packer::{self, Readiness, SuspensionQueue},
        processor::ProcessorTable,
    },
    registry::Registry,
};

#[derive(Debug)]
pub enum SendOutcome {
    Ok(ReliableMessage),
    Suspended(String),
    Dropped(String),
    Failed(Error),
}

#[derive(Debug)]
pub enum ReceiveOutcome {
    Ok { content: Content, responses: Vec<Content> },
    Suspended(String),
    Dropped(String),
    Failed(Error),
}

fn session_fingerprint(sender: &Identifier, receiver: &Identifier, group: Option<&Identifier>) -> String {
    format!("{}|{}|{}", sender.as_str(), receiver.as_str(), group.map(Identifier::as_str).unwrap_or(""))
}

/// Drives the send/receive pipeline. Holds the per-recipient session-key
/// cache and the two suspension queues; everything else (identity lookup,
/// content dispatch) is injected per call so the Messenger itself stays a
/// plain, testable collaborator rather than an ambient singleton.
#[derive(Default)]
pub struct Messenger {
    pub sn_generator: SerialNumberGenerator,
    session_keys: HashMap<String, SessionKey>,
    pub outbound_suspension: SuspensionQueue<InstantMessage>,
    pub inbound_suspension: SuspensionQueue<ReliableMessage>,
    /// IDs whose Meta/Document a caller should asynchronously refresh,
    /// per spec §4.4.2 step 7. The Messenger only decides; issuing the
    /// query is the caller's (Facebook/Archivist's) job.
    pub profile_refresh_queue: Vec<Identifier>,
}

impl Messenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn send(&mut self, mut instant: InstantMessage, registry: &Registry) -> SendOutcome {
        let sender = instant.envelope.sender.clone();
        let receiver = instant.envelope.receiver.clone();

        // Step 1: attach Visa time, unless this is a Command.
        if !instant.content.is_command() {
            instant.sdt = facebook::visa_time(registry, &sender);
        }

        // Step 2: receiver readiness.
        match packer::check_receiver_readiness(registry, &receiver) {
            Readiness::Refuse(reason) => return SendOutcome::Dropped(reason),
            Readiness::Suspend { reason, user } => {
                self.outbound_suspension.enqueue(&user, instant, reason.clone());
                return SendOutcome::Suspended(reason)
            }
            Readiness::Ready => {}
        }

        // Step 3: cycle guard.
        if instant.envelope.is_loopback() {
            log::warn!(target: "dimcore::pipeline", "dropping loopback message from {sender}");
            return SendOutcome::Dropped("sender equals receiver".into())
        }

        // Step 4: encrypt content.
        if instant.content.is_file_with_raw_data() {
            return SendOutcome::Failed(Error::NotUploaded)
        }
        let Some(local_sender) = registry.local_user(&sender) else {
            return SendOutcome::Failed(Error::KeyNotFound(format!("no local sign key for {sender}")))
        };

        let fingerprint = session_fingerprint(&sender, &receiver, instant.envelope.group.as_ref());
        let is_broadcast = receiver.is_broadcast();
        let session = self
            .session_keys
            .entry(fingerprint)
            .or_insert_with(|| if is_broadcast { SessionKey::plain() } else { SessionKey::generate() });

        let content_bytes = match serde_json::to_vec(&instant.content.to_json()) {
            Ok(b) => b,
            Err(e) => return SendOutcome::Failed(Error::Serialize(e)),
        };
        let mut extra: Extra = Extra::new();
        let ciphertext = session.key.encrypt(&content_bytes, &mut extra);

        let mut secure = SecureMessage::new(instant.envelope.clone(), ciphertext);
        secure.extra = extra;

        // Step 5 + 6: per-recipient key wrap, electing digest-only reuse.
        if !is_broadcast {
            if session.reused {
                if session.digest.is_none() {
                    session.digest = session.compute_digest();
                }
                secure.key_wrap = Some(KeyWrap::DigestOnly(session.digest.clone().unwrap_or_default()));
            } else {
                let Some(encrypt_key) = facebook::visa_encrypt_key(registry, &receiver) else {
                    self.outbound_suspension.enqueue(&receiver, instant, "visa encrypt-key not found");
                    return SendOutcome::Suspended("visa encrypt-key not found".into())
                };
                let key_bytes = match &session.key {
                    SymmetricKey::Aes(k) => k.data.to_vec(),
                    SymmetricKey::Plain => Vec::new(),
                };
                match encrypt_key.encrypt(&key_bytes) {
                    Ok(wrapped) => secure.key_wrap = Some(KeyWrap::Single(wrapped)),
                    Err(e) => return SendOutcome::Failed(e),
                }
                session.reused = true;
            }
        }

        // Step 7: sign.
        let signature = match local_sender.sign_key.sign(&secure.data) {
            Ok(s) => s,
            Err(e) => return SendOutcome::Failed(e),
        };
        let mut reliable = ReliableMessage::new(secure, signature);
        reliable.sn = Some(instant.content.sn);
        reliable.sdt = instant.sdt;

        // Steps 8/9 (compatibility fix-ups, JSON encode, enqueue for send)
        // are the caller's responsibility via `encode_wire` + the
        // transport layer's Session/Dock, so the pipeline stays decoupled
        // from any particular wire transport.
        SendOutcome::Ok(reliable)
    }

    pub fn encode_wire(&self, msg: &ReliableMessage) -> Result<Vec<u8>> {
        compat::encode(msg)
    }

    pub async fn receive(&mut self, bytes: &[u8], registry: &mut Registry, processors: &ProcessorTable, now: f64) -> ReceiveOutcome {
        // Step 1: deserialize (length + compatibility fix-ups handled in `compat`).
        let reliable = match compat::decode(bytes) {
            Ok(r) => r,
            Err(e) => return ReceiveOutcome::Failed(e),
        };
        let sender = reliable.secure.envelope.sender.clone();
        let receiver = reliable.secure.envelope.receiver.clone();

        // First-contact Meta/Visa attachments are accepted before the
        // readiness check, since they are often what makes the sender
        // "ready" in the first place.
        if let Some(meta) = &reliable.meta {
            if meta.is_valid() && meta.matches(sender.name.as_deref(), &sender.address) {
                registry.meta_factory.put(&sender, meta_clone(meta));
            }
        }
        if let Some(visa) = &reliable.visa {
            if let Some(meta) = facebook::meta(registry, &sender) {
                registry.document_factory.accept(&sender, visa.clone(), &meta, now);
            }
        }

        // Step 2: sender readiness.
        let ready = match &reliable.visa {
            Some(visa) => visa.did == sender,
            None => facebook::visa_encrypt_key(registry, &sender).is_some(),
        };
        if !ready {
            self.inbound_suspension.enqueue(&sender, reliable, "verify key not found");
            return ReceiveOutcome::Suspended("verify key not found".into())
        }

        // Step 3: verify.
        let Some(meta) = facebook::meta(registry, &sender) else {
            return ReceiveOutcome::Failed(Error::KeyNotFound(format!("no meta for {sender}")))
        };
        if !meta.public_key.verify(&reliable.secure.data, &reliable.signature) {
            return ReceiveOutcome::Failed(Error::VerifyFailed)
        }

        // Step 4: decrypt the symmetric key.
        let Some(local_receiver) = facebook::select_local_user(registry, &receiver) else {
            return ReceiveOutcome::Failed(Error::KeyNotFound(format!("no local user for {receiver}")))
        };
        let fingerprint = session_fingerprint(&sender, &receiver, reliable.secure.envelope.group.as_ref());
        let symmetric_key = match self.resolve_symmetric_key(&reliable.secure, local_receiver.decrypt_keys.as_slice(), &fingerprint) {
            Ok(k) => k,
            Err(e) => return ReceiveOutcome::Failed(e),
        };

        // Step 5: decrypt content.
        let plaintext = match symmetric_key.decrypt(&reliable.secure.data, &reliable.secure.extra) {
            Ok(p) => p,
            Err(e) => return ReceiveOutcome::Failed(e),
        };
        let content_value: serde_json::Value = match serde_json::from_slice(&plaintext) {
            Ok(v) => v,
            Err(e) => return ReceiveOutcome::Failed(Error::Serialize(e)),
        };
        let content = match Content::from_json(content_value) {
            Ok(c) => c,
            Err(e) => return ReceiveOutcome::Failed(e),
        };

        // Step 6: dispatch.
        let envelope = reliable.secure.envelope.clone();
        let responses = match processors.dispatch(&content, &envelope, registry).await {
            Ok(r) => r,
            Err(e) => return ReceiveOutcome::Failed(e),
        };

        // Step 7: profile sync side-effect.
        if let Some(sdt) = reliable.sdt {
            if registry.entity_checker.recent.is_expired(sender.as_str(), TimeKind::Document, sdt)
                && registry.entity_checker.frequency.try_query(sender.as_str(), QueryKind::Docs, now)
            {
                self.profile_refresh_queue.push(sender.clone());
            }
        }

        ReceiveOutcome::Ok { content, responses }
    }

    fn resolve_symmetric_key(&mut self, secure: &SecureMessage, decrypt_keys: &[PrivateKey], fingerprint: &str) -> Result<SymmetricKey> {
        match &secure.key_wrap {
            None => Ok(SymmetricKey::Plain),
            Some(KeyWrap::Single(wrapped)) => {
                for candidate in decrypt_keys {
                    if let Ok(key_bytes) = candidate.decrypt(wrapped) {
                        let key = SymmetricKey::Aes(crate::crypto::aes::AesKey::from_bytes(&key_bytes)?);
                        let mut session = SessionKey { key: key.clone(), reused: true, digest: None };
                        session.digest = session.compute_digest();
                        self.session_keys.insert(fingerprint.to_string(), session);
                        return Ok(key)
                    }
                }
                Err(Error::KeyNotFound("no decrypt key unwrapped the session key".into()))
            }
            Some(KeyWrap::Many(map)) => {
                for wrapped in map.values() {
                    for candidate in decrypt_keys {
                        if let Ok(key_bytes) = candidate.decrypt(wrapped) {
                            let key = SymmetricKey::Aes(crate::crypto::aes::AesKey::from_bytes(&key_bytes)?);
                            let mut session = SessionKey { key: key.clone(), reused: true, digest: None };
                            session.digest = session.compute_digest();
                            self.session_keys.insert(fingerprint.to_string(), session);
                            return Ok(key)
                        }
                    }
                }
                Err(Error::KeyNotFound("no decrypt key unwrapped the session key".into()))
            }
            Some(KeyWrap::DigestOnly(digest)) => match self.session_keys.get(fingerprint) {
                Some(session) if session.digest.as_deref() == Some(digest.as_slice()) => Ok(session.key.clone()),
                _ => Err(Error::KeyNotFound("session key not cached for digest-only message".into())),
            },
        }
    }
}

/// `Meta` has no `Clone` derive (its address cache is a `RefCell`); build
/// an independent copy for the registry's own cache entry.
fn meta_clone(meta: &crate::mkm::meta::Meta) -> crate::mkm::meta::Meta {
    crate::mkm::meta::Meta::new(meta.meta_type, meta.public_key.clone(), meta.seed.clone(), meta.fingerprint.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dkd::envelope::Envelope,
        mkm::meta::{Meta, MetaType},
        registry::LocalUser,
    };

    fn user(seed: &str) -> (PrivateKey, Identifier) {
        let sk = PrivateKey::generate_rsa().unwrap();
        let sign_sk = PrivateKey::generate_ecc();
        let meta = Meta::generate(MetaType::Mkm, &sign_sk, Some(seed.to_string())).unwrap();
        let id = Identifier::new(Some(seed.to_string()), meta.generate_address(0), None);
        (sk, id)
    }

    fn visa_data(encrypt_key: &crate::crypto::PublicKey) -> String {
        serde_json::json!({ "encrypt_key": key_map(encrypt_key) }).to_string()
    }

    fn key_map(key: &crate::crypto::PublicKey) -> serde_json::Value {
        serde_json::to_value(key.to_map()).unwrap()
    }

    fn setup() -> (Registry, Identifier, Identifier, PrivateKey, PrivateKey) {
        let mut registry = Registry::new();

        let alice_sign = PrivateKey::generate_ecc();
        let alice_meta = Meta::generate(MetaType::Mkm, &alice_sign, Some("alice".into())).unwrap();
        let alice = Identifier::new(Some("alice".into()), alice_meta.generate_address(0), None);
        registry.meta_factory.put(&alice, meta_clone(&alice_meta));
        registry.add_local_user(LocalUser::new(alice.clone(), alice_sign.clone(), vec![]));

        let bob_sign = PrivateKey::generate_ecc();
        let bob_meta = Meta::generate(MetaType::Mkm, &bob_sign, Some("bob".into())).unwrap();
        let bob = Identifier::new(Some("bob".into()), bob_meta.generate_address(0), None);
        registry.meta_factory.put(&bob, meta_clone(&bob_meta));
        let bob_decrypt = PrivateKey::generate_rsa().unwrap();
        registry.add_local_user(LocalUser::new(bob.clone(), bob_sign, vec![bob_decrypt.clone()]));

        let visa = crate::mkm::document::Document::sign(
            bob.clone(),
            crate::mkm::document::DocumentType::Visa,
            visa_data(&bob_decrypt.public_key()),
            1.0,
            &registry.local_user(&bob).unwrap().sign_key,
        )
        .unwrap();
        registry.document_factory.accept(&bob, visa, &bob_meta, 100.0);

        (registry, alice, bob, alice_sign, bob_decrypt)
    }

    #[test]
    fn full_round_trip_encrypt_sign_verify_decrypt() {
        smol::block_on(async {
            let (mut registry, alice, bob, _alice_sign, _bob_decrypt) = setup();
            let mut messenger = Messenger::new();

            let sn = messenger.sn_generator.generate();
            let mut content = Content::new("text", sn);
            content.extra.insert("text".into(), serde_json::Value::String("hello bob".into()));
            let envelope = Envelope::new(alice.clone(), bob.clone(), Some(1.0));
            let instant = InstantMessage::new(envelope, content);

            let outcome = messenger.send(instant, &registry).await;
            let reliable = match outcome {
                SendOutcome::Ok(r) => r,
                other => panic!("expected Ok, got {other:?}"),
            };
            let bytes = messenger.encode_wire(&reliable).unwrap();

            let processors = ProcessorTable::new();
            let outcome = messenger.receive(&bytes, &mut registry, &processors, 100.0).await;
            match outcome {
                ReceiveOutcome::Ok { content, .. } => {
                    assert_eq!(content.extra.get("text").unwrap().as_str(), Some("hello bob"));
                }
                other => panic!("expected Ok, got {other:?}"),
            }
        })
    }

    #[test]
    fn loopback_is_dropped() {
        smol::block_on(async {
            let (registry, alice, _bob, _a, _b) = setup();
            let mut messenger = Messenger::new();
            let sn = messenger.sn_generator.generate();
            let content = Content::new("text", sn);
            let envelope = Envelope::new(alice.clone(), alice.clone(), None);
            let instant = InstantMessage::new(envelope, content);
            let outcome = messenger.send(instant, &registry).await;
            assert!(matches!(outcome, SendOutcome::Dropped(_)));
        })
    }

    #[test]
    fn missing_visa_suspends_send() {
        smol::block_on(async {
            let mut registry = Registry::new();
            let (sk, alice) = user("alice");
            registry.add_local_user(LocalUser::new(alice.clone(), PrivateKey::generate_ecc(), vec![]));
            let (_, carol) = user("carol");
            let _ = sk;

            let mut messenger = Messenger::new();
            let sn = messenger.sn_generator.generate();
            let content = Content::new("text", sn);
            let envelope = Envelope::new(alice, carol, None);
            let instant = InstantMessage::new(envelope, content);
            let outcome = messenger.send(instant, &registry).await;
            assert!(matches!(outcome, SendOutcome::Suspended(_)));
            assert_eq!(messenger.outbound_suspension.len(), 1);
        })
    }

    #[test]
    fn tampered_signature_fails_verification() {
        smol::block_on(async {
            let (mut registry, alice, bob, _a, _b) = setup();
            let mut messenger = Messenger::new();
            let sn = messenger.sn_generator.generate();
            let content = Content::new("text", sn);
            let envelope = Envelope::new(alice, bob, None);
            let instant = InstantMessage::new(envelope, content);
            let reliable = match messenger.send(instant, &registry).await {
                SendOutcome::Ok(r) => r,
                other => panic!("expected Ok, got {other:?}"),
            };
            let mut bytes_value: serde_json::Value = serde_json::from_slice(&messenger.encode_wire(&reliable).unwrap()).unwrap();
            bytes_value["signature"] = serde_json::Value::String(crate::crypto::encoding::base64_encode(b"tampered"));
            let bytes = serde_json::to_vec(&bytes_value).unwrap();

            let processors = ProcessorTable::new();
            let outcome = messenger.receive(&bytes, &mut registry, &processors, 0.0).await;
            assert!(matches!(outcome, ReceiveOutcome::Failed(Error::VerifyFailed)));
        })
    }
}
