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

//! Document: a signed profile map (spec §3). `Visa` (user) and `Bulletin`
//! (group) are the two concrete kinds the core cares about; `Profile` and
//! `*` exist for completeness but carry no extra structure here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{id::Identifier, meta::Meta};
use crate::error::Result;

/// Future-timestamp guard: a document more than this far ahead of "now"
/// is rejected outright (spec §3, §4.4.5).
pub const FUTURE_TOLERANCE_SECS: f64 = 30.0 * 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentType {
    Visa,
    Bulletin,
    Profile,
    #[serde(rename = "*")]
    Any,
}

impl DocumentType {
    /// Defaulted from the owning ID's kind: user -> Visa, group -> Bulletin,
    /// else Profile.
    pub fn default_for(id: &Identifier) -> Self {
        if id.is_user() {
            Self::Visa
        } else if id.is_group() {
            Self::Bulletin
        } else {
            Self::Profile
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub did: Identifier,
    pub doc_type: DocumentType,
    /// The signed payload, carried as a JSON string on the wire (spec §3).
    pub data: String,
    pub signature: Vec<u8>,
    pub time: f64,
}

impl Document {
    pub fn new(did: Identifier, doc_type: DocumentType, data: String, signature: Vec<u8>, time: f64) -> Self {
        Self { did, doc_type, data, signature, time }
    }

    fn signed_bytes(&self) -> Vec<u8> {
        self.data.as_bytes().to_vec()
    }

    pub fn sign(did: Identifier, doc_type: DocumentType, data: String, time: f64, private_key: &crate::crypto::PrivateKey) -> Result<Self> {
        let signature = private_key.sign(data.as_bytes())?;
        Ok(Self::new(did, doc_type, data, signature, time))
    }

    /// (i) timestamp not more than 30 minutes in the future, (ii)
    /// signature verifies under the known Meta's public key.
    pub fn is_valid(&self, meta: &Meta, now: f64) -> bool {
        if self.time > now + FUTURE_TOLERANCE_SECS {
            return false
        }
        meta.public_key.verify(&self.signed_bytes(), &self.signature)
    }

    /// (iii) no stored document of the same type has a strictly greater
    /// timestamp — i.e. this document is expired relative to `other`.
    pub fn is_expired_relative_to(&self, other: &Document) -> bool {
        other.doc_type == self.doc_type && other.time > self.time
    }

    /// The `EncryptKey` a Visa carries for wrapping symmetric session
    /// keys, parsed out of the JSON `data` payload under `"encrypt_key"`.
    pub fn encrypt_key(&self) -> Result<Option<crate::crypto::PublicKey>> {
        if self.doc_type != DocumentType::Visa {
            return Ok(None)
        }
        let parsed: Value = serde_json::from_str(&self.data)?;
        match parsed.get("encrypt_key") {
            Some(Value::Object(_)) => {
                let map: crate::crypto::keys::KeyMap =
                    serde_json::from_value(parsed["encrypt_key"].clone())?;
                Ok(Some(crate::crypto::PublicKey::from_map(&map)?))
            }
            _ => Ok(None),
        }
    }

    /// Name carried in the document body, if any, for anonymous-naming
    /// fallback (spec §4.2).
    pub fn name(&self) -> Option<String> {
        let parsed: Value = serde_json::from_str(&self.data).ok()?;
        parsed.get("name").and_then(Value::as_str).map(str::to_string)
    }
}

/// Accepts a document into a per-ID, per-type "latest" store, applying
/// spec §4.4.5's acceptance rule. Returns `true` if accepted, `false` if
/// silently dropped (violating invariant iii, or invalid per i/ii).
pub fn accept_document(store: &mut Vec<Document>, candidate: Document, meta: &Meta, now: f64) -> bool {
    if !candidate.is_valid(meta, now) {
        return false
    }
    if store.iter().any(|d| candidate.is_expired_relative_to(d)) {
        return false
    }
    store.retain(|d| d.doc_type != candidate.doc_type || d.time < candidate.time);
    store.push(candidate);
    true
}

/// The document of type `t` with the maximum `time` among the stored set.
pub fn latest_of_type(store: &[Document], doc_type: DocumentType) -> Option<&Document> {
    store.iter().filter(|d| d.doc_type == doc_type).max_by(|a, b| a.time.total_cmp(&b.time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        crypto::PrivateKey,
        mkm::meta::MetaType,
    };

    fn make_identity() -> (PrivateKey, Meta, Identifier) {
        let sk = PrivateKey::generate_ecc();
        let meta = Meta::generate(MetaType::Btc, &sk, None).unwrap();
        let addr = meta.generate_address(0);
        let id = Identifier::new(None, addr, None);
        (sk, meta, id)
    }

    #[test]
    fn valid_visa_accepted_and_superseded() {
        let (sk, meta, id) = make_identity();
        let older = Document::sign(id.clone(), DocumentType::Visa, "{\"name\":\"alice\"}".into(), 100.0, &sk).unwrap();
        let newer = Document::sign(id.clone(), DocumentType::Visa, "{\"name\":\"alice2\"}".into(), 200.0, &sk).unwrap();

        let mut store = Vec::new();
        assert!(accept_document(&mut store, older.clone(), &meta, 1_000.0));
        assert!(accept_document(&mut store, newer.clone(), &meta, 1_000.0));
        assert_eq!(store.len(), 1);
        assert_eq!(latest_of_type(&store, DocumentType::Visa).unwrap().time, 200.0);

        // A stale resend of `older` is now expired relative to what we hold.
        assert!(!accept_document(&mut store, older, &meta, 1_000.0));
    }

    #[test]
    fn future_timestamp_rejected() {
        let (sk, meta, id) = make_identity();
        let doc = Document::sign(id, DocumentType::Visa, "{}".into(), 10_000.0, &sk).unwrap();
        let mut store = Vec::new();
        assert!(!accept_document(&mut store, doc, &meta, 0.0));
    }

    #[test]
    fn bad_signature_rejected() {
        let (sk, meta, id) = make_identity();
        let mut doc = Document::sign(id, DocumentType::Visa, "{}".into(), 1.0, &sk).unwrap();
        doc.signature[0] ^= 0xff;
        let mut store = Vec::new();
        assert!(!accept_document(&mut store, doc, &meta, 100.0));
    }

    #[test]
    fn default_type_from_id_kind() {
        let id = Identifier::parse("ANYWHERE").unwrap();
        // ANYWHERE is broadcast, neither user nor group -> Profile.
        assert_eq!(DocumentType::default_for(&id), DocumentType::Profile);
        let id = Identifier::parse("EVERYWHERE").unwrap();
        assert_eq!(DocumentType::default_for(&id), DocumentType::Bulletin);
    }
}
