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

//! Wire frame codec (spec §6): JSON objects, UTF-8, one per delivery.
//! `to_wire`/`from_wire` apply the same compatibility fix-ups on both the
//! send and receive path, so a frame that came from either an older or a
//! newer release still parses identically on both ends.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::{
    crypto::encoding::{base64_decode, base64_encode},
    dkd::{
        envelope::Envelope,
        reliable::ReliableMessage,
        secure::{KeyWrap, SecureMessage},
    },
    error::{Error, Result},
    mkm::{
        document::{Document, DocumentType},
        id::Identifier,
        meta::{Meta, MetaType},
    },
};

/// Renames legacy wire keys to their current canonical form. Applied
/// identically on send (just before encode) and receive (just after
/// parse) per spec §4.4.1 step 8 / §4.4.2 step 1.
fn fix_compatibility(obj: &mut Map<String, Value>) {
    if let Some(v) = obj.remove("from") {
        obj.entry("sender".to_string()).or_insert(v);
    }
    if let Some(v) = obj.remove("to") {
        obj.entry("receiver".to_string()).or_insert(v);
    }
    if let Some(v) = obj.remove("document") {
        obj.entry("visa".to_string()).or_insert(v);
    }
    if let Some(v) = obj.remove("signature_") {
        obj.entry("signature".to_string()).or_insert(v);
    }
}

pub fn encode(msg: &ReliableMessage) -> Result<Vec<u8>> {
    let mut obj = Map::new();
    obj.insert("sender".into(), Value::String(msg.secure.envelope.sender.as_str().to_string()));
    obj.insert("receiver".into(), Value::String(msg.secure.envelope.receiver.as_str().to_string()));
    if let Some(t) = msg.secure.envelope.time {
        obj.insert("time".into(), Value::from(t));
    }
    if let Some(g) = &msg.secure.envelope.group {
        obj.insert("group".into(), Value::String(g.as_str().to_string()));
    }
    obj.insert("data".into(), Value::String(base64_encode(&msg.secure.data)));
    if !msg.secure.extra.is_empty() {
        obj.insert("params".into(), serde_json::to_value(&msg.secure.extra)?);
    }
    match &msg.secure.key_wrap {
        Some(KeyWrap::Single(k)) => {
            obj.insert("key".into(), Value::String(base64_encode(k)));
        }
        Some(KeyWrap::Many(map)) => {
            let mut keys = Map::new();
            for (id, k) in map {
                keys.insert(id.clone(), Value::String(base64_encode(k)));
            }
            obj.insert("keys".into(), Value::Object(keys));
        }
        Some(KeyWrap::DigestOnly(digest)) => {
            let mut keys = Map::new();
            keys.insert("digest".into(), Value::String(base64_encode(digest)));
            obj.insert("keys".into(), Value::Object(keys));
        }
        None => {}
    }
    obj.insert("signature".into(), Value::String(base64_encode(&msg.signature)));
    if let Some(meta) = &msg.meta {
        obj.insert("meta".into(), meta_to_json(meta));
    }
    if let Some(visa) = &msg.visa {
        obj.insert("visa".into(), document_to_json(visa));
    }
    if let Some(sdt) = msg.sdt {
        obj.insert("SDT".into(), Value::from(sdt));
    }
    if let Some(sn) = msg.sn {
        obj.insert("sn".into(), Value::from(sn));
    }
    fix_compatibility(&mut obj);
    Ok(serde_json::to_vec(&Value::Object(obj))?)
}

/// Rejects frames of length <= 8 bytes outright (spec §4.4.2 step 1).
pub fn decode(bytes: &[u8]) -> Result<ReliableMessage> {
    if bytes.len() <= 8 {
        return Err(Error::Validation("frame too short".into()))
    }
    let value: Value = serde_json::from_slice(bytes)?;
    let Value::Object(mut obj) = value else {
        return Err(Error::Validation("wire frame must be a JSON object".into()))
    };
    fix_compatibility(&mut obj);

    let sender = Identifier::parse(str_field(&obj, "sender")?)?;
    let receiver = Identifier::parse(str_field(&obj, "receiver")?)?;
    let time = obj.get("time").and_then(Value::as_f64);
    let group = match obj.get("group").and_then(Value::as_str) {
        Some(s) => Some(Identifier::parse(s)?),
        None => None,
    };
    let mut envelope = Envelope::new(sender, receiver, time);
    if let Some(g) = group {
        envelope = envelope.with_group(g);
    }

    let data = base64_decode(str_field(&obj, "data")?)?;
    let extra: HashMap<String, String> = match obj.get("params") {
        Some(v) => serde_json::from_value(v.clone())?,
        None => HashMap::new(),
    };

    let mut secure = SecureMessage::new(envelope, data);
    secure.extra = extra;
    secure.key_wrap = parse_key_wrap(&obj)?;

    let signature = base64_decode(str_field(&obj, "signature")?)?;
    let mut reliable = ReliableMessage::new(secure, signature);

    if let Some(meta_val) = obj.get("meta") {
        reliable.meta = Some(meta_from_json(meta_val)?);
    }
    if let Some(visa_val) = obj.get("visa") {
        reliable.visa = Some(document_from_json(visa_val)?);
    }
    reliable.sdt = obj.get("SDT").and_then(Value::as_f64);
    reliable.sn = obj.get("sn").and_then(Value::as_u64).map(|v| v as u32);

    Ok(reliable)
}

fn parse_key_wrap(obj: &Map<String, Value>) -> Result<Option<KeyWrap>> {
    if let Some(Value::String(s)) = obj.get("key") {
        return Ok(Some(KeyWrap::Single(base64_decode(s)?)))
    }
    if let Some(Value::Object(keys)) = obj.get("keys") {
        if keys.len() == 1 {
            if let Some(Value::String(digest)) = keys.get("digest") {
                return Ok(Some(KeyWrap::DigestOnly(base64_decode(digest)?)))
            }
        }
        let mut map = HashMap::new();
        for (id, v) in keys {
            if id == "digest" {
                continue
            }
            if let Value::String(s) = v {
                map.insert(id.clone(), base64_decode(s)?);
            }
        }
        return Ok(Some(KeyWrap::Many(map)))
    }
    Ok(None)
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Validation(format!("wire frame missing '{key}'")))
}

fn meta_to_json(meta: &Meta) -> Value {
    let mut m = Map::new();
    m.insert("type".into(), Value::from(meta.meta_type as u8));
    m.insert("publicKey".into(), serde_json::to_value(meta.public_key.to_map()).unwrap_or(Value::Null));
    if let Some(seed) = &meta.seed {
        m.insert("seed".into(), Value::String(seed.clone()));
    }
    if let Some(fp) = &meta.fingerprint {
        m.insert("fingerprint".into(), Value::String(base64_encode(fp)));
    }
    Value::Object(m)
}

fn meta_from_json(value: &Value) -> Result<Meta> {
    let obj = value.as_object().ok_or_else(|| Error::Validation("meta must be an object".into()))?;
    let meta_type = obj
        .get("type")
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::Validation("meta missing 'type'".into()))?;
    let meta_type = MetaType::from_u8(meta_type as u8)?;
    let key_map = obj
        .get("publicKey")
        .ok_or_else(|| Error::Validation("meta missing 'publicKey'".into()))?
        .clone();
    let key_map: crate::crypto::keys::KeyMap = serde_json::from_value(key_map)?;
    let public_key = crate::crypto::PublicKey::from_map(&key_map)?;
    let seed = obj.get("seed").and_then(Value::as_str).map(str::to_string);
    let fingerprint = match obj.get("fingerprint").and_then(Value::as_str) {
        Some(s) => Some(base64_decode(s)?),
        None => None,
    };
    Ok(Meta::new(meta_type, public_key, seed, fingerprint))
}

fn document_to_json(doc: &Document) -> Value {
    let mut m = Map::new();
    m.insert("did".into(), Value::String(doc.did.as_str().to_string()));
    let type_str = match doc.doc_type {
        DocumentType::Visa => "VISA",
        DocumentType::Bulletin => "BULLETIN",
        DocumentType::Profile => "PROFILE",
        DocumentType::Any => "*",
    };
    m.insert("type".into(), Value::String(type_str.into()));
    m.insert("data".into(), Value::String(doc.data.clone()));
    m.insert("signature".into(), Value::String(base64_encode(&doc.signature)));
    m.insert("time".into(), Value::from(doc.time));
    Value::Object(m)
}

fn document_from_json(value: &Value) -> Result<Document> {
    let obj = value.as_object().ok_or_else(|| Error::Validation("document must be an object".into()))?;
    let did = Identifier::parse(
        obj.get("did").and_then(Value::as_str).ok_or_else(|| Error::Validation("document missing 'did'".into()))?,
    )?;
    let doc_type = match obj.get("type").and_then(Value::as_str) {
        Some("VISA") => DocumentType::Visa,
        Some("BULLETIN") => DocumentType::Bulletin,
        Some("PROFILE") => DocumentType::Profile,
        Some(_) => DocumentType::Any,
        None => DocumentType::default_for(&did),
    };
    let data = obj
        .get("data")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Validation("document missing 'data'".into()))?
        .to_string();
    let signature = base64_decode(
        obj.get("signature").and_then(Value::as_str).ok_or_else(|| Error::Validation("document missing 'signature'".into()))?,
    )?;
    let time = obj.get("time").and_then(Value::as_f64).ok_or_else(|| Error::Validation("document missing 'time'".into()))?;
    Ok(Document::new(did, doc_type, data, signature, time))
}
