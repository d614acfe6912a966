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

//! Key material is carried on the wire as a JSON map whose canonical keys
//! are `algorithm` and `data` (Base64). Parsing dispatches on `algorithm`;
//! both the canonical name and legacy lowercase/numeric aliases are
//! accepted (spec §9 open question on legacy aliases) — unknown algorithm
//! strings are a hard parse failure, never a silent default.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{Error, Result};

/// The wire form of a key: `{"algorithm": "...", "data": "<base64>", ...}`.
pub type KeyMap = HashMap<String, Value>;

/// Extra out-of-band parameters threaded through encrypt/decrypt calls
/// (currently just the AES IV, spec §4.1).
pub type Extra = HashMap<String, String>;

pub fn map_get_str<'a>(map: &'a KeyMap, key: &str) -> Result<&'a str> {
    map.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Validation(format!("key map missing '{key}'")))
}

pub fn map_get_data(map: &KeyMap) -> Result<Vec<u8>> {
    super::encoding::base64_decode(map_get_str(map, "data")?)
}

/// Canonicalizes an algorithm name. Accepts the canonical spelling, an
/// all-lowercase alias, and (for the handful of algorithms that had a
/// historical numeric code) the numeric string form. Anything else is a
/// hard parse failure — never silently defaulted.
pub fn normalize_algorithm(raw: &str) -> Result<&'static str> {
    match raw {
        "AES" | "aes" => Ok("AES"),
        "RSA" | "rsa" => Ok("RSA"),
        "ECC" | "ecc" | "ECDSA" | "ecdsa" => Ok("ECC"),
        "PLAIN" | "plain" | "0" => Ok("PLAIN"),
        other => Err(Error::Validation(format!("unknown algorithm: {other}"))),
    }
}

/// The null cipher. Used exclusively when the receiver is the broadcast
/// address, so the pipeline's must-encrypt contract holds uniformly
/// without a special case at every call site (spec §4.1).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlainKey;

impl PlainKey {
    pub fn encrypt(&self, plaintext: &[u8], _extra: &mut Extra) -> Vec<u8> {
        plaintext.to_vec()
    }

    pub fn decrypt(&self, ciphertext: &[u8], _extra: &Extra) -> Vec<u8> {
        ciphertext.to_vec()
    }

    pub fn to_map(&self) -> KeyMap {
        let mut m = KeyMap::new();
        m.insert("algorithm".into(), Value::String("PLAIN".into()));
        m
    }
}
