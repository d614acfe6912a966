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

//! SecureMessage: `Envelope ∪ {data, key?, keys?}` (spec §3). `data` is the
//! symmetric ciphertext of the content; `key`/`keys` carry the
//! recipient-encrypted symmetric key(s). Exactly one of `key`/`keys` is
//! populated per recipient resolution.

use std::collections::HashMap;

use super::envelope::Envelope;
use crate::mkm::id::Identifier;

#[derive(Debug, Clone)]
pub enum KeyWrap {
    /// A single wrapped key, used for a 1:1 message.
    Single(Vec<u8>),
    /// Per-recipient wrapped keys for multi-recipient delivery, plus an
    /// optional `digest`-only reuse marker (spec §3, §6).
    Many(HashMap<String, Vec<u8>>),
    /// `{digest}` only: the cached symmetric key from a prior message is
    /// being reused; no per-recipient wraps are carried.
    DigestOnly(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct SecureMessage {
    pub envelope: Envelope,
    pub data: Vec<u8>,
    pub key_wrap: Option<KeyWrap>,
    /// Out-of-band parameters produced by the symmetric cipher (e.g. the
    /// AES IV), carried alongside `data` so the receiver can decrypt.
    pub extra: HashMap<String, String>,
}

impl SecureMessage {
    pub fn new(envelope: Envelope, data: Vec<u8>) -> Self {
        Self { envelope, data, key_wrap: None, extra: HashMap::new() }
    }

    pub fn recipient(&self) -> &Identifier {
        &self.envelope.receiver
    }
}
