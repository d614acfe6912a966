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

//! ReliableMessage: `SecureMessage ∪ {signature}`, optionally carrying
//! `meta`/`visa` first-contact attachments plus `SDT`/`sn` sync fields
//! (spec §3).

use super::secure::SecureMessage;
use crate::mkm::{document::Document, meta::Meta};

#[derive(Debug, Clone)]
pub struct ReliableMessage {
    pub secure: SecureMessage,
    pub signature: Vec<u8>,
    pub meta: Option<Meta>,
    pub visa: Option<Document>,
    /// Sender-document-time: lets the receiver detect a stale local Visa
    /// without an extra round trip (spec §4.4.2 step 7).
    pub sdt: Option<f64>,
    /// Echoed plaintext serial number, carried for synchronization.
    pub sn: Option<u32>,
}

impl ReliableMessage {
    pub fn new(secure: SecureMessage, signature: Vec<u8>) -> Self {
        Self { secure, signature, meta: None, visa: None, sdt: None, sn: None }
    }

    pub fn signed_bytes(&self) -> Vec<u8> {
        self.secure.data.clone()
    }
}
