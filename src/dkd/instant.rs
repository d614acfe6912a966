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

//! InstantMessage: `Envelope ∪ {content}`, plaintext (spec §3).

use super::{content::Content, envelope::Envelope};

#[derive(Debug, Clone)]
pub struct InstantMessage {
    pub envelope: Envelope,
    pub content: Content,
    /// Sender-document-time, attached when the content is not a Command
    /// (spec §4.4.1 step 1) so the receiver can detect a stale local Visa.
    pub sdt: Option<f64>,
}

impl InstantMessage {
    pub fn new(envelope: Envelope, content: Content) -> Self {
        Self { envelope, content, sdt: None }
    }
}
