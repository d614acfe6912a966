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

//! Message model (DKD): Content, Envelope, and the Instant/Secure/Reliable
//! progression a message passes through on its way to the wire (spec §4.3).

pub mod content;
pub mod envelope;
pub mod instant;
pub mod reliable;
pub mod secure;
pub mod serial_number;

pub use content::Content;
pub use envelope::Envelope;
pub use instant::InstantMessage;
pub use reliable::ReliableMessage;
pub use secure::{KeyWrap, SecureMessage};
pub use serial_number::SerialNumberGenerator;
