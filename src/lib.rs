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

//! `dimcore`: the transport and message pipeline at the core of a
//! decentralized, end-to-end encrypted instant-messaging SDK.
//!
//! Three layers, leaves-first:
//!
//! - [`crypto`]: AES/RSA/ECDSA primitives, digests, and wire encoders.
//! - [`mkm`]: self-sovereign identity — addresses, metas, IDs, documents.
//! - [`dkd`]: the plaintext/encrypted/signed message lifecycle.
//! - [`pipeline`]: Messenger send/receive, Packer readiness gating,
//!   Processor dispatch, the Facebook identity facade, EntityChecker rate
//!   limiting.
//! - [`transport`]: the connection state machine, the Dock, the Porter,
//!   the Hub, and the self-healing ActiveConnection driver.
//!
//! Storage backends, CLI/UI/log sinks, plaintext content subclasses, and
//! the alias/name-service lookup are external collaborators this crate
//! only references through interfaces — see `registry::Registry` and
//! `pipeline::processor::ContentProcessor`.

#[cfg(feature = "crypto")]
pub mod crypto;
#[cfg(feature = "dkd")]
pub mod dkd;
pub mod error;
#[cfg(feature = "mkm")]
pub mod mkm;
#[cfg(feature = "pipeline")]
pub mod pipeline;
pub mod registry;
#[cfg(feature = "transport")]
pub mod transport;

pub use error::{Error, Result};
