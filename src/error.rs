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

use thiserror::Error;

/// Crate-wide result alias, threaded through every public function.
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error taxonomy. See spec §7 for the abstract error kinds this
/// mirrors. Readiness-pending and signature-failure outcomes that the
/// pipeline recovers from on its own are *not* represented here — they
/// surface through `SendOutcome`/`ReceiveOutcome` instead, since returning
/// `Err` for a recoverable, expected condition would force every caller to
/// pattern-match exceptions instead of reading a result enum.
#[derive(Error, Debug)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("signature or decryption verification failed")]
    VerifyFailed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("sender equals receiver (loopback)")]
    Loopback,

    #[error("content not uploaded")]
    NotUploaded,

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("channel closed")]
    ChannelClosed,
}
