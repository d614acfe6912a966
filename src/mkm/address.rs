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

//! Address: a canonical string with a network-type byte (spec §3).
//!
//! Three variants: BTC-style (Base58, 26-35 chars), ETH-style (`0x` + 40
//! hex chars with EIP-55 case folding, 42 chars), and the two constant
//! addresses `ANYWHERE`/`EVERYWHERE`. Parse discrimination is by length.

use crate::{
    crypto::{
        digest::{keccak256, ripemd160, sha256, sha256d},
        encoding::{base58_decode, base58_encode, hex_decode, hex_encode},
    },
    error::{Error, Result},
};

pub const ANYWHERE: &str = "ANYWHERE";
pub const EVERYWHERE: &str = "EVERYWHERE";

/// Network-type byte. Any value is legal; a handful are conventional
/// (0x00 main user network, 0x01 group network) but the core treats the
/// byte opaquely beyond the `is_user`/`is_group` checks on `Meta`/`ID`.
pub type Network = u8;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Address {
    Btc { network: Network, hash: [u8; 20], text: String },
    Eth { text: String },
    Constant(&'static str),
}

impl Address {
    pub fn network(&self) -> Network {
        match self {
            Self::Btc { network, .. } => *network,
            Self::Eth { .. } => 0x04,
            Self::Constant(ANYWHERE) => 0x00,
            Self::Constant(_) => 0x01,
        }
    }

    pub fn is_broadcast(&self) -> bool {
        matches!(self, Self::Constant(_))
    }

    pub fn is_user(&self) -> bool {
        !self.is_broadcast() && self.network() & 0x01 == 0
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Constant(EVERYWHERE)) || (!self.is_broadcast() && self.network() & 0x01 == 1)
    }

    pub fn anywhere() -> Self {
        Self::Constant(ANYWHERE)
    }

    pub fn everywhere() -> Self {
        Self::Constant(EVERYWHERE)
    }

    /// BTC-style: `Base58(network(1) ‖ RIPEMD160(SHA256(fingerprint))(20) ‖ check4)`,
    /// `check4` = first four bytes of `SHA256(SHA256(network ‖ hash))`.
    pub fn from_fingerprint_btc(network: Network, fingerprint: &[u8]) -> Self {
        let hash = ripemd160(&sha256(fingerprint));
        Self::from_network_hash_btc(network, hash)
    }

    fn from_network_hash_btc(network: Network, hash: [u8; 20]) -> Self {
        let mut payload = Vec::with_capacity(1 + 20 + 4);
        payload.push(network);
        payload.extend_from_slice(&hash);
        let check = sha256d(&payload);
        payload.extend_from_slice(&check[..4]);
        let text = base58_encode(&payload);
        Self::Btc { network, hash, text }
    }

    /// ETH-style: `0x` + hex of the last 20 bytes of
    /// `KECCAK256(publicKey_uncompressed_64)`, EIP-55 case-folded.
    pub fn from_public_key_eth(uncompressed_64: &[u8; 64]) -> Self {
        let digest = keccak256(uncompressed_64);
        let tail = &digest[12..];
        Self::Eth { text: eip55_checksum(tail) }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            ANYWHERE => Ok(Self::Constant(ANYWHERE)),
            EVERYWHERE => Ok(Self::Constant(EVERYWHERE)),
            _ => match s.len() {
                26..=35 => Self::parse_btc(s),
                42 => Self::parse_eth(s),
                n => Err(Error::Validation(format!("address length {n} matches no known format"))),
            },
        }
    }

    fn parse_btc(s: &str) -> Result<Self> {
        let payload = base58_decode(s)?;
        if payload.len() != 25 {
            return Err(Error::Validation(format!("BTC address payload must be 25 bytes, got {}", payload.len())))
        }
        let network = payload[0];
        let hash: [u8; 20] = payload[1..21].try_into().unwrap();
        let check = &payload[21..25];
        let expect = sha256d(&payload[..21]);
        if check != &expect[..4] {
            return Err(Error::Validation("BTC address checksum mismatch".into()))
        }
        Ok(Self::Btc { network, hash, text: s.to_string() })
    }

    fn parse_eth(s: &str) -> Result<Self> {
        if !s.starts_with("0x") || s.len() != 42 {
            return Err(Error::Validation("ETH address must be 0x + 40 hex chars".into()))
        }
        let lower = s.to_ascii_lowercase();
        let bytes = hex_decode(&lower)?;
        if bytes.len() != 20 {
            return Err(Error::Validation("ETH address must decode to 20 bytes".into()))
        }
        if s != eip55_checksum(&bytes) {
            return Err(Error::Validation("ETH address fails EIP-55 checksum".into()))
        }
        Ok(Self::Eth { text: s.to_string() })
    }

    pub fn is_valid(s: &str) -> bool {
        Self::parse(s).is_ok()
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Btc { text, .. } => write!(f, "{text}"),
            Self::Eth { text } => write!(f, "{text}"),
            Self::Constant(s) => write!(f, "{s}"),
        }
    }
}

/// EIP-55: a hex digit is uppercased iff the corresponding nibble of
/// `KECCAK256(lowercase_hex)` is >= 8.
fn eip55_checksum(addr_bytes: &[u8]) -> String {
    let lower_hex = hex_encode(addr_bytes);
    let hash = keccak256(lower_hex.as_bytes());
    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower_hex.chars().enumerate() {
        if c.is_ascii_digit() {
            out.push(c);
            continue
        }
        let nibble = if i % 2 == 0 { hash[i / 2] >> 4 } else { hash[i / 2] & 0x0f };
        if nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}
