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

//! Wire encoders: Base58 (BTC addresses), Base64 (key material, wire
//! payloads), Hex (ETH addresses, debug printing).

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};

use crate::error::{Error, Result};

pub fn base58_encode(data: &[u8]) -> String {
    bs58::encode(data).into_string()
}

pub fn base58_decode(s: &str) -> Result<Vec<u8>> {
    bs58::decode(s).into_vec().map_err(|e| Error::Crypto(format!("bad base58: {e}")))
}

pub fn base64_encode(data: &[u8]) -> String {
    B64.encode(data)
}

pub fn base64_decode(s: &str) -> Result<Vec<u8>> {
    B64.decode(s).map_err(|e| Error::Crypto(format!("bad base64: {e}")))
}

pub fn hex_encode(data: &[u8]) -> String {
    hex::encode(data)
}

pub fn hex_decode(s: &str) -> Result<Vec<u8>> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).map_err(|e| Error::Crypto(format!("bad hex: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_round_trip() {
        let data = b"the quick brown fox";
        let enc = base64_encode(data);
        assert_eq!(base64_decode(&enc).unwrap(), data);
    }

    #[test]
    fn hex_round_trip_strips_prefix() {
        let data = [0xde, 0xad, 0xbe, 0xef];
        let enc = format!("0x{}", hex_encode(&data));
        assert_eq!(hex_decode(&enc).unwrap(), data);
    }
}
