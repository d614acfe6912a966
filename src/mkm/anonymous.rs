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

//! Anonymous display naming: a 10-digit decimal derived from the address,
//! formatted `XXX-XXX-XXXX`, used when a Document carries no `name` (spec
//! §4.2).

use super::address::Address;
use crate::{
    crypto::encoding::{base58_decode, hex_decode},
    error::{Error, Result},
};

pub fn anonymous_name(address: &Address) -> Result<String> {
    let payload = match address {
        Address::Btc { text, .. } => base58_decode(text)?,
        Address::Eth { text } => hex_decode(text)?,
        Address::Constant(s) => return Ok(s.to_string()),
    };
    if payload.len() < 4 {
        return Err(Error::Validation("address payload too short for anonymous naming".into()))
    }
    let tail = &payload[payload.len() - 4..];
    let number = u32::from_be_bytes(tail.try_into().unwrap());
    let digits = format!("{:010}", number % 10_000_000_000);
    Ok(format!("{}-{}-{}", &digits[0..3], &digits[3..6], &digits[6..10]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mkm::meta::{Meta, MetaType};

    #[test]
    fn format_has_expected_shape() {
        let sk = crate::crypto::PrivateKey::generate_ecc();
        let meta = Meta::generate(MetaType::Btc, &sk, None).unwrap();
        let addr = meta.generate_address(0);
        let name = anonymous_name(&addr).unwrap();
        assert_eq!(name.len(), 12);
        assert_eq!(name.chars().nth(3), Some('-'));
        assert_eq!(name.chars().nth(7), Some('-'));
        assert!(name.chars().filter(|c| c.is_ascii_digit()).count() == 10);
    }

    #[test]
    fn eth_address_also_supported() {
        let sk = crate::crypto::PrivateKey::generate_ecc();
        let meta = Meta::generate(MetaType::Eth, &sk, None).unwrap();
        let addr = meta.generate_address(4);
        let name = anonymous_name(&addr).unwrap();
        assert_eq!(name.len(), 12);
    }
}
