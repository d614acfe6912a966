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

//! Meta: the content-addressed identity descriptor an `Address` is
//! derived from (spec §3).

use std::cell::RefCell;
use std::collections::HashMap;

use super::address::{Address, Network};
use crate::{
    crypto::PublicKey,
    error::{Error, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaType {
    Mkm = 1,
    Btc = 2,
    ExBtc = 3,
    Eth = 4,
    ExEth = 5,
}

impl MetaType {
    pub fn from_u8(v: u8) -> Result<Self> {
        match v {
            1 => Ok(Self::Mkm),
            2 => Ok(Self::Btc),
            3 => Ok(Self::ExBtc),
            4 => Ok(Self::Eth),
            5 => Ok(Self::ExEth),
            other => Err(Error::Validation(format!("unknown meta type: {other}"))),
        }
    }

    /// `hasSeed(type) ⇔ (type & 1) == 1`.
    pub fn has_seed(self) -> bool {
        (self as u8) & 1 == 1
    }
}

pub struct Meta {
    pub meta_type: MetaType,
    pub public_key: PublicKey,
    pub seed: Option<String>,
    pub fingerprint: Option<Vec<u8>>,
    address_cache: RefCell<HashMap<Network, Address>>,
}

impl Meta {
    pub fn new(
        meta_type: MetaType,
        public_key: PublicKey,
        seed: Option<String>,
        fingerprint: Option<Vec<u8>>,
    ) -> Self {
        Self { meta_type, public_key, seed, fingerprint, address_cache: RefCell::new(HashMap::new()) }
    }

    /// Builds a Meta with a seed and fingerprint signature, as produced at
    /// registration time by the identity owner.
    pub fn generate(
        meta_type: MetaType,
        private_key: &crate::crypto::PrivateKey,
        seed: Option<String>,
    ) -> Result<Self> {
        if meta_type.has_seed() {
            let seed = seed.ok_or_else(|| Error::Validation("seed required for this meta type".into()))?;
            let fingerprint = private_key.sign(seed.as_bytes())?;
            Ok(Self::new(meta_type, private_key.public_key(), Some(seed), Some(fingerprint)))
        } else {
            if seed.is_some() {
                return Err(Error::Validation("seed must be absent for this meta type".into()))
            }
            Ok(Self::new(meta_type, private_key.public_key(), None, None))
        }
    }

    /// Re-verifies the `hasSeed` invariant and, for seeded types, the
    /// fingerprint signature over the seed (spec §4.2).
    pub fn is_valid(&self) -> bool {
        if self.meta_type.has_seed() {
            let (Some(seed), Some(fingerprint)) = (&self.seed, &self.fingerprint) else {
                return false
            };
            self.public_key.verify(seed.as_bytes(), fingerprint)
        } else {
            self.seed.is_none() && self.fingerprint.is_none()
        }
    }

    /// Pure, memoized per network.
    pub fn generate_address(&self, network: Network) -> Address {
        if let Some(addr) = self.address_cache.borrow().get(&network) {
            return addr.clone()
        }
        let addr = match self.meta_type {
            MetaType::Mkm => {
                let fingerprint = self.fingerprint.clone().unwrap_or_default();
                Address::from_fingerprint_btc(network, &fingerprint)
            }
            MetaType::Btc | MetaType::ExBtc => {
                let bytes = self.public_key.to_map();
                let data = bytes.get("data").and_then(|v| v.as_str()).unwrap_or_default();
                let raw = crate::crypto::encoding::base64_decode(data).unwrap_or_default();
                Address::from_fingerprint_btc(network, &raw)
            }
            MetaType::Eth | MetaType::ExEth => {
                let uncompressed = match &self.public_key {
                    PublicKey::Ecc(k) => k.uncompressed_64(),
                    PublicKey::Rsa(_) => [0u8; 64],
                };
                Address::from_public_key_eth(&uncompressed)
            }
        };
        self.address_cache.borrow_mut().insert(network, addr.clone());
        addr
    }

    /// An ID *matches* a Meta iff the Meta's regenerated address for the
    /// ID's network equals the ID's address, and, if `hasSeed`, the ID's
    /// `name` equals the Meta's `seed`.
    pub fn matches(&self, name: Option<&str>, address: &Address) -> bool {
        if self.generate_address(address.network()) != *address {
            return false
        }
        if self.meta_type.has_seed() {
            return self.seed.as_deref() == name
        }
        true
    }
}
