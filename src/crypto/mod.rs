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

//! Crypto primitives (spec §4.1): `encrypt/decrypt`, `sign/verify`,
//! `digest`, `generate` for symmetric and asymmetric key material, plus
//! the encoders wire frames and addresses are built from.

pub mod aes;
pub mod digest;
pub mod ecdsa;
pub mod encoding;
pub mod keys;
pub mod rsa;

use serde_json::Value;

use self::{
    aes::AesKey,
    ecdsa::{EcdsaPrivateKeyImpl, EcdsaPublicKeyImpl},
    keys::{map_get_str, normalize_algorithm, Extra, KeyMap, PlainKey},
    rsa::{RsaPrivateKeyImpl, RsaPublicKeyImpl},
};
use crate::error::{Error, Result};

/// A symmetric content key together with the reuse bookkeeping from spec
/// §3's key lifecycle. `reused` indicates the sender elected to keep using
/// this key across messages to the same recipient set; `digest` is a short
/// fingerprint of the key that, once set, lets the wire form collapse to
/// `{digest}` instead of carrying full per-recipient key wraps again.
#[derive(Clone)]
pub struct SessionKey {
    pub key: SymmetricKey,
    pub reused: bool,
    pub digest: Option<Vec<u8>>,
}

impl SessionKey {
    pub fn generate() -> Self {
        Self { key: SymmetricKey::Aes(AesKey::generate()), reused: false, digest: None }
    }

    pub fn plain() -> Self {
        Self { key: SymmetricKey::Plain, reused: false, digest: None }
    }

    /// A short fingerprint suitable for the wire `digest` field: first 6
    /// bytes of SHA256 of the key bytes, Base64-encoded.
    pub fn compute_digest(&self) -> Option<Vec<u8>> {
        match &self.key {
            SymmetricKey::Aes(k) => Some(digest::sha256(&k.data)[..6].to_vec()),
            SymmetricKey::Plain => None,
        }
    }
}

#[derive(Clone)]
pub enum SymmetricKey {
    Aes(AesKey),
    Plain,
}

impl SymmetricKey {
    pub fn from_map(map: &KeyMap) -> Result<Self> {
        let algo = normalize_algorithm(map_get_str(map, "algorithm")?)?;
        match algo {
            "AES" => Ok(Self::Aes(AesKey::from_map(map)?)),
            "PLAIN" => Ok(Self::Plain),
            other => Err(Error::Validation(format!("'{other}' is not a symmetric algorithm"))),
        }
    }

    pub fn to_map(&self) -> KeyMap {
        match self {
            Self::Aes(k) => k.to_map(),
            Self::Plain => {
                let mut m = KeyMap::new();
                m.insert("algorithm".into(), Value::String("PLAIN".into()));
                m
            }
        }
    }

    pub fn encrypt(&self, plaintext: &[u8], extra: &mut Extra) -> Vec<u8> {
        match self {
            Self::Aes(k) => k.encrypt(plaintext, extra),
            Self::Plain => PlainKey.encrypt(plaintext, extra),
        }
    }

    pub fn decrypt(&self, ciphertext: &[u8], extra: &Extra) -> Result<Vec<u8>> {
        match self {
            Self::Aes(k) => k.decrypt(ciphertext, extra),
            Self::Plain => Ok(PlainKey.decrypt(ciphertext, extra)),
        }
    }
}

/// An asymmetric private key. `RSA` supports both decrypt (unwrapping a
/// session key) and sign; `ECC` (secp256k1) supports sign only, matching
/// spec §4.1's algorithm list.
#[derive(Clone)]
pub enum PrivateKey {
    Rsa(RsaPrivateKeyImpl),
    Ecc(EcdsaPrivateKeyImpl),
}

#[derive(Clone)]
pub enum PublicKey {
    Rsa(RsaPublicKeyImpl),
    Ecc(EcdsaPublicKeyImpl),
}

impl PrivateKey {
    pub fn generate_rsa() -> Result<Self> {
        Ok(Self::Rsa(RsaPrivateKeyImpl::generate()?))
    }

    pub fn generate_ecc() -> Self {
        Self::Ecc(EcdsaPrivateKeyImpl::generate())
    }

    pub fn from_map(map: &KeyMap) -> Result<Self> {
        let algo = normalize_algorithm(map_get_str(map, "algorithm")?)?;
        match algo {
            "RSA" => Ok(Self::Rsa(RsaPrivateKeyImpl::from_map(map)?)),
            "ECC" => Ok(Self::Ecc(EcdsaPrivateKeyImpl::from_map(map)?)),
            other => Err(Error::Validation(format!("'{other}' is not an asymmetric algorithm"))),
        }
    }

    pub fn to_map(&self) -> KeyMap {
        match self {
            Self::Rsa(k) => k.to_map(),
            Self::Ecc(k) => k.to_map(),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            Self::Rsa(k) => PublicKey::Rsa(k.public_key()),
            Self::Ecc(k) => PublicKey::Ecc(k.public_key()),
        }
    }

    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Rsa(k) => k.sign(data),
            Self::Ecc(k) => Ok(k.sign(data)),
        }
    }

    /// Unwraps a session key previously wrapped with the matching public
    /// key. Only RSA supports asymmetric decryption in this algorithm set.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Rsa(k) => k.decrypt(ciphertext),
            Self::Ecc(_) => Err(Error::Crypto("ECC keys do not support decryption".into())),
        }
    }

    pub fn algorithm(&self) -> &'static str {
        match self {
            Self::Rsa(_) => "RSA",
            Self::Ecc(_) => "ECC",
        }
    }
}

impl PublicKey {
    pub fn from_map(map: &KeyMap) -> Result<Self> {
        let algo = normalize_algorithm(map_get_str(map, "algorithm")?)?;
        match algo {
            "RSA" => Ok(Self::Rsa(RsaPublicKeyImpl::from_map(map)?)),
            "ECC" => Ok(Self::Ecc(EcdsaPublicKeyImpl::from_map(map)?)),
            other => Err(Error::Validation(format!("'{other}' is not an asymmetric algorithm"))),
        }
    }

    pub fn to_map(&self) -> KeyMap {
        match self {
            Self::Rsa(k) => k.to_map(),
            Self::Ecc(k) => k.to_map(),
        }
    }

    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        match self {
            Self::Rsa(k) => k.verify(data, signature),
            Self::Ecc(k) => k.verify(data, signature),
        }
    }

    /// Wraps a session key. Only RSA supports asymmetric encryption in
    /// this algorithm set; callers encrypting to a broadcast receiver use
    /// `SymmetricKey::Plain` instead of going through a `PublicKey` at all.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Rsa(k) => k.encrypt(plaintext),
            Self::Ecc(_) => Err(Error::Crypto("ECC keys do not support encryption".into())),
        }
    }

    pub fn algorithm(&self) -> &'static str {
        match self {
            Self::Rsa(_) => "RSA",
            Self::Ecc(_) => "ECC",
        }
    }
}
