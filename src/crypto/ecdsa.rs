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

//! ECDSA over secp256k1, SHA256 pre-hash, ASN.1 `SEQUENCE(r,s)` signature
//! encoding. Public keys round-trip through both the compressed (33 B)
//! and uncompressed (64/65 B) encodings, since BTC-style addresses are
//! derived from the compressed form while ETH-style addresses hash the
//! raw 64-byte uncompressed coordinates (spec §3 Address).

use secp256k1::{
    ecdsa::Signature, Message, PublicKey as Secp256k1PublicKey, Secp256k1,
    SecretKey as Secp256k1SecretKey,
};
use serde_json::Value;
use sha2::{Digest as _, Sha256};
use std::sync::OnceLock;

use super::{
    encoding::{base64_decode, base64_encode},
    keys::{map_get_data, KeyMap},
};
use crate::error::{Error, Result};

fn secp() -> &'static Secp256k1<secp256k1::All> {
    static CTX: OnceLock<Secp256k1<secp256k1::All>> = OnceLock::new();
    CTX.get_or_init(Secp256k1::new)
}

#[derive(Clone)]
pub struct EcdsaPrivateKeyImpl {
    secret: Secp256k1SecretKey,
    public: OnceLock<Secp256k1PublicKey>,
}

#[derive(Clone)]
pub struct EcdsaPublicKeyImpl(pub Secp256k1PublicKey);

impl EcdsaPrivateKeyImpl {
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let (secret, _) = secp().generate_keypair(&mut rng);
        Self { secret, public: OnceLock::new() }
    }

    pub fn from_map(map: &KeyMap) -> Result<Self> {
        let bytes = map_get_data(map)?;
        let secret = Secp256k1SecretKey::from_slice(&bytes)
            .map_err(|e| Error::Crypto(format!("bad secp256k1 secret key: {e}")))?;
        Ok(Self { secret, public: OnceLock::new() })
    }

    pub fn to_map(&self) -> KeyMap {
        let mut m = KeyMap::new();
        m.insert("algorithm".into(), Value::String("ECC".into()));
        m.insert("data".into(), Value::String(base64_encode(self.secret.as_ref())));
        m
    }

    /// Lazily derives and caches the public key, the way asymmetric key
    /// generation is specified to behave in spec §4.1.
    pub fn public_key(&self) -> EcdsaPublicKeyImpl {
        let pk = *self.public.get_or_init(|| Secp256k1PublicKey::from_secret_key(secp(), &self.secret));
        EcdsaPublicKeyImpl(pk)
    }

    pub fn sign(&self, data: &[u8]) -> Vec<u8> {
        let digest = Sha256::digest(data);
        let msg = Message::from_digest_slice(&digest).expect("sha256 digest is 32 bytes");
        let sig = secp().sign_ecdsa(&msg, &self.secret);
        sig.serialize_der().to_vec()
    }
}

impl EcdsaPublicKeyImpl {
    pub fn from_map(map: &KeyMap) -> Result<Self> {
        let bytes = map_get_data(map)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        // Accept compressed (33 B), uncompressed-with-prefix (65 B), or
        // bare uncompressed coordinates (64 B, as carried by ETH-style
        // addresses, which strip the leading 0x04 prefix).
        let key = match bytes.len() {
            33 | 65 => Secp256k1PublicKey::from_slice(bytes)
                .map_err(|e| Error::Crypto(format!("bad secp256k1 public key: {e}")))?,
            64 => {
                let mut prefixed = Vec::with_capacity(65);
                prefixed.push(0x04);
                prefixed.extend_from_slice(bytes);
                Secp256k1PublicKey::from_slice(&prefixed)
                    .map_err(|e| Error::Crypto(format!("bad secp256k1 public key: {e}")))?
            }
            n => return Err(Error::Crypto(format!("bad secp256k1 public key length: {n}"))),
        };
        Ok(Self(key))
    }

    pub fn to_map(&self) -> KeyMap {
        let mut m = KeyMap::new();
        m.insert("algorithm".into(), Value::String("ECC".into()));
        m.insert("data".into(), Value::String(base64_encode(&self.0.serialize())));
        m
    }

    /// Raw 64-byte uncompressed coordinates (prefix stripped), used to
    /// derive ETH-style addresses.
    pub fn uncompressed_64(&self) -> [u8; 64] {
        let full = self.0.serialize_uncompressed();
        let mut out = [0u8; 64];
        out.copy_from_slice(&full[1..]);
        out
    }

    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let digest = Sha256::digest(data);
        let msg = match Message::from_digest_slice(&digest) {
            Ok(m) => m,
            Err(_) => return false,
        };
        let sig = match Signature::from_der(signature) {
            Ok(s) => s,
            Err(_) => return false,
        };
        secp().verify_ecdsa(&msg, &sig, &self.0).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::encoding::hex_decode;

    #[test]
    fn sign_verify_round_trip() {
        let sk = EcdsaPrivateKeyImpl::generate();
        let pk = sk.public_key();
        let data = b"seed-bound fingerprint payload";
        let sig = sk.sign(data);
        assert!(pk.verify(data, &sig));
        assert!(!pk.verify(b"different payload", &sig));
    }

    #[test]
    fn public_key_round_trips_compressed_and_uncompressed() {
        let sk = EcdsaPrivateKeyImpl::generate();
        let pk = sk.public_key();
        let compressed = pk.0.serialize();
        let from_compressed = EcdsaPublicKeyImpl::from_bytes(&compressed).unwrap();
        assert_eq!(from_compressed.0, pk.0);

        let uncompressed64 = pk.uncompressed_64();
        let from_uncompressed = EcdsaPublicKeyImpl::from_bytes(&uncompressed64).unwrap();
        assert_eq!(from_uncompressed.0, pk.0);
    }

    #[test]
    fn public_key_from_hex_uncompressed() {
        let sk = EcdsaPrivateKeyImpl::generate();
        let pk = sk.public_key();
        let hex = hex::encode(pk.uncompressed_64());
        let decoded = hex_decode(&hex).unwrap();
        let restored = EcdsaPublicKeyImpl::from_bytes(&decoded).unwrap();
        assert_eq!(restored.0, pk.0);
    }
}
