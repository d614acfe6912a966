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

//! RSA-1024, exponent 65537, PKCS1 padding, SHA256 signatures. RSA is the
//! algorithm a Visa's `EncryptKey` uses to wrap per-message symmetric keys
//! (spec §3 Document, §4.4.1 step 5); it also supports sign/verify for
//! Meta types that key off an RSA identity (`MKM`).

use rsa::{
    pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey},
    pkcs1v15::{Pkcs1v15Encrypt, Pkcs1v15Sign},
    RsaPrivateKey, RsaPublicKey as RsaPub,
};
use serde_json::Value;
use sha2::{Digest as _, Sha256};

use super::{
    encoding::{base64_decode, base64_encode},
    keys::{map_get_data, KeyMap},
};
use crate::error::{Error, Result};

pub const KEY_BITS: usize = 1024;

#[derive(Clone)]
pub struct RsaPrivateKeyImpl(RsaPrivateKey);

#[derive(Clone)]
pub struct RsaPublicKeyImpl(RsaPub);

impl RsaPrivateKeyImpl {
    pub fn generate() -> Result<Self> {
        let mut rng = rand::thread_rng();
        let key = RsaPrivateKey::new(&mut rng, KEY_BITS)
            .map_err(|e| Error::Crypto(format!("RSA keygen failed: {e}")))?;
        Ok(Self(key))
    }

    pub fn public_key(&self) -> RsaPublicKeyImpl {
        RsaPublicKeyImpl(self.0.to_public_key())
    }

    pub fn from_map(map: &KeyMap) -> Result<Self> {
        let der = map_get_data(map)?;
        let key = RsaPrivateKey::from_pkcs1_der(&der)
            .map_err(|e| Error::Crypto(format!("bad RSA private key: {e}")))?;
        Ok(Self(key))
    }

    pub fn to_map(&self) -> KeyMap {
        let der = self.0.to_pkcs1_der().expect("valid key encodes").as_bytes().to_vec();
        let mut m = KeyMap::new();
        m.insert("algorithm".into(), Value::String("RSA".into()));
        m.insert("data".into(), Value::String(base64_encode(&der)));
        m
    }

    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.0
            .decrypt(Pkcs1v15Encrypt, ciphertext)
            .map_err(|_| Error::VerifyFailed)
    }

    pub fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let digest = Sha256::digest(data);
        self.0
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .map_err(|e| Error::Crypto(format!("RSA sign failed: {e}")))
    }
}

impl RsaPublicKeyImpl {
    pub fn from_map(map: &KeyMap) -> Result<Self> {
        let der = map_get_data(map)?;
        let key = RsaPub::from_pkcs1_der(&der)
            .map_err(|e| Error::Crypto(format!("bad RSA public key: {e}")))?;
        Ok(Self(key))
    }

    pub fn to_map(&self) -> KeyMap {
        let der = self.0.to_pkcs1_der().expect("valid key encodes").as_bytes().to_vec();
        let mut m = KeyMap::new();
        m.insert("algorithm".into(), Value::String("RSA".into()));
        m.insert("data".into(), Value::String(base64_encode(&der)));
        m
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut rng = rand::thread_rng();
        self.0
            .encrypt(&mut rng, Pkcs1v15Encrypt, plaintext)
            .map_err(|e| Error::Crypto(format!("RSA encrypt failed: {e}")))
    }

    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let digest = Sha256::digest(data);
        self.0.verify(Pkcs1v15Sign::new::<Sha256>(), &digest, signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_round_trip() {
        let sk = RsaPrivateKeyImpl::generate().unwrap();
        let pk = sk.public_key();
        let plaintext = b"a 32-byte symmetric key payload!";
        let ciphertext = pk.encrypt(plaintext).unwrap();
        assert_eq!(sk.decrypt(&ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn sign_verify_round_trip() {
        let sk = RsaPrivateKeyImpl::generate().unwrap();
        let pk = sk.public_key();
        let data = b"message body";
        let sig = sk.sign(data).unwrap();
        assert!(pk.verify(data, &sig));
        assert!(!pk.verify(b"tampered", &sig));
    }
}
