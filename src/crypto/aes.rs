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

//! AES-256/CBC/PKCS7. 32-byte key, 16-byte IV. The IV is generated fresh
//! per `encrypt` call, written into the caller's `extra` map under `IV`
//! (Base64) so the receiver can echo it back on `decrypt`; a missing IV on
//! decrypt defaults to all-zero (spec §4.1).

use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use serde_json::Value;

use super::{
    encoding::{base64_decode, base64_encode},
    keys::{map_get_data, Extra, KeyMap},
};
use crate::error::{Error, Result};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

pub const KEY_SIZE: usize = 32;
pub const IV_SIZE: usize = 16;

#[derive(Clone)]
pub struct AesKey {
    pub data: [u8; KEY_SIZE],
}

impl AesKey {
    pub fn generate() -> Self {
        let mut data = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut data);
        Self { data }
    }

    pub fn from_map(map: &KeyMap) -> Result<Self> {
        let bytes = map_get_data(map)?;
        Self::from_bytes(&bytes)
    }

    /// Rebuilds a key from raw unwrapped bytes (e.g. after RSA-decrypting
    /// a wrapped session key).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(Error::Crypto(format!("AES key must be {KEY_SIZE} bytes")))
        }
        let mut data = [0u8; KEY_SIZE];
        data.copy_from_slice(bytes);
        Ok(Self { data })
    }

    pub fn to_map(&self) -> KeyMap {
        let mut m = KeyMap::new();
        m.insert("algorithm".into(), Value::String("AES".into()));
        m.insert("data".into(), Value::String(base64_encode(&self.data)));
        m
    }

    pub fn encrypt(&self, plaintext: &[u8], extra: &mut Extra) -> Vec<u8> {
        let mut iv = [0u8; IV_SIZE];
        rand::thread_rng().fill_bytes(&mut iv);
        extra.insert("IV".to_string(), base64_encode(&iv));
        Aes256CbcEnc::new(&self.data.into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext)
    }

    pub fn decrypt(&self, ciphertext: &[u8], extra: &Extra) -> Result<Vec<u8>> {
        let iv = match extra.get("IV") {
            Some(s) => {
                let bytes = base64_decode(s)?;
                if bytes.len() != IV_SIZE {
                    return Err(Error::Crypto("bad IV length".into()))
                }
                let mut iv = [0u8; IV_SIZE];
                iv.copy_from_slice(&bytes);
                iv
            }
            None => [0u8; IV_SIZE],
        };
        Aes256CbcDec::new(&self.data.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|e| Error::Crypto(format!("AES decrypt failed: {e}")))
    }
}
