//! Password-based board encryption.
//!
//! PBKDF2-HMAC-SHA256 (100 000 iterations, 16-byte random salt) derives an
//! AES-256-GCM key; every call draws a fresh 12-byte IV. The envelope carries
//! salt, IV and ciphertext (with the GCM tag appended) as base64 strings, so
//! boards written by the browser client decrypt here and vice versa.
//!
//! Everything happens on the client. The Board API only ever sees the
//! envelope.

#[cfg(test)]
#[path = "crypto_test.rs"]
mod crypto_test;

use std::num::NonZeroU32;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ErrorCode;

pub const PBKDF2_ITERATIONS: u32 = 100_000;
pub const SALT_LEN: usize = 16;
pub const IV_LEN: usize = NONCE_LEN;
const KEY_LEN: usize = 32;

const ITERATIONS: NonZeroU32 = NonZeroU32::MIN.saturating_add(PBKDF2_ITERATIONS - 1);

/// Field whose presence marks board data as an encrypted envelope.
pub const ENCRYPTED_MARKER: &str = "encrypted";

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("serialize plaintext failed: {0}")]
    Serialize(serde_json::Error),

    #[error("parse decrypted plaintext failed: {0}")]
    Deserialize(serde_json::Error),

    #[error("random generation failed")]
    Random,

    #[error("envelope field `{field}` is not valid base64: {source}")]
    Decode { field: &'static str, source: base64::DecodeError },

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("encryption failed")]
    Seal,

    /// Wrong password or tampered data.
    #[error("decryption failed: wrong password or corrupted data")]
    Authentication,
}

impl ErrorCode for CryptoError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Serialize(_) => "E_CRYPTO_SERIALIZE",
            Self::Deserialize(_) => "E_CRYPTO_DESERIALIZE",
            Self::Random => "E_CRYPTO_RANDOM",
            Self::Decode { .. } => "E_CRYPTO_DECODE",
            Self::MalformedEnvelope(_) => "E_CRYPTO_ENVELOPE",
            Self::Seal => "E_CRYPTO_SEAL",
            Self::Authentication => "E_CRYPTO_AUTH",
        }
    }
}

/// Encrypted board payload as stored by the Board API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedEnvelope {
    pub salt: String,
    pub iv: String,
    pub encrypted: String,
}

impl EncryptedEnvelope {
    /// Read an envelope out of raw board data.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MalformedEnvelope`] when a field is missing or
    /// not a string.
    pub fn from_value(data: &Value) -> Result<Self, CryptoError> {
        Self::deserialize(data).map_err(|e| CryptoError::MalformedEnvelope(e.to_string()))
    }
}

/// Whether raw board data is an encrypted envelope rather than plaintext.
#[must_use]
pub fn is_encrypted(data: &Value) -> bool {
    data.get(ENCRYPTED_MARKER).is_some()
}

/// Serialize `value` to JSON and encrypt it under `password`.
///
/// # Errors
///
/// Fails if `value` cannot be serialized or the system RNG fails.
pub fn encrypt<T: Serialize + ?Sized>(value: &T, password: &str) -> Result<EncryptedEnvelope, CryptoError> {
    let mut buffer = serde_json::to_vec(value).map_err(CryptoError::Serialize)?;

    let rng = SystemRandom::new();
    let mut salt = [0u8; SALT_LEN];
    rng.fill(&mut salt).map_err(|_| CryptoError::Random)?;
    let mut iv = [0u8; IV_LEN];
    rng.fill(&mut iv).map_err(|_| CryptoError::Random)?;

    let key = derive_key(password, &salt)?;
    key.seal_in_place_append_tag(Nonce::assume_unique_for_key(iv), Aad::empty(), &mut buffer)
        .map_err(|_| CryptoError::Seal)?;

    Ok(EncryptedEnvelope { salt: STANDARD.encode(salt), iv: STANDARD.encode(iv), encrypted: STANDARD.encode(buffer) })
}

/// Decrypt an envelope under `password` and parse the plaintext JSON.
///
/// # Errors
///
/// Returns [`CryptoError::Authentication`] for a wrong password or tampered
/// ciphertext; never hands back unauthenticated plaintext.
pub fn decrypt<T: DeserializeOwned>(envelope: &EncryptedEnvelope, password: &str) -> Result<T, CryptoError> {
    let salt = decode("salt", &envelope.salt)?;
    let iv = decode("iv", &envelope.iv)?;
    let mut buffer = decode("encrypted", &envelope.encrypted)?;

    if salt.is_empty() {
        return Err(CryptoError::MalformedEnvelope("empty salt".into()));
    }
    let nonce = Nonce::try_assume_unique_for_key(&iv)
        .map_err(|_| CryptoError::MalformedEnvelope(format!("iv must be {IV_LEN} bytes, got {}", iv.len())))?;

    let key = derive_key(password, &salt)?;
    let plaintext = key.open_in_place(nonce, Aad::empty(), &mut buffer).map_err(|_| CryptoError::Authentication)?;
    serde_json::from_slice(plaintext).map_err(CryptoError::Deserialize)
}

fn derive_key(password: &str, salt: &[u8]) -> Result<LessSafeKey, CryptoError> {
    let mut key = [0u8; KEY_LEN];
    pbkdf2::derive(pbkdf2::PBKDF2_HMAC_SHA256, ITERATIONS, salt, password.as_bytes(), &mut key);
    let unbound = UnboundKey::new(&AES_256_GCM, &key).map_err(|_| CryptoError::Seal)?;
    Ok(LessSafeKey::new(unbound))
}

fn decode(field: &'static str, text: &str) -> Result<Vec<u8>, CryptoError> {
    STANDARD.decode(text).map_err(|source| CryptoError::Decode { field, source })
}
