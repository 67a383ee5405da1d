//! Encoding of third-party caveat ids.
//!
//! A third-party caveat id carries a fresh discharge root key and the condition
//! the third party must check, encrypted under a secret the third party holds.
//! The plaintext is MessagePack, the ciphertext is XChaCha20-Poly1305 and the
//! result is standard padded base64 so it can travel as text.

use crate::crypto::{decrypt, encrypt};
use crate::{MacaroonError, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

/// The plaintext payload of a third-party caveat id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThirdPartyCaveatId {
    /// Root key the discharge macaroon must be minted with
    pub root_key: Vec<u8>,

    /// Condition the third party is asked to check
    pub condition: String,
}

impl ThirdPartyCaveatId {
    pub fn new(root_key: impl Into<Vec<u8>>, condition: impl Into<String>) -> Self {
        Self {
            root_key: root_key.into(),
            condition: condition.into(),
        }
    }
}

/// Encrypts a caveat id payload under `secret` and text-encodes it
pub fn encrypt_third_party_caveat_id(secret: &[u8], id: &ThirdPartyCaveatId) -> Result<String> {
    let plaintext = rmp_serde::to_vec(id)
        .map_err(|e| MacaroonError::PayloadFormatError(e.to_string()))?;
    let sealed = encrypt(secret, &plaintext)?;
    Ok(STANDARD.encode(sealed))
}

/// Decrypts a third-party caveat id given the shared secret
///
/// # Errors
/// * `DecodeError` if `caveat_id` is not valid base64
/// * `DecryptError` if the ciphertext was tampered with or `secret` is wrong
/// * `PayloadFormatError` if the plaintext is not a caveat id payload
pub fn decrypt_third_party_caveat_id(secret: &[u8], caveat_id: &str) -> Result<ThirdPartyCaveatId> {
    let sealed = STANDARD
        .decode(caveat_id.as_bytes())
        .map_err(|e| MacaroonError::DecodeError(e.to_string()))?;
    let plaintext = decrypt(secret, &sealed)?;
    rmp_serde::from_slice(&plaintext).map_err(|e| {
        MacaroonError::PayloadFormatError(format!("cannot unmarshal decrypted caveat id: {e}"))
    })
}
