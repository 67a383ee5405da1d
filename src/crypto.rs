use crate::{MacaroonError, Result};
use chacha20poly1305::{
    XChaCha20Poly1305, XNonce,
    aead::{Aead, KeyInit},
};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha3::{Digest, Sha3_256};
use subtle::ConstantTimeEq;

type HmacSha3 = Hmac<Sha3_256>;

/// Size of HMAC-SHA3-256 output in bytes (32 bytes = 256 bits)
pub const SIGNATURE_SIZE: usize = 32;

/// Size of the random XChaCha20-Poly1305 nonce prepended to every ciphertext
pub const NONCE_SIZE: usize = 24;

/// Size of a derived symmetric encryption key
pub const KEY_SIZE: usize = 32;

/// Size of the random root key minted for each third-party caveat
pub const CAVEAT_KEY_SIZE: usize = 24;

const ENCRYPTION_KEY_CONTEXT: &[u8] = b"macaroon-encryption-key";

/// A running macaroon signature
pub type Signature = [u8; SIGNATURE_SIZE];

/// Generates an HMAC-SHA3-256 signature
///
/// # Arguments
/// * `key` - The secret key
/// * `message` - The message to authenticate
///
/// # Returns
/// A 32-byte HMAC signature
pub fn hmac_sha3(key: &[u8], message: &[u8]) -> Signature {
    keyed_hasher(key).chain_update(message).finalize().into_bytes().into()
}

fn keyed_hasher(key: &[u8]) -> HmacSha3 {
    <HmacSha3 as Mac>::new_from_slice(key).expect("HMAC can take key of any length")
}

/// Folds one caveat into the signature chain
///
/// This computes: HMAC-SHA3(signature, verification_id || caveat_id).
/// First-party caveats pass an empty `verification_id`.
pub fn chain_caveat(signature: &[u8], verification_id: &[u8], caveat_id: &[u8]) -> Signature {
    keyed_hasher(signature)
        .chain_update(verification_id)
        .chain_update(caveat_id)
        .finalize()
        .into_bytes()
        .into()
}

/// Binds a discharge signature to the root macaroon signature it travels with
///
/// Equal signatures are returned unchanged; otherwise the result is
/// SHA3-256(root_signature || discharge_signature).
pub fn bind_for_request(root_signature: &Signature, discharge_signature: &Signature) -> Signature {
    if root_signature == discharge_signature {
        return *root_signature;
    }
    Sha3_256::new()
        .chain_update(root_signature)
        .chain_update(discharge_signature)
        .finalize()
        .into()
}

/// Compares two signatures in constant time
pub fn signatures_equal(a: &Signature, b: &Signature) -> bool {
    a[..].ct_eq(&b[..]).into()
}

/// Derives a fixed-size encryption key from a secret of any length
pub fn derive_key(secret: &[u8]) -> [u8; KEY_SIZE] {
    hmac_sha3(secret, ENCRYPTION_KEY_CONTEXT)
}

/// Fills a fixed-size array from the thread-local CSPRNG
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::rng().fill_bytes(&mut bytes);
    bytes
}

/// Encrypts `plaintext` under `secret` with XChaCha20-Poly1305
///
/// The output is the random nonce followed by the ciphertext and tag.
pub fn encrypt(secret: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let key = derive_key(secret);
    let cipher = XChaCha20Poly1305::new((&key).into());
    let nonce: [u8; NONCE_SIZE] = random_bytes();

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| MacaroonError::EncryptError)?;

    let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypts a value produced by [`encrypt`] with the same secret
pub fn decrypt(secret: &[u8], sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < NONCE_SIZE {
        return Err(MacaroonError::DecryptError);
    }
    let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);

    let key = derive_key(secret);
    let cipher = XChaCha20Poly1305::new((&key).into());
    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| MacaroonError::DecryptError)
}
