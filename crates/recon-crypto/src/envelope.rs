//! Command envelope: AES-256-CBC with a random IV per message.
//!
//! Blob layout before base64 (standard alphabet, padded):
//!
//! ```text
//! [IV (16 bytes) | ciphertext (n * 16 bytes, PKCS#7 padded)]
//! ```
//!
//! There is no authentication tag. A tampered blob usually fails the padding
//! or UTF-8 checks, but it can also decrypt to well-formed garbage; the server
//! validates command structure after decryption. Adding a MAC would change
//! the wire format, so the envelope stays unauthenticated.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use cbc::cipher::block_padding::{NoPadding, Pkcs7};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::CryptoError;
use crate::kdf::{DerivedKey, KEY_SIZE};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES block size.
pub const BLOCK_SIZE: usize = 16;

/// IV length, one block.
pub const IV_SIZE: usize = BLOCK_SIZE;

/// Marker prepended to every outbound command; the server checks and strips it.
pub const COMMAND_PREFIX: &str = "RCON_";

/// Encrypt `plaintext` under `key` and return the base64 blob.
///
/// Fails with [`CryptoError::RandomSource`] if no IV can be drawn from the OS.
pub fn encrypt(plaintext: &str, key: &DerivedKey) -> Result<String, CryptoError> {
    let mut iv = [0u8; IV_SIZE];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| CryptoError::RandomSource(e.to_string()))?;

    let ciphertext = Aes256CbcEnc::new_from_slices(key.as_bytes(), &iv)
        .map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: key.as_bytes().len(),
        })?
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

    let mut blob = Vec::with_capacity(IV_SIZE + ciphertext.len());
    blob.extend_from_slice(&iv);
    blob.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(blob))
}

/// Tag a command with [`COMMAND_PREFIX`] and encrypt it.
pub fn encrypt_command(command: &str, key: &DerivedKey) -> Result<String, CryptoError> {
    encrypt(&format!("{COMMAND_PREFIX}{command}"), key)
}

/// Decrypt a base64 blob produced by [`encrypt`] (or by the server).
pub fn decrypt(blob: &str, key: &DerivedKey) -> Result<String, CryptoError> {
    let decoded = BASE64
        .decode(blob)
        .map_err(|e| CryptoError::MalformedBlob(format!("invalid base64: {e}")))?;

    if decoded.len() < IV_SIZE + BLOCK_SIZE {
        return Err(CryptoError::MalformedBlob(format!(
            "expected at least {} bytes, got {}",
            IV_SIZE + BLOCK_SIZE,
            decoded.len()
        )));
    }

    let (iv, ciphertext) = decoded.split_at(IV_SIZE);
    if ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(CryptoError::MalformedBlob(format!(
            "ciphertext length {} is not a multiple of {BLOCK_SIZE}",
            ciphertext.len()
        )));
    }

    let plaintext = Aes256CbcDec::new_from_slices(key.as_bytes(), iv)
        .map_err(|_| CryptoError::InvalidKeyLength {
            expected: KEY_SIZE,
            actual: key.as_bytes().len(),
        })?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::InvalidPadding)?;

    Ok(String::from_utf8(plaintext)?)
}

// NIST SP 800-38A, F.2.5 CBC-AES256.Encrypt, block #1.
const KAT_KEY: [u8; KEY_SIZE] = [
    0x60, 0x3d, 0xeb, 0x10, 0x15, 0xca, 0x71, 0xbe, 0x2b, 0x73, 0xae, 0xf0, 0x85, 0x7d, 0x77, 0x81,
    0x1f, 0x35, 0x2c, 0x07, 0x3b, 0x61, 0x08, 0xd7, 0x2d, 0x98, 0x10, 0xa3, 0x09, 0x14, 0xdf, 0xf4,
];
const KAT_IV: [u8; IV_SIZE] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d, 0x0e, 0x0f,
];
const KAT_PLAINTEXT: [u8; BLOCK_SIZE] = [
    0x6b, 0xc1, 0xbe, 0xe2, 0x2e, 0x40, 0x9f, 0x96, 0xe9, 0x3d, 0x7e, 0x11, 0x73, 0x93, 0x17, 0x2a,
];
const KAT_CIPHERTEXT: [u8; BLOCK_SIZE] = [
    0xf5, 0x8c, 0x4c, 0x04, 0xd6, 0xe5, 0xf1, 0xba, 0x77, 0x9e, 0xab, 0xfb, 0x5f, 0x7b, 0xfb, 0xd6,
];

/// Check that the cipher backend and the OS random source work.
///
/// Runs a known-answer AES-256-CBC vector in both directions and draws one
/// IV's worth of randomness. Clients call this once at construction.
pub fn self_test() -> Result<(), CryptoError> {
    let ciphertext = Aes256CbcEnc::new_from_slices(&KAT_KEY, &KAT_IV)
        .map_err(|e| CryptoError::SelfTestFailed(e.to_string()))?
        .encrypt_padded_vec_mut::<NoPadding>(&KAT_PLAINTEXT);
    if ciphertext != KAT_CIPHERTEXT {
        return Err(CryptoError::SelfTestFailed(
            "AES-256-CBC encryption does not match the reference vector".into(),
        ));
    }

    let plaintext = Aes256CbcDec::new_from_slices(&KAT_KEY, &KAT_IV)
        .map_err(|e| CryptoError::SelfTestFailed(e.to_string()))?
        .decrypt_padded_vec_mut::<NoPadding>(&KAT_CIPHERTEXT)
        .map_err(|e| CryptoError::SelfTestFailed(e.to_string()))?;
    if plaintext != KAT_PLAINTEXT {
        return Err(CryptoError::SelfTestFailed(
            "AES-256-CBC decryption does not match the reference vector".into(),
        ));
    }

    let mut probe = [0u8; IV_SIZE];
    OsRng
        .try_fill_bytes(&mut probe)
        .map_err(|e| CryptoError::RandomSource(e.to_string()))
}
