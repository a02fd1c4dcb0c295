//! Authenticated encryption: AES-256-CBC under an HMAC envelope.
//!
//! The inner string is `BASE64(ciphertext) ++ "--" ++ BASE64(iv)`, wrapped as
//! the payload of a signed envelope under a distinct signing key
//! (encrypt-then-MAC). Plaintext is padded to the 16-byte block size as
//! `[padding_len][message][padding_len random bytes]` with
//! `padding_len ∈ [0, 15]` — the cipher itself runs with no padding because
//! this layout is the padding.

use aes::cipher::block_padding::NoPadding;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use aes::Aes256;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::crypto::verifier;
use crate::error::{CipherError, DecryptError, VerifyError};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Cipher block size in bytes; also the IV length.
pub const BLOCK_LEN: usize = 16;

/// AES-256 key length. Longer keys are truncated to their leading 32 bytes;
/// shorter keys are rejected.
pub const CIPHER_KEY_LEN: usize = 32;

/// Delimiter between the base64 ciphertext and the base64 IV.
const DELIMITER: &str = "--";

/// Encrypt `message` with a fresh random IV and wrap the result in a signed
/// envelope under `sign_key`.
pub fn encrypt_and_sign(
    message: &[u8],
    cipher_key: &[u8],
    sign_key: &[u8],
) -> Result<String, CipherError> {
    let key = truncate_key(cipher_key)?;

    let padded = pad(message);
    let mut iv = [0u8; BLOCK_LEN];
    OsRng.fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new_from_slices(key, &iv)
        .expect("key and IV lengths are validated")
        .encrypt_padded_vec_mut::<NoPadding>(&padded);

    let inner = format!(
        "{}{}{}",
        BASE64.encode(ciphertext),
        DELIMITER,
        BASE64.encode(iv)
    );
    Ok(verifier::sign(inner.as_bytes(), sign_key))
}

/// Verify the envelope, then decrypt and unpad the inner ciphertext.
///
/// The MAC check runs before any ciphertext or padding is interpreted, and
/// every malformation found after a valid MAC maps to the same `Malformed`
/// error.
pub fn verify_and_decrypt(
    envelope: &str,
    cipher_key: &[u8],
    sign_key: &[u8],
) -> Result<Vec<u8>, DecryptError> {
    let inner_bytes = verifier::verify(envelope, sign_key).map_err(DecryptError::Verify)?;
    let inner = String::from_utf8(inner_bytes).map_err(|_| VerifyError::Malformed)?;

    let (ct_b64, iv_b64) = inner.split_once(DELIMITER).ok_or(VerifyError::Malformed)?;
    let ciphertext = BASE64.decode(ct_b64).map_err(|_| VerifyError::Malformed)?;
    let iv = BASE64.decode(iv_b64).map_err(|_| VerifyError::Malformed)?;
    if iv.len() != BLOCK_LEN {
        return Err(VerifyError::Malformed.into());
    }

    let key = truncate_key(cipher_key)?;
    let padded = Zeroizing::new(
        Aes256CbcDec::new_from_slices(key, &iv)
            .expect("key and IV lengths are validated")
            .decrypt_padded_vec_mut::<NoPadding>(&ciphertext)
            .map_err(|_| VerifyError::Malformed)?,
    );

    let message = unpad(&padded)?;
    Ok(message.to_vec())
}

/// Truncate an oversized key to the cipher's size. Truncation is always
/// leading-N; keys are never hashed or padded to fit.
fn truncate_key(key: &[u8]) -> Result<&[u8], CipherError> {
    if key.len() < CIPHER_KEY_LEN {
        return Err(CipherError::KeyLength {
            len: key.len(),
            min: CIPHER_KEY_LEN,
        });
    }
    Ok(&key[..CIPHER_KEY_LEN])
}

/// Pad to the smallest block multiple that fits the length byte plus the
/// message, filling with cryptographically random bytes.
fn pad(message: &[u8]) -> Zeroizing<Vec<u8>> {
    let padding_len = (BLOCK_LEN - (message.len() + 1) % BLOCK_LEN) % BLOCK_LEN;

    let mut padded = Vec::with_capacity(message.len() + 1 + padding_len);
    padded.push(padding_len as u8);
    padded.extend_from_slice(message);

    let mut filler = vec![0u8; padding_len];
    OsRng.fill_bytes(&mut filler);
    padded.extend_from_slice(&filler);

    Zeroizing::new(padded)
}

/// Strip the padding layout. The claimed padding length must not exceed the
/// bytes that follow it; a ciphertext claiming more is rejected instead of
/// underflowing.
fn unpad(padded: &[u8]) -> Result<&[u8], VerifyError> {
    let (&padding_len, rest) = padded.split_first().ok_or(VerifyError::Malformed)?;
    let padding_len = padding_len as usize;
    if padding_len > rest.len() {
        return Err(VerifyError::Malformed);
    }
    Ok(&rest[..rest.len() - padding_len])
}
