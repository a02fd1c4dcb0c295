//! Message authentication: HMAC-SHA1 text envelopes.
//!
//! A signed envelope is `BASE64(payload) ++ "--" ++ HEX(mac)`. The MAC is
//! computed over the base64 text, not the raw payload — both the framing and
//! the 40-hex-character digest width are part of the wire format and must not
//! change. The base64 alphabet excludes `-`, so the first `--` always
//! delimits unambiguously.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;

use crate::error::VerifyError;

type HmacSha1 = Hmac<Sha1>;

/// MAC width in bytes: HMAC-SHA1 produces a 160-bit digest, rendered as 40
/// lowercase hex characters in the envelope.
pub const MAC_LEN: usize = 20;

/// Delimiter between the base64 payload and the hex MAC.
const DELIMITER: &str = "--";

/// Sign `payload` into a self-delimiting text envelope.
pub fn sign(payload: &[u8], key: &[u8]) -> String {
    let encoded = BASE64.encode(payload);
    let mac = compute_mac(encoded.as_bytes(), key);
    format!("{}{}{}", encoded, DELIMITER, hex::encode(mac))
}

/// Verify an envelope and recover the original payload.
///
/// Fails with `Malformed` when the delimiter is absent, and `Tampered` when
/// the MAC does not match or the payload does not base64-decode. The MAC
/// comparison is constant-time and does not short-circuit.
pub fn verify(envelope: &str, key: &[u8]) -> Result<Vec<u8>, VerifyError> {
    let (encoded, mac_hex) = envelope
        .split_once(DELIMITER)
        .ok_or(VerifyError::Malformed)?;

    let expected = compute_mac(encoded.as_bytes(), key);
    // Undecodable hex becomes an empty MAC and fails the length path below.
    let provided = hex::decode(mac_hex).unwrap_or_default();
    if !macs_equal(&expected, &provided) {
        return Err(VerifyError::Tampered);
    }

    BASE64.decode(encoded).map_err(|_| VerifyError::Tampered)
}

fn compute_mac(text: &[u8], key: &[u8]) -> [u8; MAC_LEN] {
    let mut mac = HmacSha1::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(text);
    mac.finalize().into_bytes().into()
}

/// Constant-time MAC equality. A wrong-length MAC still costs a full-width
/// comparison before reporting failure.
fn macs_equal(expected: &[u8; MAC_LEN], provided: &[u8]) -> bool {
    if provided.len() != MAC_LEN {
        let _ = expected.as_slice().ct_eq(&[0u8; MAC_LEN]);
        return false;
    }
    expected.as_slice().ct_eq(provided).into()
}
