//! Cryptographic components: key derivation, message authentication, and
//! authenticated encryption.
//!
//! The modules compose leaves-first: `kdf` (backed by `cache`) produces
//! purpose-scoped subkeys, `verifier` signs and checks text envelopes, and
//! `encryptor` layers AES-256-CBC under the verifier (encrypt-then-MAC).

pub mod cache;
pub mod encryptor;
pub mod kdf;
pub mod verifier;
