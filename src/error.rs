use thiserror::Error;

/// Configuration errors raised by `store::init`.
///
/// These are deployment mistakes: fatal, loud, and never produced at request
/// time.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cookie store requires a signing salt")]
    MissingSigningSalt,

    #[error("cookie store requires an encryption salt unless encryption is disabled")]
    MissingEncryptionSalt,

    #[error("the delegating serializer requires a codec")]
    MissingCodec,
}

/// The master secret failed validation before any cryptographic work.
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("master secret must be at least {min} bytes, got {len}")]
    TooShort { len: usize, min: usize },
}

/// Untrusted-input failures while reading a token.
///
/// The store always recovers these locally by treating the token as absent;
/// they never reach the HTTP layer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    #[error("envelope is missing its delimiter or badly encoded")]
    Malformed,

    #[error("MAC mismatch or undecodable payload")]
    Tampered,
}

/// The cipher key is shorter than the cipher requires.
///
/// Oversized keys are truncated; an undersized key means the derivation
/// parameters were configured below the cipher's key size.
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("cipher key must be at least {min} bytes, got {len}")]
    KeyLength { len: usize, min: usize },
}

/// Failures from `verify_and_decrypt`: either the untrusted envelope was bad
/// or the locally supplied cipher key was.
#[derive(Error, Debug)]
pub enum DecryptError {
    #[error(transparent)]
    Verify(#[from] VerifyError),

    #[error(transparent)]
    Cipher(#[from] CipherError),
}

/// Serializer encode failure. Recovered locally: the store writes an
/// empty-payload token instead of surfacing this.
#[derive(Error, Debug)]
#[error("serializer encode failed: {0}")]
pub struct EncodeError(pub String);

/// Serializer decode failure. Recovered locally: the store returns the empty
/// session value instead of surfacing this.
#[derive(Error, Debug)]
#[error("serializer decode failed: {0}")]
pub struct DecodeError(pub String);

/// The fatal subset of failures surfaced by `put` and `get`.
///
/// Everything else on those paths fails open to an empty session.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Cipher(#[from] CipherError),
}
