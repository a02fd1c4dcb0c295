//! Stateless session cookies: tamper-evident signed (and optionally
//! encrypted) tokens carrying the whole session payload.
//!
//! No session identifier exists anywhere: [`store::put`] folds the session
//! value into the token, [`store::get`] recovers it, and a token that fails
//! any verification step reads as the empty session rather than an error.
//! Master secrets arrive per call from the embedding framework and must be
//! at least 64 bytes.

pub mod crypto;
pub mod error;
pub mod serialize;
pub mod store;

pub use crypto::cache::{KeyCache, MemoryKeyCache, NoopKeyCache};
pub use crypto::kdf::{DerivationParams, Digest, KeyDeriver};
pub use error::{ConfigError, SecretError, StoreError, VerifyError};
pub use serialize::{CborSerializer, CodecSerializer, JsonCodec, Serializer, SessionCodec};
pub use store::{delete, get, init, put, StoreConfig, StoreOptions};
