//! Cookie token store: derivation, signing, encryption, and serialization
//! composed behind the session-plugin interface.
//!
//! The store is stateless: [`init`] freezes a [`StoreConfig`] once, then
//! [`put`] and [`get`] are pure functions of (secret, value/token, config)
//! apart from the derivation cache. A token that fails verification or
//! decoding at any stage reads as "no session" — request-time errors on
//! untrusted client input are never surfaced to the HTTP layer.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::crypto::cache::{KeyCache, MemoryKeyCache};
use crate::crypto::kdf::{DerivationParams, KeyDeriver};
use crate::crypto::{encryptor, verifier};
use crate::error::{ConfigError, DecryptError, StoreError};
use crate::serialize::{CborSerializer, Serializer, SerializerConfig, SessionCodec};

/// Options accepted by [`init`]. Start from `new()` and chain `with_*`.
///
/// Encryption is enabled by default: an encryption salt is required unless
/// `with_encrypt(false)` opts the store into signing-only tokens.
#[derive(Clone)]
pub struct StoreOptions {
    pub signing_salt: Option<Vec<u8>>,
    pub encryption_salt: Option<Vec<u8>>,
    pub encrypt: bool,
    pub serializer: Option<Arc<dyn Serializer>>,
    pub codec: Option<Arc<dyn SessionCodec>>,
    pub derivation: DerivationParams,
    pub key_cache: Option<Arc<dyn KeyCache>>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            signing_salt: None,
            encryption_salt: None,
            encrypt: true,
            serializer: None,
            codec: None,
            derivation: DerivationParams::default(),
            key_cache: None,
        }
    }
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Salt for deriving the signing key. Required.
    pub fn with_signing_salt(mut self, salt: impl Into<Vec<u8>>) -> Self {
        self.signing_salt = Some(salt.into());
        self
    }

    /// Salt for deriving the encryption key. Required unless encryption is
    /// disabled.
    pub fn with_encryption_salt(mut self, salt: impl Into<Vec<u8>>) -> Self {
        self.encryption_salt = Some(salt.into());
        self
    }

    /// Enable or disable encryption. Disabling produces signing-only tokens
    /// whose payload is readable (base64) by the client.
    pub fn with_encrypt(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }

    /// Replace the default CBOR serializer.
    pub fn with_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = Some(serializer);
        self
    }

    /// External codec consumed by the delegating serializer.
    pub fn with_codec(mut self, codec: Arc<dyn SessionCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Override the key derivation parameters.
    pub fn with_derivation(mut self, derivation: DerivationParams) -> Self {
        self.derivation = derivation;
        self
    }

    /// Substitute the derivation cache (tests use [`NoopKeyCache`]).
    ///
    /// [`NoopKeyCache`]: crate::crypto::cache::NoopKeyCache
    pub fn with_key_cache(mut self, cache: Arc<dyn KeyCache>) -> Self {
        self.key_cache = Some(cache);
        self
    }
}

/// Frozen store configuration. Built once by [`init`], then shared read-only
/// across request-handling threads.
pub struct StoreConfig {
    signing_salt: Vec<u8>,
    encryption_salt: Option<Vec<u8>>,
    serializer: Arc<dyn Serializer>,
    serializer_config: SerializerConfig,
    derivation: DerivationParams,
    deriver: KeyDeriver,
}

impl StoreConfig {
    /// Whether tokens from this store are encrypted in addition to signed.
    pub fn encrypting(&self) -> bool {
        self.encryption_salt.is_some()
    }
}

/// Validate options and freeze the store configuration.
pub fn init(options: StoreOptions) -> Result<StoreConfig, ConfigError> {
    let signing_salt = options
        .signing_salt
        .clone()
        .ok_or(ConfigError::MissingSigningSalt)?;

    let encryption_salt = if options.encrypt {
        let salt = options
            .encryption_salt
            .clone()
            .ok_or(ConfigError::MissingEncryptionSalt)?;
        Some(salt)
    } else {
        None
    };

    let serializer: Arc<dyn Serializer> = match &options.serializer {
        Some(serializer) => Arc::clone(serializer),
        None => Arc::new(CborSerializer),
    };
    let serializer_config = serializer.init(&options)?;

    let cache: Arc<dyn KeyCache> = match &options.key_cache {
        Some(cache) => Arc::clone(cache),
        None => Arc::new(MemoryKeyCache::new()),
    };

    Ok(StoreConfig {
        signing_salt,
        encryption_salt,
        serializer,
        serializer_config,
        derivation: options.derivation,
        deriver: KeyDeriver::new(cache),
    })
}

/// Serialize `value` and fold it into a token.
///
/// A serializer failure produces an empty-payload token instead of an error;
/// only secret validation and cipher-key problems surface.
pub fn put(secret: &[u8], value: &Value, config: &StoreConfig) -> Result<String, StoreError> {
    let payload = match config.serializer.encode(value, &config.serializer_config) {
        Ok(bytes) => bytes,
        Err(error) => {
            debug!(error = %error, "session value failed to encode, writing empty token");
            Vec::new()
        }
    };

    let sign_key = config
        .deriver
        .derive(secret, &config.signing_salt, &config.derivation)?;

    match &config.encryption_salt {
        Some(salt) => {
            let cipher_key = config.deriver.derive(secret, salt, &config.derivation)?;
            Ok(encryptor::encrypt_and_sign(&payload, &cipher_key, &sign_key)?)
        }
        None => Ok(verifier::sign(&payload, &sign_key)),
    }
}

/// Recover the session value from a token.
///
/// Fails open: a malformed, tampered, or undecodable token reads as the
/// empty session (`{}`). Only secret validation and cipher-key problems
/// surface as errors.
pub fn get(secret: &[u8], token: &str, config: &StoreConfig) -> Result<Value, StoreError> {
    let sign_key = config
        .deriver
        .derive(secret, &config.signing_salt, &config.derivation)?;

    let payload = match &config.encryption_salt {
        Some(salt) => {
            let cipher_key = config.deriver.derive(secret, salt, &config.derivation)?;
            match encryptor::verify_and_decrypt(token, &cipher_key, &sign_key) {
                Ok(payload) => payload,
                Err(DecryptError::Cipher(error)) => return Err(error.into()),
                Err(DecryptError::Verify(error)) => {
                    debug!(error = %error, "token failed verification, treating session as empty");
                    return Ok(empty_session());
                }
            }
        }
        None => match verifier::verify(token, &sign_key) {
            Ok(payload) => payload,
            Err(error) => {
                debug!(error = %error, "token failed verification, treating session as empty");
                return Ok(empty_session());
            }
        },
    };

    match config.serializer.decode(&payload, &config.serializer_config) {
        Ok(value) => Ok(value),
        Err(error) => {
            debug!(error = %error, "token payload failed to decode, treating session as empty");
            Ok(empty_session())
        }
    }
}

/// Deletion is a no-op: the store keeps no server-side record. A session is
/// deleted by the caller removing the cookie client-side.
pub fn delete(_secret: &[u8], _token: &str, _config: &StoreConfig) {}

/// The empty session value returned whenever a token cannot be trusted.
pub fn empty_session() -> Value {
    Value::Object(Map::new())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::crypto::cache::NoopKeyCache;
    use crate::error::{DecodeError, EncodeError};
    use crate::serialize::CodecSerializer;

    /// 64-byte master secret with a repeating pattern.
    fn master_secret() -> Vec<u8> {
        b"0123456789abcdef".repeat(4)
    }

    /// Low-iteration params so tests stay fast.
    fn fast_params() -> DerivationParams {
        DerivationParams {
            iterations: 10,
            ..DerivationParams::default()
        }
    }

    fn signing_only_options() -> StoreOptions {
        StoreOptions::new()
            .with_signing_salt("signing salt")
            .with_encrypt(false)
            .with_derivation(fast_params())
    }

    /// Serializer whose every operation fails, to check fail-open behavior.
    struct BrokenSerializer;

    impl Serializer for BrokenSerializer {
        fn init(&self, _options: &StoreOptions) -> Result<SerializerConfig, ConfigError> {
            Ok(SerializerConfig::default())
        }

        fn encode(&self, _value: &Value, _config: &SerializerConfig) -> Result<Vec<u8>, EncodeError> {
            Err(EncodeError("broken".to_string()))
        }

        fn decode(&self, _bytes: &[u8], _config: &SerializerConfig) -> Result<Value, DecodeError> {
            Err(DecodeError("broken".to_string()))
        }
    }

    #[test]
    fn test_init_requires_signing_salt() {
        let result = init(StoreOptions::new().with_encrypt(false));
        assert!(
            matches!(result, Err(ConfigError::MissingSigningSalt)),
            "init without a signing salt must fail"
        );
    }

    #[test]
    fn test_init_requires_encryption_salt_by_default() {
        let result = init(StoreOptions::new().with_signing_salt("signing salt"));
        assert!(
            matches!(result, Err(ConfigError::MissingEncryptionSalt)),
            "init without an encryption salt must fail unless encryption is disabled"
        );
    }

    #[test]
    fn test_init_signing_only_when_encryption_disabled() {
        let config = init(signing_only_options()).expect("signing-only init should succeed");
        assert!(!config.encrypting(), "store must be in signing-only mode");
    }

    #[test]
    fn test_init_delegating_serializer_requires_codec() {
        let result = init(
            signing_only_options().with_serializer(Arc::new(CodecSerializer)),
        );
        assert!(
            matches!(result, Err(ConfigError::MissingCodec)),
            "the delegating serializer must reject a missing codec at init"
        );
    }

    #[test]
    fn test_put_get_round_trip_signing_only() {
        let config = init(signing_only_options()).expect("init should succeed");
        let value = json!({"user_id": 17, "role": "admin"});
        let token = put(&master_secret(), &value, &config).expect("put should succeed");
        let recovered = get(&master_secret(), &token, &config).expect("get should succeed");
        assert_eq!(recovered, value, "round trip must recover the exact value");
    }

    #[test]
    fn test_get_garbage_token_reads_as_empty() {
        let config = init(signing_only_options()).expect("init should succeed");
        let recovered =
            get(&master_secret(), "bogus", &config).expect("get must not error on garbage");
        assert_eq!(recovered, empty_session(), "garbage must read as no session");
    }

    #[test]
    fn test_short_secret_is_fatal() {
        let config = init(signing_only_options()).expect("init should succeed");
        let put_result = put(b"short!", &json!({}), &config);
        assert!(
            matches!(put_result, Err(StoreError::Secret(_))),
            "put with a 6-byte secret must fail loudly"
        );
        let get_result = get(b"short!", "anything", &config);
        assert!(
            matches!(get_result, Err(StoreError::Secret(_))),
            "get with a 6-byte secret must fail loudly"
        );
    }

    #[test]
    fn test_encode_failure_writes_empty_token() {
        let config = init(
            signing_only_options().with_serializer(Arc::new(BrokenSerializer)),
        )
        .expect("init should succeed");

        let token = put(&master_secret(), &json!({"lost": true}), &config)
            .expect("put must not surface serializer failures");
        let recovered = get(&master_secret(), &token, &config)
            .expect("get must not surface serializer failures");
        assert_eq!(
            recovered,
            empty_session(),
            "an empty-payload token must read as no session"
        );
    }

    #[test]
    fn test_noop_cache_substitution() {
        let config = init(
            signing_only_options().with_key_cache(Arc::new(NoopKeyCache)),
        )
        .expect("init with a no-op cache should succeed");
        let value = json!({"foo": "bar"});
        let token = put(&master_secret(), &value, &config).expect("put should succeed");
        let recovered = get(&master_secret(), &token, &config).expect("get should succeed");
        assert_eq!(recovered, value, "round trip must hold without a cache");
    }

    #[test]
    fn test_delete_is_a_noop() {
        let config = init(signing_only_options()).expect("init should succeed");
        let value = json!({"foo": "bar"});
        let token = put(&master_secret(), &value, &config).expect("put should succeed");

        delete(&master_secret(), &token, &config);

        let recovered = get(&master_secret(), &token, &config).expect("get should succeed");
        assert_eq!(
            recovered, value,
            "delete holds no server-side state and must not invalidate the token"
        );
    }
}
