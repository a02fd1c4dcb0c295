//! Pluggable value serialization.
//!
//! The store converts the session value to bytes through exactly one
//! [`Serializer`], selected at initialization. Third parties add wire
//! encodings by implementing the trait; the delegating variant adapts an
//! external text codec instead of encoding anything itself.

pub mod cbor;
pub mod external;

use std::sync::Arc;

use serde_json::Value;

use crate::error::{ConfigError, DecodeError, EncodeError};
use crate::store::StoreOptions;

pub use cbor::CborSerializer;
pub use external::{CodecError, CodecSerializer, JsonCodec, SessionCodec};

/// Opaque per-store serializer state, produced once by [`Serializer::init`]
/// and threaded into every encode/decode call.
#[derive(Clone, Default)]
pub struct SerializerConfig {
    pub(crate) codec: Option<Arc<dyn SessionCodec>>,
}

/// Converts the application-level session value to and from a byte payload.
pub trait Serializer: Send + Sync {
    /// Validate options and build this serializer's config. Raises only
    /// configuration errors, never request-time ones.
    fn init(&self, options: &StoreOptions) -> Result<SerializerConfig, ConfigError>;

    /// Encode a value into a byte payload.
    fn encode(&self, value: &Value, config: &SerializerConfig) -> Result<Vec<u8>, EncodeError>;

    /// Decode an untrusted byte payload. Malformed bytes are an error, never
    /// a panic.
    fn decode(&self, bytes: &[u8], config: &SerializerConfig) -> Result<Value, DecodeError>;
}
