//! Self-describing binary serialization via CBOR.

use serde_json::Value;

use crate::error::{ConfigError, DecodeError, EncodeError};
use crate::store::StoreOptions;

use super::{Serializer, SerializerConfig};

/// Default serializer: encodes the session value as CBOR. Needs no
/// configuration.
#[derive(Clone, Copy, Default)]
pub struct CborSerializer;

impl Serializer for CborSerializer {
    fn init(&self, _options: &StoreOptions) -> Result<SerializerConfig, ConfigError> {
        Ok(SerializerConfig::default())
    }

    fn encode(&self, value: &Value, _config: &SerializerConfig) -> Result<Vec<u8>, EncodeError> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf).map_err(|e| EncodeError(e.to_string()))?;
        Ok(buf)
    }

    fn decode(&self, bytes: &[u8], _config: &SerializerConfig) -> Result<Value, DecodeError> {
        ciborium::from_reader(bytes).map_err(|e| DecodeError(e.to_string()))
    }
}
