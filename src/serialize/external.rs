//! Delegating serializer: adapts an externally supplied text codec.

use std::sync::Arc;

use serde_json::Value;

use crate::error::{ConfigError, DecodeError, EncodeError};
use crate::store::StoreOptions;

use super::{Serializer, SerializerConfig};

/// Boxed error produced by external codecs. Only its presence matters: the
/// serializer normalizes every codec failure to `EncodeError`/`DecodeError`,
/// so callers never see the codec's own error vocabulary.
pub type CodecError = Box<dyn std::error::Error + Send + Sync>;

/// A text codec supplied by the embedding application.
pub trait SessionCodec: Send + Sync {
    fn encode(&self, value: &Value) -> Result<String, CodecError>;
    fn decode(&self, text: &str) -> Result<Value, CodecError>;
}

/// Serializer that delegates to the codec configured in [`StoreOptions`].
///
/// `init` fails when no codec was supplied.
#[derive(Clone, Copy, Default)]
pub struct CodecSerializer;

impl Serializer for CodecSerializer {
    fn init(&self, options: &StoreOptions) -> Result<SerializerConfig, ConfigError> {
        let codec = options.codec.clone().ok_or(ConfigError::MissingCodec)?;
        Ok(SerializerConfig { codec: Some(codec) })
    }

    fn encode(&self, value: &Value, config: &SerializerConfig) -> Result<Vec<u8>, EncodeError> {
        let codec = config
            .codec
            .as_ref()
            .ok_or_else(|| EncodeError("codec not initialized".to_string()))?;
        let text = codec.encode(value).map_err(|e| EncodeError(e.to_string()))?;
        Ok(text.into_bytes())
    }

    fn decode(&self, bytes: &[u8], config: &SerializerConfig) -> Result<Value, DecodeError> {
        let codec = config
            .codec
            .as_ref()
            .ok_or_else(|| DecodeError("codec not initialized".to_string()))?;
        let text = std::str::from_utf8(bytes).map_err(|e| DecodeError(e.to_string()))?;
        codec.decode(text).map_err(|e| DecodeError(e.to_string()))
    }
}

/// JSON codec over `serde_json`, for stores that want a readable text
/// payload.
#[derive(Clone, Copy, Default)]
pub struct JsonCodec;

impl SessionCodec for JsonCodec {
    fn encode(&self, value: &Value) -> Result<String, CodecError> {
        Ok(serde_json::to_string(value)?)
    }

    fn decode(&self, text: &str) -> Result<Value, CodecError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    /// Codec whose every operation fails, to check error normalization.
    struct FailingCodec;

    impl SessionCodec for FailingCodec {
        fn encode(&self, _value: &Value) -> Result<String, CodecError> {
            Err("codec exploded on encode".into())
        }

        fn decode(&self, _text: &str) -> Result<Value, CodecError> {
            Err("codec exploded on decode".into())
        }
    }

    fn json_config() -> SerializerConfig {
        CodecSerializer
            .init(&StoreOptions::new().with_codec(Arc::new(JsonCodec)))
            .expect("init with a codec should succeed")
    }

    #[test]
    fn test_init_requires_codec() {
        let result = CodecSerializer.init(&StoreOptions::new());
        assert!(
            matches!(result, Err(ConfigError::MissingCodec)),
            "init without a codec must fail, got: {:?}",
            result.err()
        );
    }

    #[test]
    fn test_json_round_trip() {
        let value = json!({"foo": "bar", "n": 7});
        let config = json_config();
        let bytes = CodecSerializer
            .encode(&value, &config)
            .expect("encode should succeed");
        let decoded = CodecSerializer
            .decode(&bytes, &config)
            .expect("decode should succeed");
        assert_eq!(decoded, value, "decoded value must match the original");
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let result = CodecSerializer.decode(&[0xff, 0xfe, 0xfd], &json_config());
        assert!(result.is_err(), "non-UTF-8 bytes must be a decode error");
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        let result = CodecSerializer.decode(b"{not json", &json_config());
        assert!(result.is_err(), "invalid JSON must be a decode error");
    }

    #[test]
    fn test_codec_errors_are_normalized() {
        let config = CodecSerializer
            .init(&StoreOptions::new().with_codec(Arc::new(FailingCodec)))
            .expect("init with a codec should succeed");

        let encode_err = CodecSerializer
            .encode(&json!({}), &config)
            .expect_err("failing codec must yield EncodeError");
        assert!(
            encode_err.to_string().contains("serializer encode failed"),
            "codec errors must surface as the serializer's own type, got: {}",
            encode_err
        );

        let decode_err = CodecSerializer
            .decode(b"{}", &config)
            .expect_err("failing codec must yield DecodeError");
        assert!(
            decode_err.to_string().contains("serializer decode failed"),
            "codec errors must surface as the serializer's own type, got: {}",
            decode_err
        );
    }
}
