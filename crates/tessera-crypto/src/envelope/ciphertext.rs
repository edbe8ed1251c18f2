//! Ciphertext envelope codec.
//!
//! ## Wire format
//!
//! ```text
//! V1 {                              V2 {
//!     keyid:      string,               version:    2,
//!     iv:         base64?,              cipherspec: string,
//!     ciphertext: base64,               iv:         base64?,
//!     sha256:     base64,               ciphertext: base64,
//! }                                 }
//! ```
//!
//! The V1 `sha256` field is always emitted as the fixed placeholder
//! [`SHA256_PLACEHOLDER`]. It is never computed from the envelope contents
//! and never verified on parse; peers on the legacy protocol expect exactly
//! this value, so changing it requires a new envelope version.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{
    b64_decode, b64_encode, optional_str, parse_object, read_version, required_str, Version,
    VersionField, KEY_VERSION,
};
use crate::error::{CryptoError, ErrorCode};

/// JSON field names.
pub const KEY_KEY_ID: &str = "keyid";
pub const KEY_CIPHERSPEC: &str = "cipherspec";
pub const KEY_IV: &str = "iv";
pub const KEY_CIPHERTEXT: &str = "ciphertext";
pub const KEY_SHA256: &str = "sha256";

/// Fixed V1 integrity value (base64 of a single zero byte).
pub const SHA256_PLACEHOLDER: &str = "AA==";

/// Decoded form of [`SHA256_PLACEHOLDER`].
const SHA256_PLACEHOLDER_BYTES: &[u8] = &[0];

const ENVELOPE: &str = "ciphertext";

/// Recognized cipher specifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CipherSpec {
    /// AES in CBC mode with PKCS#5 padding.
    #[serde(rename = "AES/CBC/PKCS5Padding")]
    AesCbcPkcs5Padding,
}

impl CipherSpec {
    /// Every recognized cipher spec.
    pub const ALL: [Self; 1] = [Self::AesCbcPkcs5Padding];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AesCbcPkcs5Padding => "AES/CBC/PKCS5Padding",
        }
    }

    /// Look up a cipher spec by its exact wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|spec| spec.as_str() == name)
    }
}

impl fmt::Display for CipherSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CipherSpec {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            CryptoError::protocol(ErrorCode::UnidentifiedCipherSpec, format!("cipher spec {s:?}"))
        })
    }
}

/// What an envelope uses to identify how its ciphertext is reversed.
///
/// The variant fixes the envelope version: a key id produces V1, a cipher
/// spec produces V2.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EnvelopeId {
    KeyId(String),
    CipherSpec(CipherSpec),
}

impl EnvelopeId {
    /// Classify a caller-supplied identifier. A string equal to a recognized
    /// cipher spec wire name selects V2; anything else is a key id.
    pub fn from_identifier(identifier: &str) -> Self {
        match CipherSpec::from_name(identifier) {
            Some(spec) => Self::CipherSpec(spec),
            None => Self::KeyId(identifier.to_string()),
        }
    }
}

/// An encrypted payload plus the metadata needed to decrypt it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CiphertextEnvelope {
    id: EnvelopeId,
    iv: Option<Vec<u8>>,
    ciphertext: Vec<u8>,
}

impl CiphertextEnvelope {
    /// Create an envelope. The version follows from `id`.
    ///
    /// An empty IV is stored as no IV, matching how parsing reads `"iv": ""`.
    pub fn new(id: EnvelopeId, iv: Option<Vec<u8>>, ciphertext: Vec<u8>) -> Self {
        let iv = iv.filter(|iv| !iv.is_empty());
        Self { id, iv, ciphertext }
    }

    /// Create an envelope from a key id or cipher spec name. See
    /// [`EnvelopeId::from_identifier`].
    pub fn create(identifier: &str, iv: Option<Vec<u8>>, ciphertext: Vec<u8>) -> Self {
        Self::new(EnvelopeId::from_identifier(identifier), iv, ciphertext)
    }

    /// Create a V1 envelope naming the key by id.
    pub fn with_key_id(
        key_id: impl Into<String>,
        iv: Option<Vec<u8>>,
        ciphertext: Vec<u8>,
    ) -> Self {
        Self::new(EnvelopeId::KeyId(key_id.into()), iv, ciphertext)
    }

    /// Create a V2 envelope naming the cipher spec.
    pub fn with_cipher_spec(spec: CipherSpec, iv: Option<Vec<u8>>, ciphertext: Vec<u8>) -> Self {
        Self::new(EnvelopeId::CipherSpec(spec), iv, ciphertext)
    }

    /// Version implied by the envelope id.
    pub fn version(&self) -> Version {
        match self.id {
            EnvelopeId::KeyId(_) => Version::V1,
            EnvelopeId::CipherSpec(_) => Version::V2,
        }
    }

    /// Key id or cipher spec.
    pub fn id(&self) -> &EnvelopeId {
        &self.id
    }

    /// Key id (V1 only).
    pub fn key_id(&self) -> Option<&str> {
        match &self.id {
            EnvelopeId::KeyId(id) => Some(id),
            EnvelopeId::CipherSpec(_) => None,
        }
    }

    /// Cipher spec (V2 only).
    pub fn cipher_spec(&self) -> Option<CipherSpec> {
        match self.id {
            EnvelopeId::KeyId(_) => None,
            EnvelopeId::CipherSpec(spec) => Some(spec),
        }
    }

    /// Initialization vector, if any. Never `Some` of an empty slice.
    pub fn iv(&self) -> Option<&[u8]> {
        self.iv.as_deref()
    }

    /// Raw ciphertext bytes.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    /// V1 integrity value. Always the fixed placeholder; `None` for V2.
    pub fn integrity(&self) -> Option<&'static [u8]> {
        match self.version() {
            Version::V1 => Some(SHA256_PLACEHOLDER_BYTES),
            Version::V2 => None,
        }
    }

    /// Parse an envelope from a JSON value.
    ///
    /// With no `hint` the version comes from the `version` field; an absent
    /// or non-numeric field selects V1.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::ProtocolMismatch`] for an unrecognized version or
    ///   cipher spec.
    /// - [`CryptoError::Encoding`] for missing or mistyped fields and for
    ///   undecodable base64.
    pub fn parse(value: &Value, hint: Option<Version>) -> Result<Self, CryptoError> {
        let obj = value.as_object().ok_or_else(|| {
            CryptoError::encoding(
                ErrorCode::JsonParseError,
                "ciphertext envelope is not a JSON object",
            )
        })?;
        Self::parse_map(obj, hint)
    }

    /// Parse an envelope from JSON text.
    ///
    /// # Errors
    ///
    /// As [`parse`](Self::parse), plus [`CryptoError::Encoding`] with the
    /// `serde_json` error as source when `text` is not valid JSON.
    pub fn from_text(text: &[u8], hint: Option<Version>) -> Result<Self, CryptoError> {
        let obj = parse_object(text, ENVELOPE)?;
        Self::parse_map(&obj, hint)
    }

    fn parse_map(obj: &Map<String, Value>, hint: Option<Version>) -> Result<Self, CryptoError> {
        let version = match hint {
            Some(version) => version,
            None => match read_version(obj) {
                VersionField::Absent => Version::V1,
                VersionField::Recognized(version) => version,
                VersionField::Unrecognized(raw) => {
                    return Err(CryptoError::protocol(
                        ErrorCode::UnsupportedCiphertextEnvelope,
                        format!("ciphertext envelope version {raw}"),
                    ))
                }
            },
        };

        match version {
            Version::V1 => Self::parse_v1(obj),
            Version::V2 => Self::parse_v2(obj),
        }
    }

    fn parse_v1(obj: &Map<String, Value>) -> Result<Self, CryptoError> {
        let key_id = required_str(obj, KEY_KEY_ID, ENVELOPE)?;
        let iv = optional_str(obj, KEY_IV, ENVELOPE)?;
        let ciphertext = required_str(obj, KEY_CIPHERTEXT, ENVELOPE)?;
        // Presence only; the value is a placeholder.
        required_str(obj, KEY_SHA256, ENVELOPE)?;

        Ok(Self {
            id: EnvelopeId::KeyId(key_id.to_string()),
            iv: decode_iv(iv)?,
            ciphertext: b64_decode(
                ciphertext,
                KEY_CIPHERTEXT,
                ErrorCode::CiphertextEnvelopeParseError,
            )?,
        })
    }

    fn parse_v2(obj: &Map<String, Value>) -> Result<Self, CryptoError> {
        match read_version(obj) {
            VersionField::Recognized(Version::V2) => {}
            _ => {
                return Err(CryptoError::protocol(
                    ErrorCode::UnsupportedCiphertextEnvelope,
                    format!("ciphertext envelope `{KEY_VERSION}` is not 2"),
                ))
            }
        }

        // The cipher spec is checked before the payload fields so that an
        // unknown spec is reported as such.
        let spec_name = required_str(obj, KEY_CIPHERSPEC, ENVELOPE)?;
        let spec = spec_name.parse::<CipherSpec>()?;
        let iv = optional_str(obj, KEY_IV, ENVELOPE)?;
        let ciphertext = required_str(obj, KEY_CIPHERTEXT, ENVELOPE)?;

        Ok(Self {
            id: EnvelopeId::CipherSpec(spec),
            iv: decode_iv(iv)?,
            ciphertext: b64_decode(
                ciphertext,
                KEY_CIPHERTEXT,
                ErrorCode::CiphertextEnvelopeParseError,
            )?,
        })
    }

    /// Serialize to a JSON value.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        match &self.id {
            EnvelopeId::KeyId(key_id) => {
                obj.insert(KEY_KEY_ID.into(), Value::String(key_id.clone()));
            }
            EnvelopeId::CipherSpec(spec) => {
                obj.insert(KEY_VERSION.into(), Value::from(Version::V2.number()));
                obj.insert(KEY_CIPHERSPEC.into(), Value::String(spec.as_str().into()));
            }
        }
        if let Some(iv) = &self.iv {
            obj.insert(KEY_IV.into(), Value::String(b64_encode(iv)));
        }
        obj.insert(KEY_CIPHERTEXT.into(), Value::String(b64_encode(&self.ciphertext)));
        if self.version() == Version::V1 {
            obj.insert(KEY_SHA256.into(), Value::String(SHA256_PLACEHOLDER.into()));
        }
        Value::Object(obj)
    }

    /// Serialize to JSON text.
    pub fn to_text(&self) -> String {
        self.to_json().to_string()
    }
}

fn decode_iv(iv: Option<&str>) -> Result<Option<Vec<u8>>, CryptoError> {
    iv.map(|iv| b64_decode(iv, KEY_IV, ErrorCode::CiphertextEnvelopeParseError))
        .transpose()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_create_selects_version_from_identifier() {
        let v2 = CiphertextEnvelope::create("AES/CBC/PKCS5Padding", None, vec![1]);
        assert_eq!(v2.version(), Version::V2);
        assert_eq!(v2.cipher_spec(), Some(CipherSpec::AesCbcPkcs5Padding));

        for key_id in ["alice", "aes/cbc/pkcs5padding", ""] {
            let v1 = CiphertextEnvelope::create(key_id, None, vec![1]);
            assert_eq!(v1.version(), Version::V1);
            assert_eq!(v1.key_id(), Some(key_id));
        }
    }

    #[test]
    fn test_empty_iv_is_absent() {
        let envelope = CiphertextEnvelope::with_key_id("k", Some(Vec::new()), vec![1, 2]);
        assert_eq!(envelope.iv(), None);
        assert!(envelope.to_json().get(KEY_IV).is_none());

        let parsed = CiphertextEnvelope::from_text(envelope.to_text().as_bytes(), None)
            .expect("parse");
        assert_eq!(parsed, envelope);

        let text = json!({"keyid": "k", "iv": "", "ciphertext": "AQI=", "sha256": "AA=="});
        let parsed = CiphertextEnvelope::parse(&text, None).expect("empty iv field");
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn test_v1_roundtrip() {
        for iv in [None, Some(vec![7u8; 16])] {
            let envelope = CiphertextEnvelope::with_key_id("alice", iv.clone(), vec![1, 2, 3, 4]);
            let text = envelope.to_text();
            let parsed = CiphertextEnvelope::from_text(text.as_bytes(), None).expect("parse");

            assert_eq!(parsed.version(), Version::V1);
            assert_eq!(parsed.key_id(), Some("alice"));
            assert_eq!(parsed.iv(), iv.as_deref());
            assert_eq!(parsed.ciphertext(), &[1, 2, 3, 4]);
            assert_eq!(parsed, envelope);
        }
    }

    #[test]
    fn test_v2_roundtrip() {
        for iv in [None, Some(vec![9u8; 16])] {
            let envelope = CiphertextEnvelope::with_cipher_spec(
                CipherSpec::AesCbcPkcs5Padding,
                iv.clone(),
                vec![5; 32],
            );
            let parsed = CiphertextEnvelope::parse(&envelope.to_json(), None).expect("parse");

            assert_eq!(parsed.version(), Version::V2);
            assert_eq!(parsed.cipher_spec(), Some(CipherSpec::AesCbcPkcs5Padding));
            assert_eq!(parsed.key_id(), None);
            assert_eq!(parsed.iv(), iv.as_deref());
            assert_eq!(parsed.ciphertext(), &[5; 32]);
        }
    }

    #[test]
    fn test_v1_wire_fields() {
        let envelope = CiphertextEnvelope::with_key_id("k1", None, vec![0xff]);
        let json = envelope.to_json();
        assert_eq!(json["keyid"], "k1");
        assert_eq!(json["ciphertext"], "/w==");
        assert_eq!(json["sha256"], SHA256_PLACEHOLDER);
        assert!(json.get("iv").is_none());
        assert!(json.get("version").is_none());
        assert_eq!(envelope.integrity(), Some(&[0u8][..]));
    }

    #[test]
    fn test_v2_wire_fields() {
        let envelope = CiphertextEnvelope::with_cipher_spec(
            CipherSpec::AesCbcPkcs5Padding,
            Some(vec![0; 16]),
            vec![1],
        );
        let json = envelope.to_json();
        assert_eq!(json["version"], 2);
        assert_eq!(json["cipherspec"], "AES/CBC/PKCS5Padding");
        assert!(json.get("keyid").is_none());
        assert!(json.get("sha256").is_none());
        assert_eq!(envelope.integrity(), None);
    }

    #[test]
    fn test_sha256_not_verified() {
        let json = json!({"keyid": "k", "ciphertext": "AQID", "sha256": "bm90IGEgZGlnZXN0"});
        let parsed = CiphertextEnvelope::parse(&json, None).expect("placeholder accepted");
        assert_eq!(parsed.ciphertext(), &[1, 2, 3]);
    }

    #[test]
    fn test_v1_missing_ciphertext() {
        let mut json = CiphertextEnvelope::with_key_id("k", None, vec![1]).to_json();
        json.as_object_mut().expect("object").remove("ciphertext");
        let err = CiphertextEnvelope::parse(&json, None).expect_err("missing ciphertext");
        assert_eq!(err.kind(), ErrorKind::Encoding);
        assert_eq!(err.code(), ErrorCode::JsonParseError);
    }

    #[test]
    fn test_v1_missing_sha256() {
        let json = json!({"keyid": "k", "ciphertext": "AQID"});
        let err = CiphertextEnvelope::parse(&json, None).expect_err("missing sha256");
        assert_eq!(err.kind(), ErrorKind::Encoding);
    }

    #[test]
    fn test_v1_wrong_field_type() {
        let json = json!({"keyid": 42, "ciphertext": "AQID", "sha256": "AA=="});
        let err = CiphertextEnvelope::parse(&json, None).expect_err("numeric keyid");
        assert_eq!(err.kind(), ErrorKind::Encoding);

        let json = json!({"keyid": "k", "iv": [1], "ciphertext": "AQID", "sha256": "AA=="});
        let err = CiphertextEnvelope::parse(&json, None).expect_err("array iv");
        assert_eq!(err.kind(), ErrorKind::Encoding);
    }

    #[test]
    fn test_unknown_cipher_spec() {
        let json = json!({"version": 2, "cipherspec": "UNKNOWN"});
        let err = CiphertextEnvelope::parse(&json, None).expect_err("unknown spec");
        assert_eq!(err.kind(), ErrorKind::ProtocolMismatch);
        assert_eq!(err.code(), ErrorCode::UnidentifiedCipherSpec);
    }

    #[test]
    fn test_unknown_version() {
        let json = json!({"version": 99, "keyid": "k", "ciphertext": "AQID", "sha256": "AA=="});
        let err = CiphertextEnvelope::parse(&json, None).expect_err("version 99");
        assert_eq!(err.kind(), ErrorKind::ProtocolMismatch);
        assert_eq!(err.code(), ErrorCode::UnsupportedCiphertextEnvelope);
    }

    #[test]
    fn test_non_numeric_version_falls_back_to_v1() {
        let json = json!({"version": "two", "keyid": "k", "ciphertext": "AQID", "sha256": "AA=="});
        let parsed = CiphertextEnvelope::parse(&json, None).expect("legacy fallback");
        assert_eq!(parsed.version(), Version::V1);
    }

    #[test]
    fn test_hint_overrides_version_field() {
        let v2 =
            CiphertextEnvelope::with_cipher_spec(CipherSpec::AesCbcPkcs5Padding, None, vec![1]);
        let err = CiphertextEnvelope::parse(&v2.to_json(), Some(Version::V1))
            .expect_err("no keyid");
        assert_eq!(err.kind(), ErrorKind::Encoding);

        let v1 = CiphertextEnvelope::with_key_id("k", None, vec![1]);
        let err = CiphertextEnvelope::parse(&v1.to_json(), Some(Version::V2))
            .expect_err("no version");
        assert_eq!(err.code(), ErrorCode::UnsupportedCiphertextEnvelope);
    }

    #[test]
    fn test_v2_missing_ciphertext() {
        let json = json!({"version": 2, "cipherspec": "AES/CBC/PKCS5Padding"});
        let err = CiphertextEnvelope::parse(&json, None).expect_err("missing ciphertext");
        assert_eq!(err.kind(), ErrorKind::Encoding);
    }

    #[test]
    fn test_bad_base64_keeps_cause() {
        let json = json!({"keyid": "k", "iv": "***", "ciphertext": "AQID", "sha256": "AA=="});
        let err = CiphertextEnvelope::parse(&json, None).expect_err("bad iv");
        assert_eq!(err.code(), ErrorCode::CiphertextEnvelopeParseError);
        let source = std::error::Error::source(&err).expect("decode cause");
        assert!(source.downcast_ref::<base64::DecodeError>().is_some());
    }

    #[test]
    fn test_from_text_rejects_garbage() {
        let err = CiphertextEnvelope::from_text(b"\xff\xfe not json", None).expect_err("garbage");
        assert_eq!(err.code(), ErrorCode::JsonParseError);
        let source = std::error::Error::source(&err).expect("json cause");
        assert!(source.downcast_ref::<serde_json::Error>().is_some());
    }

    #[test]
    fn test_cipher_spec_from_str() {
        assert_eq!(
            "AES/CBC/PKCS5Padding".parse::<CipherSpec>().expect("known"),
            CipherSpec::AesCbcPkcs5Padding
        );
        let err = "AES/GCM/NoPadding".parse::<CipherSpec>().expect_err("unknown");
        assert_eq!(err.kind(), ErrorKind::ProtocolMismatch);
    }
}
