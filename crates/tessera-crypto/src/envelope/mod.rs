//! Versioned, self-describing envelopes.
//!
//! An envelope pairs cryptographic output with the metadata needed to
//! reverse or verify it. Two versions exist for both kinds:
//!
//! - **V1** (legacy): ciphertext envelopes name the key by id; signature
//!   envelopes are the bare signature bytes.
//! - **V2**: ciphertext envelopes name an explicit [`CipherSpec`]; signature
//!   envelopes name their [`SignatureAlgorithm`](crate::primitives::SignatureAlgorithm).
//!
//! Envelopes are built fresh for every operation and never persisted.

pub mod ciphertext;
pub mod signature;

use std::fmt;

use base64::Engine as _;
use serde_json::{Map, Value};

use crate::error::{CryptoError, ErrorCode};

pub use ciphertext::{CipherSpec, CiphertextEnvelope, EnvelopeId};
pub use signature::SignatureEnvelope;

/// JSON field carrying the envelope version.
pub const KEY_VERSION: &str = "version";

/// Envelope version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    V1,
    V2,
}

impl Version {
    /// Numeric value of the `version` field.
    pub fn number(self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }

    /// Map a JSON number. Only exactly 1 and 2 are recognized.
    pub fn from_number(value: f64) -> Option<Self> {
        if value == 1.0 {
            Some(Self::V1)
        } else if value == 2.0 {
            Some(Self::V2)
        } else {
            None
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V{}", self.number())
    }
}

/// Outcome of reading the `version` field of an envelope object.
pub(crate) enum VersionField {
    /// Field absent or not a number.
    Absent,
    Recognized(Version),
    /// A number that is not a recognized version.
    Unrecognized(String),
}

pub(crate) fn read_version(obj: &Map<String, Value>) -> VersionField {
    match obj.get(KEY_VERSION) {
        Some(Value::Number(n)) => match n.as_f64().and_then(Version::from_number) {
            Some(version) => VersionField::Recognized(version),
            None => VersionField::Unrecognized(n.to_string()),
        },
        _ => VersionField::Absent,
    }
}

/// Read a mandatory string field.
pub(crate) fn required_str<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
    envelope: &str,
) -> Result<&'a str, CryptoError> {
    obj.get(field).and_then(Value::as_str).ok_or_else(|| {
        CryptoError::encoding(
            ErrorCode::JsonParseError,
            format!("{envelope} envelope field `{field}` is missing or not a string"),
        )
    })
}

/// Read an optional string field. Absent, `null` and `""` all mean "not set".
pub(crate) fn optional_str<'a>(
    obj: &'a Map<String, Value>,
    field: &str,
    envelope: &str,
) -> Result<Option<&'a str>, CryptoError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(CryptoError::encoding(
            ErrorCode::JsonParseError,
            format!("{envelope} envelope field `{field}` is not a string"),
        )),
    }
}

pub(crate) fn b64_encode(data: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(data)
}

/// Decode a base64 field, keeping the decode error as the cause.
pub(crate) fn b64_decode(
    value: &str,
    field: &str,
    code: ErrorCode,
) -> Result<Vec<u8>, CryptoError> {
    base64::engine::general_purpose::STANDARD
        .decode(value)
        .map_err(|e| {
            CryptoError::encoding_with_source(code, format!("invalid base64 in `{field}`"), e)
        })
}

/// Parse bytes as a JSON object.
pub(crate) fn parse_object(data: &[u8], envelope: &str) -> Result<Map<String, Value>, CryptoError> {
    match serde_json::from_slice::<Value>(data) {
        Ok(Value::Object(obj)) => Ok(obj),
        Ok(_) => Err(CryptoError::encoding(
            ErrorCode::JsonParseError,
            format!("{envelope} envelope is not a JSON object"),
        )),
        Err(e) => Err(CryptoError::encoding_with_source(
            ErrorCode::JsonParseError,
            format!("{envelope} envelope is not valid JSON"),
            e,
        )),
    }
}
