//! Signature envelope codec.
//!
//! A V1 envelope is the raw signature bytes with no framing. A V2 envelope
//! is JSON text naming the algorithm:
//!
//! ```text
//! V2 { version: 2, algorithm: "SHA256withRSA", signature: base64 }
//! ```
//!
//! Without a version hint, input that is a JSON object whose `version` is
//! exactly 2 is read as V2 and anything else as V1, because a raw V1
//! signature has no structure to inspect.

use serde_json::{Map, Value};

use super::{
    b64_decode, b64_encode, parse_object, read_version, required_str, Version, VersionField,
    KEY_VERSION,
};
use crate::error::{CryptoError, ErrorCode};
use crate::primitives::SignatureAlgorithm;

/// JSON field names.
pub const KEY_ALGORITHM: &str = "algorithm";
pub const KEY_SIGNATURE: &str = "signature";

const ENVELOPE: &str = "signature";

/// Signature bytes plus, for V2, the algorithm that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureEnvelope {
    V1 { signature: Vec<u8> },
    V2 { algorithm: SignatureAlgorithm, signature: Vec<u8> },
}

impl SignatureEnvelope {
    /// V1 envelope around raw signature bytes.
    pub fn v1(signature: Vec<u8>) -> Self {
        Self::V1 { signature }
    }

    /// V2 envelope naming the algorithm.
    pub fn v2(algorithm: SignatureAlgorithm, signature: Vec<u8>) -> Self {
        Self::V2 { algorithm, signature }
    }

    /// Envelope version.
    pub fn version(&self) -> Version {
        match self {
            Self::V1 { .. } => Version::V1,
            Self::V2 { .. } => Version::V2,
        }
    }

    /// Algorithm (V2 only).
    pub fn algorithm(&self) -> Option<SignatureAlgorithm> {
        match self {
            Self::V1 { .. } => None,
            Self::V2 { algorithm, .. } => Some(*algorithm),
        }
    }

    /// Raw signature bytes.
    pub fn signature(&self) -> &[u8] {
        match self {
            Self::V1 { signature } | Self::V2 { signature, .. } => signature,
        }
    }

    /// Parse envelope bytes.
    ///
    /// # Errors
    ///
    /// Only V2 parsing can fail:
    /// - [`CryptoError::Encoding`] for invalid JSON, missing or mistyped
    ///   fields, or undecodable base64.
    /// - [`CryptoError::ProtocolMismatch`] for a `version` other than 2 or an
    ///   unrecognized algorithm.
    pub fn parse(data: &[u8], hint: Option<Version>) -> Result<Self, CryptoError> {
        match hint {
            Some(Version::V1) => Ok(Self::v1(data.to_vec())),
            Some(Version::V2) => Self::parse_v2(&parse_object(data, ENVELOPE)?),
            None => match serde_json::from_slice::<Value>(data) {
                Ok(Value::Object(obj))
                    if matches!(read_version(&obj), VersionField::Recognized(Version::V2)) =>
                {
                    Self::parse_v2(&obj)
                }
                _ => Ok(Self::v1(data.to_vec())),
            },
        }
    }

    fn parse_v2(obj: &Map<String, Value>) -> Result<Self, CryptoError> {
        if !matches!(read_version(obj), VersionField::Recognized(Version::V2)) {
            return Err(CryptoError::protocol(
                ErrorCode::UnsupportedSignatureEnvelope,
                format!("signature envelope `{KEY_VERSION}` is not 2"),
            ));
        }

        let name = required_str(obj, KEY_ALGORITHM, ENVELOPE)?;
        let algorithm = SignatureAlgorithm::from_name(name).ok_or_else(|| {
            CryptoError::protocol(
                ErrorCode::UnidentifiedSignatureAlgorithm,
                format!("signature algorithm {name:?}"),
            )
        })?;
        let signature = required_str(obj, KEY_SIGNATURE, ENVELOPE)?;

        Ok(Self::V2 {
            algorithm,
            signature: b64_decode(
                signature,
                KEY_SIGNATURE,
                ErrorCode::SignatureEnvelopeParseError,
            )?,
        })
    }

    /// Serialize to envelope bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::V1 { signature } => signature.clone(),
            Self::V2 { algorithm, signature } => {
                let mut obj = Map::new();
                obj.insert(KEY_VERSION.into(), Value::from(Version::V2.number()));
                obj.insert(KEY_ALGORITHM.into(), Value::String(algorithm.name().into()));
                obj.insert(KEY_SIGNATURE.into(), Value::String(b64_encode(signature)));
                Value::Object(obj).to_string().into_bytes()
            }
        }
    }
}
