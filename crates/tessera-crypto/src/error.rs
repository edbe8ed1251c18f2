//! Error taxonomy for envelope and crypto-context operations.
//!
//! Every fault that crosses the crate boundary is a [`CryptoError`]. The
//! variant names the category ([`ErrorKind`]); the embedded [`ErrorCode`]
//! names the precise reason and carries a stable numeric code that peers can
//! exchange.
//!
//! | Kind | Raised for |
//! |---|---|
//! | `Encoding` | malformed envelope fields, wrong field types, bad JSON or base64 |
//! | `CapabilityUnavailable` | required key absent, or wrap/unwrap disabled |
//! | `CryptoOperation` | the primitive provider failed |
//! | `ProtocolMismatch` | unknown version, cipher spec or algorithm; key-id mismatch; key type |
//! | `Internal` | an operation aborted without producing an outcome |

use std::fmt;

/// Boxed cause kept for JSON syntax and base64 decode failures.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Category of a [`CryptoError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed or incomplete encoded data.
    Encoding,
    /// The operation is not available on this context instance.
    CapabilityUnavailable,
    /// The underlying primitive failed.
    CryptoOperation,
    /// The peer speaks a version, algorithm or identity this side does not accept.
    ProtocolMismatch,
    /// Defensive failure that should not occur in normal operation.
    Internal,
}

/// Fine-grained reason for a [`CryptoError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Encoding (1xxx)
    /// Input is not valid JSON, or a required field is missing or mistyped.
    JsonParseError,
    /// A ciphertext envelope field could not be decoded.
    CiphertextEnvelopeParseError,
    /// A ciphertext envelope lacks the initialization vector its cipher needs.
    CiphertextEnvelopeMissingIv,
    /// A signature envelope field could not be decoded.
    SignatureEnvelopeParseError,

    // Capability (2xxx)
    /// Encryption requested without the required key.
    EncryptNotSupported,
    /// Decryption requested without the required key.
    DecryptNotSupported,
    /// Wrapping requested without the required key or wrap transform.
    WrapNotSupported,
    /// Unwrapping requested without the required key or wrap transform.
    UnwrapNotSupported,
    /// Signing requested without the required key.
    SignNotSupported,
    /// Verification requested without the required key.
    VerifyNotSupported,

    // Crypto operation (3xxx)
    /// The encrypt primitive failed.
    EncryptError,
    /// The decrypt primitive failed.
    DecryptError,
    /// The key-wrap primitive failed.
    WrapError,
    /// The key-unwrap primitive failed.
    UnwrapError,
    /// The sign primitive failed.
    SignatureError,
    /// The verify primitive failed.
    VerifyError,

    // Protocol mismatch (4xxx)
    /// Ciphertext envelope version is not recognized.
    UnsupportedCiphertextEnvelope,
    /// Cipher spec string does not map to a recognized cipher spec.
    UnidentifiedCipherSpec,
    /// Signature envelope version is not recognized.
    UnsupportedSignatureEnvelope,
    /// Signature algorithm string does not map to a recognized algorithm.
    UnidentifiedSignatureAlgorithm,
    /// Envelope key id does not match the context identity.
    EnvelopeKeyIdMismatch,
    /// Unwrapped key reported an unrecognized key type.
    UnsupportedKeyType,

    // Internal (5xxx)
    /// An operation aborted without delivering an outcome.
    InternalException,
}

impl ErrorCode {
    /// Stable numeric code.
    pub fn code(self) -> u32 {
        match self {
            Self::JsonParseError => 1000,
            Self::CiphertextEnvelopeParseError => 1001,
            Self::CiphertextEnvelopeMissingIv => 1002,
            Self::SignatureEnvelopeParseError => 1003,
            Self::EncryptNotSupported => 2000,
            Self::DecryptNotSupported => 2001,
            Self::WrapNotSupported => 2002,
            Self::UnwrapNotSupported => 2003,
            Self::SignNotSupported => 2004,
            Self::VerifyNotSupported => 2005,
            Self::EncryptError => 3000,
            Self::DecryptError => 3001,
            Self::WrapError => 3002,
            Self::UnwrapError => 3003,
            Self::SignatureError => 3004,
            Self::VerifyError => 3005,
            Self::UnsupportedCiphertextEnvelope => 4000,
            Self::UnidentifiedCipherSpec => 4001,
            Self::UnsupportedSignatureEnvelope => 4002,
            Self::UnidentifiedSignatureAlgorithm => 4003,
            Self::EnvelopeKeyIdMismatch => 4004,
            Self::UnsupportedKeyType => 4005,
            Self::InternalException => 5000,
        }
    }

    /// Human-readable message.
    pub fn message(self) -> &'static str {
        match self {
            Self::JsonParseError => "error parsing JSON",
            Self::CiphertextEnvelopeParseError => "error parsing ciphertext envelope",
            Self::CiphertextEnvelopeMissingIv => {
                "ciphertext envelope is missing the initialization vector"
            }
            Self::SignatureEnvelopeParseError => "error parsing signature envelope",
            Self::EncryptNotSupported => "encryption not supported",
            Self::DecryptNotSupported => "decryption not supported",
            Self::WrapNotSupported => "wrap not supported",
            Self::UnwrapNotSupported => "unwrap not supported",
            Self::SignNotSupported => "sign not supported",
            Self::VerifyNotSupported => "verify not supported",
            Self::EncryptError => "error encrypting plaintext",
            Self::DecryptError => "error decrypting ciphertext",
            Self::WrapError => "error wrapping key",
            Self::UnwrapError => "error unwrapping key",
            Self::SignatureError => "error computing signature",
            Self::VerifyError => "error verifying signature",
            Self::UnsupportedCiphertextEnvelope => "unsupported ciphertext envelope version",
            Self::UnidentifiedCipherSpec => "unidentified cipher specification",
            Self::UnsupportedSignatureEnvelope => "unsupported signature envelope version",
            Self::UnidentifiedSignatureAlgorithm => "unidentified signature algorithm",
            Self::EnvelopeKeyIdMismatch => "envelope key id does not match crypto context identity",
            Self::UnsupportedKeyType => "unsupported key type",
            Self::InternalException => "internal exception",
        }
    }

    /// The category this code belongs to.
    pub fn kind(self) -> ErrorKind {
        match self.code() / 1000 {
            1 => ErrorKind::Encoding,
            2 => ErrorKind::CapabilityUnavailable,
            3 => ErrorKind::CryptoOperation,
            4 => ErrorKind::ProtocolMismatch,
            _ => ErrorKind::Internal,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Error type for envelope and crypto-context operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Malformed or incomplete envelope data.
    #[error("{code}: {detail}")]
    Encoding {
        code: ErrorCode,
        detail: String,
        /// JSON syntax or base64 cause, when one exists.
        #[source]
        source: Option<BoxedSource>,
    },

    /// The operation is disabled for this context instance.
    #[error("{code}: {detail}")]
    CapabilityUnavailable { code: ErrorCode, detail: String },

    /// The primitive provider failed. Provider detail is not retained.
    #[error("{code}: {detail}")]
    CryptoOperation { code: ErrorCode, detail: String },

    /// Version, algorithm, identity or key type not accepted.
    #[error("{code}: {detail}")]
    ProtocolMismatch { code: ErrorCode, detail: String },

    /// Defensive failure.
    #[error("{code}: {detail}")]
    Internal { code: ErrorCode, detail: String },
}

impl CryptoError {
    /// Encoding error without an underlying cause.
    pub fn encoding(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::Encoding {
            code,
            detail: detail.into(),
            source: None,
        }
    }

    /// Encoding error that keeps its JSON or base64 cause.
    pub fn encoding_with_source(
        code: ErrorCode,
        detail: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Encoding {
            code,
            detail: detail.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Capability error: a key is missing or the operation is disabled.
    pub fn capability(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::CapabilityUnavailable {
            code,
            detail: detail.into(),
        }
    }

    /// Primitive failure, re-classified for the failing operation.
    pub fn operation(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::CryptoOperation {
            code,
            detail: detail.into(),
        }
    }

    /// Version, algorithm, identity or key type not accepted.
    pub fn protocol(code: ErrorCode, detail: impl Into<String>) -> Self {
        Self::ProtocolMismatch {
            code,
            detail: detail.into(),
        }
    }

    /// Internal error with [`ErrorCode::InternalException`].
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            code: ErrorCode::InternalException,
            detail: detail.into(),
        }
    }

    /// The reason code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Encoding { code, .. }
            | Self::CapabilityUnavailable { code, .. }
            | Self::CryptoOperation { code, .. }
            | Self::ProtocolMismatch { code, .. }
            | Self::Internal { code, .. } => *code,
        }
    }

    /// The category, taken from the variant.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Encoding { .. } => ErrorKind::Encoding,
            Self::CapabilityUnavailable { .. } => ErrorKind::CapabilityUnavailable,
            Self::CryptoOperation { .. } => ErrorKind::CryptoOperation,
            Self::ProtocolMismatch { .. } => ErrorKind::ProtocolMismatch,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }
}
