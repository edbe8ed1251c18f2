//! Asymmetric (RSA) crypto context.
//!
//! The construction-time [`CryptoContextMode`] activates exactly one
//! capability group:
//!
//! | Mode | Data transform | Wrap transform | Signature |
//! |---|---|---|---|
//! | `EncryptDecryptOaep` | RSA-OAEP | - | - |
//! | `EncryptDecryptPkcs1` | RSAES-PKCS1-v1_5 | - | - |
//! | `WrapUnwrapOaep` | - | RSA-OAEP | - |
//! | `WrapUnwrapPkcs1` | - | RSAES-PKCS1-v1_5 | - |
//! | `SignVerify` | - | - | SHA256withRSA |
//!
//! Inactive encrypt/decrypt return their input, inactive sign returns an
//! empty signature and inactive verify returns `true`. Inactive wrap/unwrap
//! fail with [`CryptoError::CapabilityUnavailable`] so raw key material never
//! leaves unprotected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{check_key_id, classify_unwrapped, primitive_failure, unavailable, CryptoContext};
use crate::envelope::{CiphertextEnvelope, SignatureEnvelope, Version};
use crate::error::ErrorCode;
use crate::keys::{KeyRef, KeyUsage, PrivateKey, PublicKey, UnwrappedKey};
use crate::primitives::{CryptoPrimitives, SignatureAlgorithm, Transform};
use crate::Result;

/// Capability group activated for an [`RsaCryptoContext`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CryptoContextMode {
    /// Encrypt/decrypt with RSA-OAEP.
    EncryptDecryptOaep,
    /// Encrypt/decrypt with RSAES-PKCS1-v1_5.
    EncryptDecryptPkcs1,
    /// Wrap/unwrap with RSA-OAEP.
    WrapUnwrapOaep,
    /// Wrap/unwrap with RSAES-PKCS1-v1_5.
    WrapUnwrapPkcs1,
    /// Sign/verify with RSASSA-PKCS1-v1_5 over SHA-256.
    SignVerify,
}

impl CryptoContextMode {
    /// Every mode.
    pub const ALL: [Self; 5] = [
        Self::EncryptDecryptOaep,
        Self::EncryptDecryptPkcs1,
        Self::WrapUnwrapOaep,
        Self::WrapUnwrapPkcs1,
        Self::SignVerify,
    ];

    /// Name as used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EncryptDecryptOaep => "encrypt-decrypt-oaep",
            Self::EncryptDecryptPkcs1 => "encrypt-decrypt-pkcs1",
            Self::WrapUnwrapOaep => "wrap-unwrap-oaep",
            Self::WrapUnwrapPkcs1 => "wrap-unwrap-pkcs1",
            Self::SignVerify => "sign-verify",
        }
    }

    /// Transform selectors derived from the mode: (data, wrap, signature).
    fn selectors(self) -> (Option<Transform>, Option<Transform>, Option<SignatureAlgorithm>) {
        match self {
            Self::EncryptDecryptOaep => (Some(Transform::RsaOaep), None, None),
            Self::EncryptDecryptPkcs1 => (Some(Transform::RsaPkcs1), None, None),
            Self::WrapUnwrapOaep => (None, Some(Transform::RsaOaep), None),
            Self::WrapUnwrapPkcs1 => (None, Some(Transform::RsaPkcs1), None),
            Self::SignVerify => (None, None, Some(SignatureAlgorithm::Sha256WithRsa)),
        }
    }
}

impl fmt::Display for CryptoContextMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown [`CryptoContextMode`] name.
#[derive(Debug, thiserror::Error)]
#[error("unknown crypto context mode {0:?}")]
pub struct UnknownModeError(pub String);

impl FromStr for CryptoContextMode {
    type Err = UnknownModeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| UnknownModeError(s.to_string()))
    }
}

/// RSA crypto context over a primitive provider `P`.
pub struct RsaCryptoContext<P> {
    id: String,
    private_key: Option<PrivateKey>,
    public_key: Option<PublicKey>,
    mode: CryptoContextMode,
    transform: Option<Transform>,
    wrap_transform: Option<Transform>,
    algorithm: Option<SignatureAlgorithm>,
    primitives: P,
}

impl<P: CryptoPrimitives> RsaCryptoContext<P> {
    /// Create a context. A missing key permanently disables the operations
    /// that need it.
    pub fn new(
        primitives: P,
        id: impl Into<String>,
        private_key: Option<PrivateKey>,
        public_key: Option<PublicKey>,
        mode: CryptoContextMode,
    ) -> Self {
        let (transform, wrap_transform, algorithm) = mode.selectors();
        let id = id.into();
        debug!(
            identity = %id,
            %mode,
            has_private = private_key.is_some(),
            has_public = public_key.is_some(),
            "RSA crypto context created"
        );
        Self {
            id,
            private_key,
            public_key,
            mode,
            transform,
            wrap_transform,
            algorithm,
            primitives,
        }
    }

    /// Mode fixed at construction.
    pub fn mode(&self) -> CryptoContextMode {
        self.mode
    }

    fn require_public(&self, code: ErrorCode) -> Result<&PublicKey> {
        self.public_key
            .as_ref()
            .ok_or_else(|| unavailable(code, &self.id, "no public key"))
    }

    fn require_private(&self, code: ErrorCode) -> Result<&PrivateKey> {
        self.private_key
            .as_ref()
            .ok_or_else(|| unavailable(code, &self.id, "no private key"))
    }
}

impl<P> fmt::Debug for RsaCryptoContext<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaCryptoContext")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("private_key", &self.private_key)
            .field("public_key", &self.public_key.as_ref().map(PublicKey::algorithm))
            .finish_non_exhaustive()
    }
}

impl<P: CryptoPrimitives> CryptoContext for RsaCryptoContext<P> {
    fn identity(&self) -> &str {
        &self.id
    }

    async fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        let Some(transform) = self.transform else {
            return Ok(data.to_vec());
        };
        let public_key = self.require_public(ErrorCode::EncryptNotSupported)?;
        if data.is_empty() {
            return Ok(Vec::new());
        }

        trace!(identity = %self.id, %transform, len = data.len(), "Encrypting");
        let ciphertext = self
            .primitives
            .encrypt(transform, public_key.into(), None, data)
            .await
            .map_err(|e| primitive_failure(ErrorCode::EncryptError, &self.id, e))?;

        let envelope = CiphertextEnvelope::with_key_id(self.id.clone(), None, ciphertext);
        Ok(envelope.to_text().into_bytes())
    }

    async fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        let Some(transform) = self.transform else {
            return Ok(data.to_vec());
        };
        let private_key = self.require_private(ErrorCode::DecryptNotSupported)?;
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let envelope = CiphertextEnvelope::from_text(data, Some(Version::V1))?;
        check_key_id(&envelope, &self.id)?;

        trace!(identity = %self.id, %transform, len = envelope.ciphertext().len(), "Decrypting");
        self.primitives
            .decrypt(transform, private_key.into(), envelope.iv(), envelope.ciphertext())
            .await
            .map_err(|e| primitive_failure(ErrorCode::DecryptError, &self.id, e))
    }

    async fn wrap(&self, key: KeyRef<'_>) -> Result<Vec<u8>> {
        let Some(transform) = self.wrap_transform else {
            return Err(unavailable(
                ErrorCode::WrapNotSupported,
                &self.id,
                "wrap transform inactive",
            ));
        };
        let public_key = self.require_public(ErrorCode::WrapNotSupported)?;

        trace!(identity = %self.id, %transform, key_type = %key.key_type(), "Wrapping key");
        self.primitives
            .wrap_key(transform, public_key.into(), key)
            .await
            .map_err(|e| primitive_failure(ErrorCode::WrapError, &self.id, e))
    }

    async fn unwrap(
        &self,
        data: &[u8],
        algorithm: &str,
        usages: &[KeyUsage],
    ) -> Result<UnwrappedKey> {
        let Some(transform) = self.wrap_transform else {
            return Err(unavailable(
                ErrorCode::UnwrapNotSupported,
                &self.id,
                "wrap transform inactive",
            ));
        };
        let private_key = self.require_private(ErrorCode::UnwrapNotSupported)?;

        trace!(identity = %self.id, %transform, algorithm, "Unwrapping key");
        let raw = self
            .primitives
            .unwrap_key(transform, private_key.into(), data, algorithm, usages)
            .await
            .map_err(|e| primitive_failure(ErrorCode::UnwrapError, &self.id, e))?;
        classify_unwrapped(raw)
    }

    async fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let Some(algorithm) = self.algorithm else {
            return Ok(Vec::new());
        };
        let private_key = self.require_private(ErrorCode::SignNotSupported)?;

        trace!(identity = %self.id, %algorithm, len = data.len(), "Signing");
        let signature = self
            .primitives
            .sign(algorithm, private_key.into(), data)
            .await
            .map_err(|e| primitive_failure(ErrorCode::SignatureError, &self.id, e))?;
        Ok(SignatureEnvelope::v1(signature).to_bytes())
    }

    async fn verify(&self, data: &[u8], signature: &[u8]) -> Result<bool> {
        let Some(algorithm) = self.algorithm else {
            return Ok(true);
        };
        let public_key = self.require_public(ErrorCode::VerifyNotSupported)?;

        let envelope = SignatureEnvelope::parse(signature, Some(Version::V1))?;
        let valid = self
            .primitives
            .verify(algorithm, public_key.into(), envelope.signature(), data)
            .await
            .map_err(|e| primitive_failure(ErrorCode::VerifyError, &self.id, e))?;

        trace!(identity = %self.id, %algorithm, valid, "Verified");
        Ok(valid)
    }
}
