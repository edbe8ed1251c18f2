//! Asynchronous cryptographic primitive provider contract.
//!
//! Crypto contexts never touch RSA, AES or HMAC directly. Every primitive is
//! requested from a [`CryptoPrimitives`] implementation, keyed by a transform
//! identifier and a key handle, and each call resolves exactly once. This
//! keeps the contexts testable without real key material and lets embedders
//! back them with a hardware module or a platform crypto API.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::keys::{KeyRef, KeyUsage};

/// Data and key transforms a provider may be asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transform {
    /// RSAES-OAEP (SHA-1 / MGF1-SHA-1).
    RsaOaep,
    /// RSAES-PKCS1-v1_5.
    RsaPkcs1,
    /// AES in CBC mode with PKCS#5 padding; requires a 16-byte IV.
    AesCbcPkcs5,
    /// AES key wrap (RFC 3394).
    AesKeyWrap,
}

impl Transform {
    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::RsaOaep => "RSA-OAEP",
            Self::RsaPkcs1 => "RSAES-PKCS1-v1_5",
            Self::AesCbcPkcs5 => "AES-CBC",
            Self::AesKeyWrap => "AES-KW",
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signature algorithms. The names are the wire names used by V2 signature
/// envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureAlgorithm {
    /// HMAC with SHA-256.
    HmacSha256,
    /// RSASSA-PKCS1-v1_5 with SHA-256.
    Sha256WithRsa,
    /// AES-CMAC.
    AesCmac,
}

impl SignatureAlgorithm {
    /// Every recognized algorithm.
    pub const ALL: [Self; 3] = [Self::HmacSha256, Self::Sha256WithRsa, Self::AesCmac];

    /// Wire name.
    pub fn name(self) -> &'static str {
        match self {
            Self::HmacSha256 => "HmacSHA256",
            Self::Sha256WithRsa => "SHA256withRSA",
            Self::AesCmac => "AESCmac",
        }
    }

    /// Look up an algorithm by its exact wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|alg| alg.name() == name)
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure reported by a primitive provider.
///
/// Contexts re-classify these into operation-specific
/// [`CryptoError`](crate::CryptoError)s and do not forward the detail.
#[derive(Debug, thiserror::Error)]
pub enum PrimitiveError {
    /// The transform cannot be applied to this kind of key.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The key material could not be decoded.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The primitive ran and failed (bad padding, wrong key, ...).
    #[error("operation failed: {0}")]
    Failed(String),
}

/// Key material returned by [`CryptoPrimitives::unwrap_key`].
#[derive(Debug)]
pub struct RawUnwrappedKey {
    /// Type as reported by the provider: `"secret"`, `"public"` or
    /// `"private"`. Anything else is rejected by the context.
    pub key_type: String,
    /// Algorithm the key is bound to.
    pub algorithm: String,
    /// Usages granted to the key.
    pub usages: Vec<KeyUsage>,
    /// Raw key material.
    pub material: Vec<u8>,
}

/// Asynchronous cryptographic primitives.
///
/// Every method returns a future that resolves exactly once to either the
/// output or a [`PrimitiveError`].
pub trait CryptoPrimitives: Send + Sync {
    /// Encrypt `data`. `iv` is required by block-cipher transforms.
    fn encrypt(
        &self,
        transform: Transform,
        key: KeyRef<'_>,
        iv: Option<&[u8]>,
        data: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>, PrimitiveError>> + Send;

    /// Decrypt `data`. `iv` is required by block-cipher transforms.
    fn decrypt(
        &self,
        transform: Transform,
        key: KeyRef<'_>,
        iv: Option<&[u8]>,
        data: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>, PrimitiveError>> + Send;

    /// Compute a signature or MAC over `data`.
    fn sign(
        &self,
        algorithm: SignatureAlgorithm,
        key: KeyRef<'_>,
        data: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>, PrimitiveError>> + Send;

    /// Check `signature` over `data`. A well-formed but wrong signature is
    /// `Ok(false)`, not an error.
    fn verify(
        &self,
        algorithm: SignatureAlgorithm,
        key: KeyRef<'_>,
        signature: &[u8],
        data: &[u8],
    ) -> impl Future<Output = Result<bool, PrimitiveError>> + Send;

    /// Wrap `key` for transport under `wrapping_key`.
    fn wrap_key(
        &self,
        transform: Transform,
        wrapping_key: KeyRef<'_>,
        key: KeyRef<'_>,
    ) -> impl Future<Output = Result<Vec<u8>, PrimitiveError>> + Send;

    /// Recover a wrapped key and report its type.
    fn unwrap_key(
        &self,
        transform: Transform,
        unwrapping_key: KeyRef<'_>,
        wrapped: &[u8],
        algorithm: &str,
        usages: &[KeyUsage],
    ) -> impl Future<Output = Result<RawUnwrappedKey, PrimitiveError>> + Send;
}

impl<T: CryptoPrimitives> CryptoPrimitives for Arc<T> {
    fn encrypt(
        &self,
        transform: Transform,
        key: KeyRef<'_>,
        iv: Option<&[u8]>,
        data: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>, PrimitiveError>> + Send {
        (**self).encrypt(transform, key, iv, data)
    }

    fn decrypt(
        &self,
        transform: Transform,
        key: KeyRef<'_>,
        iv: Option<&[u8]>,
        data: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>, PrimitiveError>> + Send {
        (**self).decrypt(transform, key, iv, data)
    }

    fn sign(
        &self,
        algorithm: SignatureAlgorithm,
        key: KeyRef<'_>,
        data: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>, PrimitiveError>> + Send {
        (**self).sign(algorithm, key, data)
    }

    fn verify(
        &self,
        algorithm: SignatureAlgorithm,
        key: KeyRef<'_>,
        signature: &[u8],
        data: &[u8],
    ) -> impl Future<Output = Result<bool, PrimitiveError>> + Send {
        (**self).verify(algorithm, key, signature, data)
    }

    fn wrap_key(
        &self,
        transform: Transform,
        wrapping_key: KeyRef<'_>,
        key: KeyRef<'_>,
    ) -> impl Future<Output = Result<Vec<u8>, PrimitiveError>> + Send {
        (**self).wrap_key(transform, wrapping_key, key)
    }

    fn unwrap_key(
        &self,
        transform: Transform,
        unwrapping_key: KeyRef<'_>,
        wrapped: &[u8],
        algorithm: &str,
        usages: &[KeyUsage],
    ) -> impl Future<Output = Result<RawUnwrappedKey, PrimitiveError>> + Send {
        (**self).unwrap_key(transform, unwrapping_key, wrapped, algorithm, usages)
    }
}
