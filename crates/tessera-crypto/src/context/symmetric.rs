//! Symmetric crypto context for pre-shared key entities.
//!
//! Up to three secret keys: an AES encryption key (AES-CBC/PKCS#5 with a
//! fresh IV per message), an HMAC-SHA256 key and an AES key-wrap key. Unlike
//! the RSA context there is no pass-through: a missing key always fails.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, trace};

use super::{check_key_id, classify_unwrapped, primitive_failure, unavailable, CryptoContext};
use crate::envelope::{CiphertextEnvelope, SignatureEnvelope, Version};
use crate::error::{CryptoError, ErrorCode};
use crate::keys::{CipherKey, KeyRef, KeyUsage, UnwrappedKey};
use crate::primitives::{CryptoPrimitives, SignatureAlgorithm, Transform};
use crate::Result;

/// AES block size; CBC IVs are one block.
pub const IV_LENGTH: usize = 16;

/// Symmetric crypto context over a primitive provider `P`.
pub struct SymmetricCryptoContext<P> {
    id: String,
    encryption_key: Option<CipherKey>,
    hmac_key: Option<CipherKey>,
    wrap_key: Option<CipherKey>,
    primitives: P,
}

impl<P: CryptoPrimitives> SymmetricCryptoContext<P> {
    /// Create a context. A missing key disables the operations that need it.
    pub fn new(
        primitives: P,
        id: impl Into<String>,
        encryption_key: Option<CipherKey>,
        hmac_key: Option<CipherKey>,
        wrap_key: Option<CipherKey>,
    ) -> Self {
        let id = id.into();
        debug!(
            identity = %id,
            has_encryption = encryption_key.is_some(),
            has_hmac = hmac_key.is_some(),
            has_wrap = wrap_key.is_some(),
            "Symmetric crypto context created"
        );
        Self {
            id,
            encryption_key,
            hmac_key,
            wrap_key,
            primitives,
        }
    }

    fn require<'a>(
        &self,
        key: &'a Option<CipherKey>,
        code: ErrorCode,
        what: &str,
    ) -> Result<&'a CipherKey> {
        key.as_ref().ok_or_else(|| unavailable(code, &self.id, what))
    }
}

impl<P> fmt::Debug for SymmetricCryptoContext<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymmetricCryptoContext")
            .field("id", &self.id)
            .field("encryption_key", &self.encryption_key)
            .field("hmac_key", &self.hmac_key)
            .field("wrap_key", &self.wrap_key)
            .finish_non_exhaustive()
    }
}

impl<P: CryptoPrimitives> CryptoContext for SymmetricCryptoContext<P> {
    fn identity(&self) -> &str {
        &self.id
    }

    async fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        let code = ErrorCode::EncryptNotSupported;
        let key = self.require(&self.encryption_key, code, "no encryption key")?;
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let mut iv = [0u8; IV_LENGTH];
        OsRng.fill_bytes(&mut iv);

        trace!(identity = %self.id, len = data.len(), "Encrypting");
        let ciphertext = self
            .primitives
            .encrypt(Transform::AesCbcPkcs5, key.into(), Some(&iv), data)
            .await
            .map_err(|e| primitive_failure(ErrorCode::EncryptError, &self.id, e))?;

        let envelope =
            CiphertextEnvelope::with_key_id(self.id.clone(), Some(iv.to_vec()), ciphertext);
        Ok(envelope.to_text().into_bytes())
    }

    async fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        let code = ErrorCode::DecryptNotSupported;
        let key = self.require(&self.encryption_key, code, "no encryption key")?;
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let envelope = CiphertextEnvelope::from_text(data, Some(Version::V1))?;
        check_key_id(&envelope, &self.id)?;
        let iv = envelope.iv().ok_or_else(|| {
            CryptoError::encoding(
                ErrorCode::CiphertextEnvelopeMissingIv,
                format!("context {}", self.id),
            )
        })?;

        trace!(identity = %self.id, len = envelope.ciphertext().len(), "Decrypting");
        self.primitives
            .decrypt(Transform::AesCbcPkcs5, key.into(), Some(iv), envelope.ciphertext())
            .await
            .map_err(|e| primitive_failure(ErrorCode::DecryptError, &self.id, e))
    }

    async fn wrap(&self, key: KeyRef<'_>) -> Result<Vec<u8>> {
        let wrap_key = self.require(&self.wrap_key, ErrorCode::WrapNotSupported, "no wrap key")?;

        trace!(identity = %self.id, key_type = %key.key_type(), "Wrapping key");
        self.primitives
            .wrap_key(Transform::AesKeyWrap, wrap_key.into(), key)
            .await
            .map_err(|e| primitive_failure(ErrorCode::WrapError, &self.id, e))
    }

    async fn unwrap(
        &self,
        data: &[u8],
        algorithm: &str,
        usages: &[KeyUsage],
    ) -> Result<UnwrappedKey> {
        let wrap_key = self.require(&self.wrap_key, ErrorCode::UnwrapNotSupported, "no wrap key")?;

        trace!(identity = %self.id, algorithm, "Unwrapping key");
        let raw = self
            .primitives
            .unwrap_key(Transform::AesKeyWrap, wrap_key.into(), data, algorithm, usages)
            .await
            .map_err(|e| primitive_failure(ErrorCode::UnwrapError, &self.id, e))?;
        classify_unwrapped(raw)
    }

    async fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let key = self.require(&self.hmac_key, ErrorCode::SignNotSupported, "no HMAC key")?;

        let signature = self
            .primitives
            .sign(SignatureAlgorithm::HmacSha256, key.into(), data)
            .await
            .map_err(|e| primitive_failure(ErrorCode::SignatureError, &self.id, e))?;
        Ok(SignatureEnvelope::v1(signature).to_bytes())
    }

    async fn verify(&self, data: &[u8], signature: &[u8]) -> Result<bool> {
        let key = self.require(&self.hmac_key, ErrorCode::VerifyNotSupported, "no HMAC key")?;

        let envelope = SignatureEnvelope::parse(signature, Some(Version::V1))?;
        self.primitives
            .verify(SignatureAlgorithm::HmacSha256, key.into(), envelope.signature(), data)
            .await
            .map_err(|e| primitive_failure(ErrorCode::VerifyError, &self.id, e))
    }
}
