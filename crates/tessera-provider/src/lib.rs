//! # tessera-provider
//!
//! Software implementation of the
//! [`CryptoPrimitives`](tessera_crypto::primitives::CryptoPrimitives)
//! contract on the RustCrypto stack.
//!
//! | Transform / algorithm | Key | Implementation |
//! |---|---|---|
//! | `RsaOaep` | SPKI / PKCS#8 DER | RSA-OAEP, SHA-1, MGF1-SHA-1 |
//! | `RsaPkcs1` | SPKI / PKCS#8 DER | RSAES-PKCS1-v1_5 |
//! | `AesCbcPkcs5` | raw, 16 or 32 bytes | AES-CBC with PKCS#7 padding |
//! | `AesKeyWrap` | raw, 16 or 32 bytes | RFC 3394 |
//! | `Sha256WithRsa` | SPKI / PKCS#8 DER | RSASSA-PKCS1-v1_5 over SHA-256 |
//! | `HmacSha256` | raw | HMAC-SHA256 |
//!
//! Secret keys wrapped under RSA travel as JWK JSON; under AES key wrap
//! they travel as raw bytes. AES-CMAC is not provided.

mod asymmetric;
mod jwk;
mod symmetric;

use tessera_crypto::keys::{CipherKey, KeyRef, KeyUsage};
use tessera_crypto::primitives::{
    CryptoPrimitives, PrimitiveError, RawUnwrappedKey, SignatureAlgorithm, Transform,
};
use tracing::trace;

/// Stateless software primitive provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareProvider;

impl SoftwareProvider {
    /// Create a provider.
    pub fn new() -> Self {
        Self
    }
}

fn secret<'a>(key: KeyRef<'a>, what: &str) -> Result<&'a CipherKey, PrimitiveError> {
    match key {
        KeyRef::Secret(k) => Ok(k),
        other => Err(PrimitiveError::Unsupported(format!(
            "{what} needs a secret key, got a {} key",
            other.key_type()
        ))),
    }
}

fn require_iv<'a>(iv: Option<&'a [u8]>, transform: Transform) -> Result<&'a [u8], PrimitiveError> {
    iv.ok_or_else(|| PrimitiveError::Failed(format!("{transform} requires an IV")))
}

fn not_a_data_transform(transform: Transform) -> PrimitiveError {
    PrimitiveError::Unsupported(format!("{transform} is a key transform"))
}

impl CryptoPrimitives for SoftwareProvider {
    async fn encrypt(
        &self,
        transform: Transform,
        key: KeyRef<'_>,
        iv: Option<&[u8]>,
        data: &[u8],
    ) -> Result<Vec<u8>, PrimitiveError> {
        trace!(%transform, len = data.len(), "encrypt");
        match transform {
            Transform::RsaOaep | Transform::RsaPkcs1 => asymmetric::encrypt(transform, key, data),
            Transform::AesCbcPkcs5 => symmetric::cbc_encrypt(
                secret(key, "AES-CBC")?.material(),
                require_iv(iv, transform)?,
                data,
            ),
            Transform::AesKeyWrap => Err(not_a_data_transform(transform)),
        }
    }

    async fn decrypt(
        &self,
        transform: Transform,
        key: KeyRef<'_>,
        iv: Option<&[u8]>,
        data: &[u8],
    ) -> Result<Vec<u8>, PrimitiveError> {
        trace!(%transform, len = data.len(), "decrypt");
        match transform {
            Transform::RsaOaep | Transform::RsaPkcs1 => asymmetric::decrypt(transform, key, data),
            Transform::AesCbcPkcs5 => symmetric::cbc_decrypt(
                secret(key, "AES-CBC")?.material(),
                require_iv(iv, transform)?,
                data,
            ),
            Transform::AesKeyWrap => Err(not_a_data_transform(transform)),
        }
    }

    async fn sign(
        &self,
        algorithm: SignatureAlgorithm,
        key: KeyRef<'_>,
        data: &[u8],
    ) -> Result<Vec<u8>, PrimitiveError> {
        trace!(%algorithm, len = data.len(), "sign");
        match algorithm {
            SignatureAlgorithm::Sha256WithRsa => asymmetric::sign(key, data),
            SignatureAlgorithm::HmacSha256 => {
                symmetric::hmac_sign(secret(key, "HMAC")?.material(), data)
            }
            SignatureAlgorithm::AesCmac => Err(PrimitiveError::Unsupported(algorithm.to_string())),
        }
    }

    async fn verify(
        &self,
        algorithm: SignatureAlgorithm,
        key: KeyRef<'_>,
        signature: &[u8],
        data: &[u8],
    ) -> Result<bool, PrimitiveError> {
        trace!(%algorithm, len = data.len(), "verify");
        match algorithm {
            SignatureAlgorithm::Sha256WithRsa => asymmetric::verify(key, signature, data),
            SignatureAlgorithm::HmacSha256 => {
                symmetric::hmac_verify(secret(key, "HMAC")?.material(), signature, data)
            }
            SignatureAlgorithm::AesCmac => Err(PrimitiveError::Unsupported(algorithm.to_string())),
        }
    }

    async fn wrap_key(
        &self,
        transform: Transform,
        wrapping_key: KeyRef<'_>,
        key: KeyRef<'_>,
    ) -> Result<Vec<u8>, PrimitiveError> {
        trace!(%transform, key_type = %key.key_type(), "wrap_key");
        let key = secret(key, "key wrap")?;
        match transform {
            Transform::RsaOaep | Transform::RsaPkcs1 => {
                let encoded = jwk::encode(key)?;
                asymmetric::encrypt(transform, wrapping_key, &encoded)
            }
            Transform::AesKeyWrap => {
                symmetric::key_wrap(secret(wrapping_key, "AES-KW")?.material(), key.material())
            }
            Transform::AesCbcPkcs5 => Err(PrimitiveError::Unsupported(format!(
                "{transform} is not a key transform"
            ))),
        }
    }

    async fn unwrap_key(
        &self,
        transform: Transform,
        unwrapping_key: KeyRef<'_>,
        wrapped: &[u8],
        algorithm: &str,
        usages: &[KeyUsage],
    ) -> Result<RawUnwrappedKey, PrimitiveError> {
        trace!(%transform, algorithm, "unwrap_key");
        let (key_type, material) = match transform {
            Transform::RsaOaep | Transform::RsaPkcs1 => {
                let decrypted = asymmetric::decrypt(transform, unwrapping_key, wrapped)?;
                let encoded = zeroize::Zeroizing::new(decrypted);
                let decoded = jwk::decode(&encoded)?;
                (decoded.key_type, decoded.material)
            }
            Transform::AesKeyWrap => (
                "secret".to_string(),
                symmetric::key_unwrap(secret(unwrapping_key, "AES-KW")?.material(), wrapped)?,
            ),
            Transform::AesCbcPkcs5 => {
                return Err(PrimitiveError::Unsupported(format!(
                    "{transform} is not a key transform"
                )))
            }
        };
        Ok(RawUnwrappedKey {
            key_type,
            algorithm: algorithm.to_string(),
            usages: usages.to_vec(),
            material,
        })
    }
}
