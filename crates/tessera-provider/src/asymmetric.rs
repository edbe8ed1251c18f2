//! RSA primitives.
//!
//! Public keys are DER `SubjectPublicKeyInfo`, private keys DER PKCS#8.
//! OAEP uses SHA-1 with MGF1-SHA-1, which is what legacy peers negotiate.

use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{Oaep, Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use tessera_crypto::keys::KeyRef;
use tessera_crypto::primitives::{PrimitiveError, Transform};

fn public_key(key: KeyRef<'_>) -> Result<RsaPublicKey, PrimitiveError> {
    match key {
        KeyRef::Public(k) => RsaPublicKey::from_public_key_der(k.material())
            .map_err(|e| PrimitiveError::InvalidKey(format!("RSA public key: {e}"))),
        other => Err(PrimitiveError::Unsupported(format!(
            "RSA public operation with a {} key",
            other.key_type()
        ))),
    }
}

fn private_key(key: KeyRef<'_>) -> Result<RsaPrivateKey, PrimitiveError> {
    match key {
        KeyRef::Private(k) => RsaPrivateKey::from_pkcs8_der(k.material())
            .map_err(|e| PrimitiveError::InvalidKey(format!("RSA private key: {e}"))),
        other => Err(PrimitiveError::Unsupported(format!(
            "RSA private operation with a {} key",
            other.key_type()
        ))),
    }
}

pub(crate) fn encrypt(
    transform: Transform,
    key: KeyRef<'_>,
    data: &[u8],
) -> Result<Vec<u8>, PrimitiveError> {
    let public = public_key(key)?;
    let result = match transform {
        Transform::RsaOaep => public.encrypt(&mut OsRng, Oaep::new::<Sha1>(), data),
        Transform::RsaPkcs1 => public.encrypt(&mut OsRng, Pkcs1v15Encrypt, data),
        other => {
            return Err(PrimitiveError::Unsupported(format!(
                "{other} is not an RSA transform"
            )))
        }
    };
    result.map_err(|e| PrimitiveError::Failed(format!("{transform} encrypt: {e}")))
}

pub(crate) fn decrypt(
    transform: Transform,
    key: KeyRef<'_>,
    data: &[u8],
) -> Result<Vec<u8>, PrimitiveError> {
    let private = private_key(key)?;
    let result = match transform {
        Transform::RsaOaep => private.decrypt(Oaep::new::<Sha1>(), data),
        Transform::RsaPkcs1 => private.decrypt(Pkcs1v15Encrypt, data),
        other => {
            return Err(PrimitiveError::Unsupported(format!(
                "{other} is not an RSA transform"
            )))
        }
    };
    result.map_err(|e| PrimitiveError::Failed(format!("{transform} decrypt: {e}")))
}

/// RSASSA-PKCS1-v1_5 over SHA-256.
pub(crate) fn sign(key: KeyRef<'_>, data: &[u8]) -> Result<Vec<u8>, PrimitiveError> {
    let private = private_key(key)?;
    private
        .sign(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(data))
        .map_err(|e| PrimitiveError::Failed(format!("SHA256withRSA sign: {e}")))
}

/// A malformed or non-matching signature is `false`.
pub(crate) fn verify(
    key: KeyRef<'_>,
    signature: &[u8],
    data: &[u8],
) -> Result<bool, PrimitiveError> {
    let public = public_key(key)?;
    Ok(public
        .verify(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(data), signature)
        .is_ok())
}
