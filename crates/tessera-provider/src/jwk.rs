//! JSON Web Key transport encoding for secret keys wrapped under RSA.
//!
//! A wrapped secret key is the RSA encryption of
//! `{"kty":"oct","k":<base64url>,"alg":..,"key_ops":[..]}`. On unwrap the
//! `kty` is reported as the key type: `oct` becomes `"secret"`, any other
//! value is passed through unchanged for the caller to reject.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tessera_crypto::keys::{CipherKey, KeyUsage};
use tessera_crypto::primitives::PrimitiveError;
use zeroize::{Zeroize, Zeroizing};

const KTY_OCT: &str = "oct";

#[derive(Serialize, Deserialize)]
struct Jwk {
    kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    k: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alg: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    key_ops: Vec<KeyUsage>,
}

impl Drop for Jwk {
    fn drop(&mut self) {
        self.k.zeroize();
    }
}

/// A decoded JWK.
pub(crate) struct DecodedJwk {
    /// `"secret"` for `oct`, otherwise the raw `kty`.
    pub key_type: String,
    pub material: Vec<u8>,
}

/// Serialize a secret key as JWK JSON.
pub(crate) fn encode(key: &CipherKey) -> Result<Zeroizing<Vec<u8>>, PrimitiveError> {
    let jwk = Jwk {
        kty: KTY_OCT.to_string(),
        k: Some(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(key.material())),
        alg: Some(key.algorithm().to_string()),
        key_ops: key.usages().to_vec(),
    };
    serde_json::to_vec(&jwk)
        .map(Zeroizing::new)
        .map_err(|e| PrimitiveError::Failed(format!("JWK encode: {e}")))
}

/// Parse JWK JSON recovered from an unwrap.
pub(crate) fn decode(data: &[u8]) -> Result<DecodedJwk, PrimitiveError> {
    let jwk: Jwk = serde_json::from_slice(data)
        .map_err(|e| PrimitiveError::Failed(format!("JWK decode: {e}")))?;
    let material = match jwk.k.as_deref() {
        Some(k) => base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(k)
            .map_err(|e| PrimitiveError::Failed(format!("JWK key value: {e}")))?,
        None => Vec::new(),
    };
    let key_type = if jwk.kty == KTY_OCT {
        "secret".to_string()
    } else {
        jwk.kty.clone()
    };
    Ok(DecodedJwk { key_type, material })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_roundtrip() {
        let key = CipherKey::new("AES-CBC", vec![0xfb; 16]).with_usages(&[KeyUsage::Encrypt]);
        let json = encode(&key).expect("encode");

        let value: serde_json::Value = serde_json::from_slice(&json).expect("json");
        assert_eq!(value["kty"], "oct");
        assert_eq!(value["alg"], "AES-CBC");
        assert_eq!(value["key_ops"], serde_json::json!(["encrypt"]));
        // URL-safe alphabet, no padding.
        assert!(!value["k"].as_str().expect("k").contains(&['+', '/', '='][..]));

        let decoded = decode(&json).expect("decode");
        assert_eq!(decoded.key_type, "secret");
        assert_eq!(decoded.material, vec![0xfb; 16]);
    }

    #[test]
    fn test_other_kty_passed_through() {
        let decoded = decode(br#"{"kty":"EC","k":"AQ"}"#).expect("decode");
        assert_eq!(decoded.key_type, "EC");
        assert_eq!(decoded.material, vec![1]);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(decode(b"\x00\x01").is_err());
        assert!(decode(br#"{"kty":"oct","k":"***"}"#).is_err());
    }
}
