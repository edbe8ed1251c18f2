//! Scripted primitive provider for unit tests.
//!
//! The "cryptography" is reversible byte mangling keyed by the first byte of
//! the key material, which is enough to check that contexts route data,
//! keys and IVs correctly. Every call is counted.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::keys::{KeyRef, KeyUsage};
use crate::primitives::{
    CryptoPrimitives, PrimitiveError, RawUnwrappedKey, SignatureAlgorithm, Transform,
};

const WRAP_PREFIX: &[u8] = b"wrapped:";

pub(crate) struct MockPrimitives {
    calls: AtomicUsize,
    fail: bool,
    unwrap_type: String,
}

impl MockPrimitives {
    pub(crate) fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: false,
            unwrap_type: "secret".to_string(),
        }
    }

    /// Every primitive fails.
    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Unwrap reports `key_type` for every key.
    pub(crate) fn reporting(key_type: &str) -> Self {
        Self {
            unwrap_type: key_type.to_string(),
            ..Self::new()
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self, op: &str) -> Result<(), PrimitiveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(PrimitiveError::Failed(format!("scripted {op} failure")))
        } else {
            Ok(())
        }
    }
}

fn mask(key: KeyRef<'_>) -> u8 {
    key.material().first().copied().unwrap_or(0) ^ 0x5a
}

fn mangle(key: KeyRef<'_>, iv: Option<&[u8]>, data: &[u8]) -> Vec<u8> {
    let salt = iv.and_then(|iv| iv.first().copied()).unwrap_or(0);
    data.iter().map(|b| b ^ mask(key) ^ salt).collect()
}

fn digest(key: KeyRef<'_>, data: &[u8]) -> Vec<u8> {
    data.iter().rev().map(|b| b ^ mask(key)).chain([data.len() as u8]).collect()
}

impl CryptoPrimitives for MockPrimitives {
    async fn encrypt(
        &self,
        _transform: Transform,
        key: KeyRef<'_>,
        iv: Option<&[u8]>,
        data: &[u8],
    ) -> Result<Vec<u8>, PrimitiveError> {
        self.enter("encrypt")?;
        Ok(mangle(key, iv, data))
    }

    async fn decrypt(
        &self,
        _transform: Transform,
        key: KeyRef<'_>,
        iv: Option<&[u8]>,
        data: &[u8],
    ) -> Result<Vec<u8>, PrimitiveError> {
        self.enter("decrypt")?;
        Ok(mangle(key, iv, data))
    }

    async fn sign(
        &self,
        _algorithm: SignatureAlgorithm,
        key: KeyRef<'_>,
        data: &[u8],
    ) -> Result<Vec<u8>, PrimitiveError> {
        self.enter("sign")?;
        Ok(digest(key, data))
    }

    async fn verify(
        &self,
        _algorithm: SignatureAlgorithm,
        key: KeyRef<'_>,
        signature: &[u8],
        data: &[u8],
    ) -> Result<bool, PrimitiveError> {
        self.enter("verify")?;
        Ok(digest(key, data) == signature)
    }

    async fn wrap_key(
        &self,
        _transform: Transform,
        _wrapping_key: KeyRef<'_>,
        key: KeyRef<'_>,
    ) -> Result<Vec<u8>, PrimitiveError> {
        self.enter("wrap")?;
        Ok([WRAP_PREFIX, key.material()].concat())
    }

    async fn unwrap_key(
        &self,
        _transform: Transform,
        _unwrapping_key: KeyRef<'_>,
        wrapped: &[u8],
        algorithm: &str,
        usages: &[KeyUsage],
    ) -> Result<RawUnwrappedKey, PrimitiveError> {
        self.enter("unwrap")?;
        let material = wrapped
            .strip_prefix(WRAP_PREFIX)
            .ok_or_else(|| PrimitiveError::Failed("not a wrapped key".into()))?;
        Ok(RawUnwrappedKey {
            key_type: self.unwrap_type.clone(),
            algorithm: algorithm.to_string(),
            usages: usages.to_vec(),
            material: material.to_vec(),
        })
    }
}
