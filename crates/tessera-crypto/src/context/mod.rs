//! Crypto contexts.
//!
//! A crypto context is bound to one identity and a fixed set of keys and
//! performs a construction-time subset of six operations. Every operation is
//! asynchronous and resolves exactly once to either its output or a
//! [`CryptoError`].
//!
//! Two implementations are provided:
//!
//! - [`RsaCryptoContext`]: one active capability group chosen by
//!   [`CryptoContextMode`]; inactive data and signature operations pass
//!   through, inactive wrap/unwrap fail.
//! - [`SymmetricCryptoContext`]: AES-CBC, HMAC-SHA256 and AES key wrap over
//!   up to three secret keys.

mod rsa;
mod symmetric;

use std::future::Future;

use tracing::{debug, warn};
use zeroize::Zeroize;

use crate::envelope::CiphertextEnvelope;
use crate::error::{CryptoError, ErrorCode};
use crate::keys::{CipherKey, KeyRef, KeyType, KeyUsage, PrivateKey, PublicKey, UnwrappedKey};
use crate::primitives::{PrimitiveError, RawUnwrappedKey};
use crate::Result;

pub use self::rsa::{CryptoContextMode, RsaCryptoContext, UnknownModeError};
pub use self::symmetric::SymmetricCryptoContext;

/// The six-operation crypto-context contract.
///
/// Implementations are immutable after construction, so one context may be
/// shared across tasks and invoked concurrently without locking. Concurrent
/// calls are independent and unordered.
pub trait CryptoContext: Send + Sync {
    /// Identity the context is bound to. V1 ciphertext envelopes carry it as
    /// their key id.
    fn identity(&self) -> &str;

    /// Encrypt `data` into serialized envelope bytes.
    fn encrypt(&self, data: &[u8]) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Decrypt serialized envelope bytes.
    fn decrypt(&self, data: &[u8]) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Wrap `key` for transport.
    fn wrap(&self, key: KeyRef<'_>) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Recover a wrapped key, bound to `algorithm` with the given `usages`.
    fn unwrap(
        &self,
        data: &[u8],
        algorithm: &str,
        usages: &[KeyUsage],
    ) -> impl Future<Output = Result<UnwrappedKey>> + Send;

    /// Sign `data` into serialized signature envelope bytes.
    fn sign(&self, data: &[u8]) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Check serialized signature envelope bytes over `data`.
    fn verify(&self, data: &[u8], signature: &[u8]) -> impl Future<Output = Result<bool>> + Send;
}

/// Build the key handle matching the type a provider reported.
pub(crate) fn classify_unwrapped(raw: RawUnwrappedKey) -> Result<UnwrappedKey> {
    let RawUnwrappedKey {
        key_type,
        algorithm,
        usages,
        mut material,
    } = raw;

    match KeyType::from_reported(&key_type) {
        Some(KeyType::Secret) => Ok(UnwrappedKey::Secret(
            CipherKey::new(algorithm, material).with_usages(&usages),
        )),
        Some(KeyType::Public) => Ok(UnwrappedKey::Public(
            PublicKey::new(algorithm, material).with_usages(&usages),
        )),
        Some(KeyType::Private) => Ok(UnwrappedKey::Private(
            PrivateKey::new(algorithm, material).with_usages(&usages),
        )),
        None => {
            material.zeroize();
            Err(CryptoError::protocol(
                ErrorCode::UnsupportedKeyType,
                format!("unwrapped key reported type {key_type:?}"),
            ))
        }
    }
}

/// Re-classify a provider failure. The provider detail is logged and dropped.
pub(crate) fn primitive_failure(
    code: ErrorCode,
    identity: &str,
    err: PrimitiveError,
) -> CryptoError {
    debug!(identity, error = %err, "Primitive provider failed");
    CryptoError::operation(code, format!("context {identity}"))
}

/// Capability failure, logged at warn.
pub(crate) fn unavailable(code: ErrorCode, identity: &str, reason: &str) -> CryptoError {
    warn!(identity, reason, "{code}");
    CryptoError::capability(code, format!("context {identity}: {reason}"))
}

/// Reject a V1 envelope addressed to some other identity.
pub(crate) fn check_key_id(envelope: &CiphertextEnvelope, identity: &str) -> Result<()> {
    match envelope.key_id() {
        Some(key_id) if key_id == identity => Ok(()),
        other => {
            warn!(identity, envelope_key_id = ?other, "Envelope key id mismatch");
            Err(CryptoError::protocol(
                ErrorCode::EnvelopeKeyIdMismatch,
                format!("envelope key id {other:?}, context {identity}"),
            ))
        }
    }
}
