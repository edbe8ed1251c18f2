//! # tessera-crypto
//!
//! Cryptographic envelopes and crypto contexts for the Tessera secure
//! messaging protocol.
//!
//! Entity authentication and key exchange hand payloads to a crypto context,
//! which encrypts, wraps or signs them through an asynchronous primitive
//! provider and packs the output into a versioned, self-describing envelope.
//! This crate never generates keys; it only operates on key material supplied
//! by the caller.
//!
//! ## Modules
//!
//! - [`envelope`]: Ciphertext and signature envelopes (V1 legacy, V2 explicit)
//! - [`context`]: The six-operation [`CryptoContext`] contract, the RSA
//!   context and the symmetric context
//! - [`primitives`]: The asynchronous [`CryptoPrimitives`](primitives::CryptoPrimitives)
//!   provider contract
//! - [`keys`]: Opaque key handles
//! - [`delivery`]: One-shot callback delivery on the Tokio runtime
//! - [`error`]: Error taxonomy and stable reason codes
//!
//! ## Flow
//!
//! ```text
//! caller (entity auth / key exchange)
//!     |
//!     v
//! CryptoContext      -- capability + key checks, fixed at construction
//!     |
//!     v
//! CryptoPrimitives   -- async RSA / AES / HMAC provider
//!     |
//!     v
//! envelope           -- CiphertextEnvelope / SignatureEnvelope text
//! ```

pub mod context;
pub mod delivery;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod primitives;

#[cfg(test)]
mod testing;

pub use context::{CryptoContext, CryptoContextMode, RsaCryptoContext, SymmetricCryptoContext};
pub use error::{CryptoError, ErrorCode, ErrorKind};

/// Result type alias for envelope and context operations.
pub type Result<T> = std::result::Result<T, CryptoError>;
