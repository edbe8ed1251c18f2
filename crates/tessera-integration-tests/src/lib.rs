//! Integration tests for tessera crypto contexts.
//!
//! The library holds shared fixtures; the tests under `tests/` drive the
//! contexts end-to-end over the software provider with real RSA keys.
//!
//! ```sh
//! cargo test -p tessera-integration-tests
//! ```

use std::sync::OnceLock;

use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tessera_crypto::keys::{CipherKey, PrivateKey, PublicKey};
use tessera_crypto::{CryptoContextMode, RsaCryptoContext, SymmetricCryptoContext};
use tessera_provider::SoftwareProvider;

/// DER-encoded RSA key pair.
pub struct RsaKeyPair {
    pub private_der: Vec<u8>,
    pub public_der: Vec<u8>,
}

impl RsaKeyPair {
    /// PKCS#8 private key handle.
    pub fn private_key(&self) -> PrivateKey {
        PrivateKey::new("RSA", self.private_der.clone())
    }

    /// SPKI public key handle.
    pub fn public_key(&self) -> PublicKey {
        PublicKey::new("RSA", self.public_der.clone())
    }
}

fn generate() -> RsaKeyPair {
    let sk = RsaPrivateKey::new(&mut OsRng, 2048).expect("RSA key generation");
    let pk = RsaPublicKey::from(&sk);
    RsaKeyPair {
        private_der: sk.to_pkcs8_der().expect("PKCS#8 encoding").as_bytes().to_vec(),
        public_der: pk.to_public_key_der().expect("SPKI encoding").as_bytes().to_vec(),
    }
}

/// Key pair for the local entity, generated once per test binary.
pub fn alice_keys() -> &'static RsaKeyPair {
    static KEYS: OnceLock<RsaKeyPair> = OnceLock::new();
    KEYS.get_or_init(generate)
}

/// A second, unrelated key pair.
pub fn bob_keys() -> &'static RsaKeyPair {
    static KEYS: OnceLock<RsaKeyPair> = OnceLock::new();
    KEYS.get_or_init(generate)
}

/// RSA context over the software provider holding the given halves of `keys`.
pub fn rsa_context(
    identity: &str,
    keys: &RsaKeyPair,
    mode: CryptoContextMode,
    private: bool,
    public: bool,
) -> RsaCryptoContext<SoftwareProvider> {
    RsaCryptoContext::new(
        SoftwareProvider::new(),
        identity,
        private.then(|| keys.private_key()),
        public.then(|| keys.public_key()),
        mode,
    )
}

/// Symmetric context with a 128-bit AES key, a 256-bit HMAC key and a
/// 256-bit key-wrap key derived from `seed`.
pub fn symmetric_context(identity: &str, seed: u8) -> SymmetricCryptoContext<SoftwareProvider> {
    SymmetricCryptoContext::new(
        SoftwareProvider::new(),
        identity,
        Some(CipherKey::new("AES-CBC", vec![seed; 16])),
        Some(CipherKey::new("HmacSHA256", vec![seed.wrapping_add(1); 32])),
        Some(CipherKey::new("AES-KW", vec![seed.wrapping_add(2); 32])),
    )
}
