//! Opaque key handles.
//!
//! Handles wrap raw key material produced by external collaborators (key
//! stores, key exchange) or returned by an unwrap. This crate never looks
//! inside the material; only the primitive provider interprets it.
//!
//! Material conventions used by the software provider:
//!
//! - [`CipherKey`]: raw secret bytes
//! - [`PublicKey`]: DER `SubjectPublicKeyInfo`
//! - [`PrivateKey`]: DER PKCS#8 `PrivateKeyInfo`

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

/// Type of a key as reported by a primitive provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    Secret,
    Public,
    Private,
}

impl KeyType {
    /// Name as reported by providers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Secret => "secret",
            Self::Public => "public",
            Self::Private => "private",
        }
    }

    /// Map a provider-reported type string. Unknown strings yield `None`.
    pub fn from_reported(reported: &str) -> Option<Self> {
        match reported {
            "secret" => Some(Self::Secret),
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Permitted use of a key, requested when unwrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyUsage {
    Encrypt,
    Decrypt,
    Sign,
    Verify,
    WrapKey,
    UnwrapKey,
}

/// A secret (symmetric) key.
#[derive(Clone)]
pub struct CipherKey {
    algorithm: String,
    usages: Vec<KeyUsage>,
    material: Vec<u8>,
}

impl CipherKey {
    /// Wrap raw secret bytes for the named algorithm (e.g. `"AES-CBC"`).
    pub fn new(algorithm: impl Into<String>, material: Vec<u8>) -> Self {
        Self {
            algorithm: algorithm.into(),
            usages: Vec::new(),
            material,
        }
    }

    /// Grant the given usages.
    pub fn with_usages(mut self, usages: &[KeyUsage]) -> Self {
        self.usages = usages.to_vec();
        self
    }

    /// Algorithm the key is bound to.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Permitted usages.
    pub fn usages(&self) -> &[KeyUsage] {
        &self.usages
    }

    /// Raw key bytes.
    pub fn material(&self) -> &[u8] {
        &self.material
    }
}

impl Drop for CipherKey {
    fn drop(&mut self) {
        self.material.zeroize();
    }
}

impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CipherKey")
            .field("algorithm", &self.algorithm)
            .field("usages", &self.usages)
            .field("len", &self.material.len())
            .finish()
    }
}

/// An asymmetric public key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    algorithm: String,
    usages: Vec<KeyUsage>,
    material: Vec<u8>,
}

impl PublicKey {
    /// Wrap DER `SubjectPublicKeyInfo` bytes.
    pub fn new(algorithm: impl Into<String>, material: Vec<u8>) -> Self {
        Self {
            algorithm: algorithm.into(),
            usages: Vec::new(),
            material,
        }
    }

    /// Grant the given usages.
    pub fn with_usages(mut self, usages: &[KeyUsage]) -> Self {
        self.usages = usages.to_vec();
        self
    }

    /// Algorithm the key is bound to.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Permitted usages.
    pub fn usages(&self) -> &[KeyUsage] {
        &self.usages
    }

    /// DER key bytes.
    pub fn material(&self) -> &[u8] {
        &self.material
    }
}

/// An asymmetric private key.
#[derive(Clone)]
pub struct PrivateKey {
    algorithm: String,
    usages: Vec<KeyUsage>,
    material: Vec<u8>,
}

impl PrivateKey {
    /// Wrap DER PKCS#8 bytes.
    pub fn new(algorithm: impl Into<String>, material: Vec<u8>) -> Self {
        Self {
            algorithm: algorithm.into(),
            usages: Vec::new(),
            material,
        }
    }

    /// Grant the given usages.
    pub fn with_usages(mut self, usages: &[KeyUsage]) -> Self {
        self.usages = usages.to_vec();
        self
    }

    /// Algorithm the key is bound to.
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// Permitted usages.
    pub fn usages(&self) -> &[KeyUsage] {
        &self.usages
    }

    /// DER key bytes.
    pub fn material(&self) -> &[u8] {
        &self.material
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.material.zeroize();
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algorithm", &self.algorithm)
            .field("usages", &self.usages)
            .field("len", &self.material.len())
            .finish()
    }
}

/// Borrowed view over any key handle, as handed to a primitive provider.
#[derive(Debug, Clone, Copy)]
pub enum KeyRef<'a> {
    Secret(&'a CipherKey),
    Public(&'a PublicKey),
    Private(&'a PrivateKey),
}

impl<'a> KeyRef<'a> {
    /// Type of the referenced key.
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Secret(_) => KeyType::Secret,
            Self::Public(_) => KeyType::Public,
            Self::Private(_) => KeyType::Private,
        }
    }

    /// Algorithm of the referenced key.
    pub fn algorithm(&self) -> &'a str {
        match self {
            Self::Secret(k) => k.algorithm(),
            Self::Public(k) => k.algorithm(),
            Self::Private(k) => k.algorithm(),
        }
    }

    /// Raw material of the referenced key.
    pub fn material(&self) -> &'a [u8] {
        match self {
            Self::Secret(k) => k.material(),
            Self::Public(k) => k.material(),
            Self::Private(k) => k.material(),
        }
    }
}

impl<'a> From<&'a CipherKey> for KeyRef<'a> {
    fn from(key: &'a CipherKey) -> Self {
        Self::Secret(key)
    }
}

impl<'a> From<&'a PublicKey> for KeyRef<'a> {
    fn from(key: &'a PublicKey) -> Self {
        Self::Public(key)
    }
}

impl<'a> From<&'a PrivateKey> for KeyRef<'a> {
    fn from(key: &'a PrivateKey) -> Self {
        Self::Private(key)
    }
}

/// A key handle produced by an unwrap, typed by what the provider reported.
#[derive(Debug, Clone)]
pub enum UnwrappedKey {
    Secret(CipherKey),
    Public(PublicKey),
    Private(PrivateKey),
}

impl UnwrappedKey {
    /// Type reported at unwrap.
    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Secret(_) => KeyType::Secret,
            Self::Public(_) => KeyType::Public,
            Self::Private(_) => KeyType::Private,
        }
    }

    /// Borrow as a [`KeyRef`], e.g. to wrap it again for another peer.
    pub fn as_key_ref(&self) -> KeyRef<'_> {
        match self {
            Self::Secret(k) => KeyRef::Secret(k),
            Self::Public(k) => KeyRef::Public(k),
            Self::Private(k) => KeyRef::Private(k),
        }
    }

    /// The secret key, if that is what was unwrapped.
    pub fn into_secret(self) -> Option<CipherKey> {
        match self {
            Self::Secret(k) => Some(k),
            _ => None,
        }
    }
}
