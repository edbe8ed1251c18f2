//! Integration test: RSA crypto contexts over the software provider.
//!
//! Exercises every capability group with real 2048-bit keys:
//! 1. OAEP and PKCS#1 encrypt/decrypt between a sender holding only the
//!    public key and a receiver holding the private key
//! 2. Key-id binding of V1 ciphertext envelopes
//! 3. Secret-key wrap/unwrap (JWK transport)
//! 4. SHA256withRSA sign/verify
//! 5. Capability gating and pass-through of inactive groups

use std::sync::Arc;

use tessera_crypto::envelope::{CiphertextEnvelope, Version};
use tessera_crypto::keys::{CipherKey, KeyRef, KeyType, KeyUsage};
use tessera_crypto::{
    CryptoContext, CryptoContextMode, ErrorCode, ErrorKind, SymmetricCryptoContext,
};
use tessera_integration_tests::{alice_keys, bob_keys, rsa_context};
use tessera_provider::SoftwareProvider;

#[tokio::test]
async fn encrypt_decrypt_between_peers() {
    for mode in [
        CryptoContextMode::EncryptDecryptOaep,
        CryptoContextMode::EncryptDecryptPkcs1,
    ] {
        // Sender only knows alice's public key.
        let sender = rsa_context("alice", alice_keys(), mode, false, true);
        let receiver = rsa_context("alice", alice_keys(), mode, true, false);

        let ciphertext = sender.encrypt(b"handshake payload").await.expect("encrypt");
        let envelope = CiphertextEnvelope::from_text(&ciphertext, None).expect("envelope");
        assert_eq!(envelope.version(), Version::V1);
        assert_eq!(envelope.key_id(), Some("alice"));
        assert_eq!(envelope.ciphertext().len(), 256, "{mode}");

        let plaintext = receiver.decrypt(&ciphertext).await.expect("decrypt");
        assert_eq!(plaintext, b"handshake payload");

        let err = sender.decrypt(&ciphertext).await.expect_err("sender has no private key");
        assert_eq!(err.kind(), ErrorKind::CapabilityUnavailable);
    }
}

#[tokio::test]
async fn oaep_ciphertext_is_randomized() {
    let mode = CryptoContextMode::EncryptDecryptOaep;
    let ctx = rsa_context("alice", alice_keys(), mode, false, true);
    let a = ctx.encrypt(b"same").await.expect("first");
    let b = ctx.encrypt(b"same").await.expect("second");
    assert_ne!(a, b);
}

#[tokio::test]
async fn decrypt_rejects_foreign_envelope() {
    let mode = CryptoContextMode::EncryptDecryptOaep;
    let bob = rsa_context("bob", bob_keys(), mode, true, true);
    let alice = rsa_context("alice", alice_keys(), mode, true, true);

    let for_bob = bob.encrypt(b"not for alice").await.expect("encrypt");
    let err = alice.decrypt(&for_bob).await.expect_err("key id mismatch");
    assert_eq!(err.kind(), ErrorKind::ProtocolMismatch);
    assert_eq!(err.code(), ErrorCode::EnvelopeKeyIdMismatch);
}

#[tokio::test]
async fn decrypt_with_wrong_key_is_crypto_error() {
    let mode = CryptoContextMode::EncryptDecryptOaep;
    // Same identity, different key pair.
    let sender = rsa_context("alice", alice_keys(), mode, false, true);
    let impostor = rsa_context("alice", bob_keys(), mode, true, false);

    let ciphertext = sender.encrypt(b"secret").await.expect("encrypt");
    let err = impostor.decrypt(&ciphertext).await.expect_err("wrong key");
    assert_eq!(err.kind(), ErrorKind::CryptoOperation);
    assert_eq!(err.code(), ErrorCode::DecryptError);
}

#[tokio::test]
async fn wrap_unwrap_session_key() {
    for mode in [CryptoContextMode::WrapUnwrapOaep, CryptoContextMode::WrapUnwrapPkcs1] {
        let ctx = rsa_context("alice", alice_keys(), mode, true, true);
        let session = CipherKey::new("AES-CBC", (0u8..16).collect());

        let wrapped = ctx.wrap(KeyRef::from(&session)).await.expect("wrap");
        assert_eq!(wrapped.len(), 256);

        let unwrapped = ctx
            .unwrap(&wrapped, "AES-CBC", &[KeyUsage::Encrypt, KeyUsage::Decrypt])
            .await
            .expect("unwrap");
        assert_eq!(unwrapped.key_type(), KeyType::Secret);
        let key = unwrapped.into_secret().expect("secret key");
        assert_eq!(key.material(), session.material());
        assert_eq!(key.algorithm(), "AES-CBC");

        // The unwrapped handle drives a symmetric context directly.
        let sender = SymmetricCryptoContext::new(
            SoftwareProvider::new(),
            "session",
            Some(session.clone()),
            None,
            None,
        );
        let receiver =
            SymmetricCryptoContext::new(SoftwareProvider::new(), "session", Some(key), None, None);
        let ciphertext = sender.encrypt(b"session traffic").await.expect("encrypt");
        let plaintext = receiver.decrypt(&ciphertext).await.expect("decrypt");
        assert_eq!(plaintext, b"session traffic");
    }
}

#[tokio::test]
async fn wrap_disabled_outside_wrap_modes() {
    let session = CipherKey::new("AES-CBC", vec![1; 16]);
    for mode in [
        CryptoContextMode::EncryptDecryptOaep,
        CryptoContextMode::EncryptDecryptPkcs1,
        CryptoContextMode::SignVerify,
    ] {
        let ctx = rsa_context("alice", alice_keys(), mode, true, true);
        let err = ctx.wrap(KeyRef::from(&session)).await.expect_err("wrap inactive");
        assert_eq!(err.kind(), ErrorKind::CapabilityUnavailable);
        let err = ctx.unwrap(&[0; 256], "AES-CBC", &[]).await.expect_err("unwrap inactive");
        assert_eq!(err.kind(), ErrorKind::CapabilityUnavailable);
    }
}

#[tokio::test]
async fn unwrap_garbage_is_crypto_error() {
    let ctx = rsa_context("alice", alice_keys(), CryptoContextMode::WrapUnwrapOaep, true, true);
    let err = ctx.unwrap(&[0x42; 256], "AES-CBC", &[]).await.expect_err("garbage");
    assert_eq!(err.code(), ErrorCode::UnwrapError);
}

#[tokio::test]
async fn sign_verify_roundtrip() {
    let signer = rsa_context("alice", alice_keys(), CryptoContextMode::SignVerify, true, false);
    let verifier = rsa_context("alice", alice_keys(), CryptoContextMode::SignVerify, false, true);

    let signature = signer.sign(b"authdata").await.expect("sign");
    assert_eq!(signature.len(), 256);
    assert!(verifier.verify(b"authdata", &signature).await.expect("verify"));
    assert!(!verifier.verify(b"authdatb", &signature).await.expect("verify"));

    // Signed by someone else.
    let other = rsa_context("bob", bob_keys(), CryptoContextMode::SignVerify, true, false);
    let forged = other.sign(b"authdata").await.expect("sign");
    assert!(!verifier.verify(b"authdata", &forged).await.expect("verify"));
}

#[tokio::test]
async fn inactive_groups_pass_through() {
    let ctx = rsa_context("alice", alice_keys(), CryptoContextMode::WrapUnwrapOaep, true, true);
    assert_eq!(ctx.encrypt(b"clear").await.expect("encrypt"), b"clear");
    assert_eq!(ctx.decrypt(b"clear").await.expect("decrypt"), b"clear");
    assert!(ctx.sign(b"data").await.expect("sign").is_empty());
    assert!(ctx.verify(b"data", b"").await.expect("verify"));
}

#[tokio::test]
async fn concurrent_use_of_one_context() {
    let ctx = Arc::new(rsa_context(
        "alice",
        alice_keys(),
        CryptoContextMode::EncryptDecryptOaep,
        true,
        true,
    ));

    let handles: Vec<_> = (0..4u8)
        .map(|i| {
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move {
                let message = vec![i; 32];
                let ciphertext = ctx.encrypt(&message).await?;
                let plaintext = ctx.decrypt(&ciphertext).await?;
                Ok::<_, tessera_crypto::CryptoError>(plaintext == message)
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.expect("join").expect("roundtrip"));
    }
}
