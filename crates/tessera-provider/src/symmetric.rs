//! AES-CBC, HMAC-SHA256 and AES key wrap over raw secret key bytes.

use aes::{Aes128, Aes256};
use aes_kw::{KekAes128, KekAes256};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tessera_crypto::primitives::PrimitiveError;

type HmacSha256 = Hmac<Sha256>;

/// AES block and CBC IV length.
pub(crate) const BLOCK_LENGTH: usize = 16;

/// Overhead added by AES key wrap (one 64-bit integrity block).
const KW_OVERHEAD: usize = 8;

fn bad_aes_key(len: usize) -> PrimitiveError {
    PrimitiveError::InvalidKey(format!("AES key of {len} bytes (expected 16 or 32)"))
}

fn check_iv(iv: &[u8]) -> Result<(), PrimitiveError> {
    if iv.len() == BLOCK_LENGTH {
        Ok(())
    } else {
        Err(PrimitiveError::Failed(format!(
            "IV of {} bytes (expected {BLOCK_LENGTH})",
            iv.len()
        )))
    }
}

pub(crate) fn cbc_encrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, PrimitiveError> {
    check_iv(iv)?;
    match key.len() {
        16 => cbc::Encryptor::<Aes128>::new_from_slices(key, iv)
            .map(|enc| enc.encrypt_padded_vec_mut::<Pkcs7>(data))
            .map_err(|_| bad_aes_key(key.len())),
        32 => cbc::Encryptor::<Aes256>::new_from_slices(key, iv)
            .map(|enc| enc.encrypt_padded_vec_mut::<Pkcs7>(data))
            .map_err(|_| bad_aes_key(key.len())),
        n => Err(bad_aes_key(n)),
    }
}

pub(crate) fn cbc_decrypt(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, PrimitiveError> {
    check_iv(iv)?;
    let result = match key.len() {
        16 => cbc::Decryptor::<Aes128>::new_from_slices(key, iv)
            .map_err(|_| bad_aes_key(key.len()))?
            .decrypt_padded_vec_mut::<Pkcs7>(data),
        32 => cbc::Decryptor::<Aes256>::new_from_slices(key, iv)
            .map_err(|_| bad_aes_key(key.len()))?
            .decrypt_padded_vec_mut::<Pkcs7>(data),
        n => return Err(bad_aes_key(n)),
    };
    result.map_err(|_| PrimitiveError::Failed("AES-CBC padding check failed".into()))
}

fn hmac(key: &[u8]) -> Result<HmacSha256, PrimitiveError> {
    <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| PrimitiveError::InvalidKey(format!("HMAC key: {e}")))
}

pub(crate) fn hmac_sign(key: &[u8], data: &[u8]) -> Result<Vec<u8>, PrimitiveError> {
    let mut mac = hmac(key)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Constant-time comparison.
pub(crate) fn hmac_verify(
    key: &[u8],
    signature: &[u8],
    data: &[u8],
) -> Result<bool, PrimitiveError> {
    let mut mac = hmac(key)?;
    mac.update(data);
    Ok(mac.verify_slice(signature).is_ok())
}

fn kek_array<const N: usize>(kek: &[u8]) -> Result<[u8; N], PrimitiveError> {
    kek.try_into().map_err(|_| bad_aes_key(kek.len()))
}

/// RFC 3394 wrap. `key` must be a multiple of 8 bytes, at least 16.
pub(crate) fn key_wrap(kek: &[u8], key: &[u8]) -> Result<Vec<u8>, PrimitiveError> {
    let mut wrapped = vec![0u8; key.len() + KW_OVERHEAD];
    let result = match kek.len() {
        16 => KekAes128::from(kek_array::<16>(kek)?).wrap(key, &mut wrapped),
        32 => KekAes256::from(kek_array::<32>(kek)?).wrap(key, &mut wrapped),
        n => return Err(bad_aes_key(n)),
    };
    result.map_err(|e| PrimitiveError::Failed(format!("AES-KW wrap: {e:?}")))?;
    Ok(wrapped)
}

/// RFC 3394 unwrap; fails if the integrity check does not hold.
pub(crate) fn key_unwrap(kek: &[u8], wrapped: &[u8]) -> Result<Vec<u8>, PrimitiveError> {
    let len = wrapped
        .len()
        .checked_sub(KW_OVERHEAD)
        .ok_or_else(|| PrimitiveError::Failed(format!("wrapped key of {} bytes", wrapped.len())))?;
    let mut key = vec![0u8; len];
    let result = match kek.len() {
        16 => KekAes128::from(kek_array::<16>(kek)?).unwrap(wrapped, &mut key),
        32 => KekAes256::from(kek_array::<32>(kek)?).unwrap(wrapped, &mut key),
        n => return Err(bad_aes_key(n)),
    };
    result.map_err(|e| PrimitiveError::Failed(format!("AES-KW unwrap: {e:?}")))?;
    Ok(key)
}
