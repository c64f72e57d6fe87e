//! Password-keyed XOR cipher for the privacy space.
//!
//! This is obfuscation, not cryptography: the same password always yields
//! the same key stream, and the ciphertext is trivially breakable. It keeps
//! casual readers of the database file from seeing private bookmarks.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::{Error, Result};

/// Length of the derived key in bytes.
pub const KEY_LENGTH: usize = 32;

/// Derive the XOR key: the password repeated, cut to [`KEY_LENGTH`] bytes.
///
/// # Errors
///
/// Returns [`Error::PasswordRule`] for an empty password.
pub fn derive_key(password: &str) -> Result<Vec<u8>> {
    if password.is_empty() {
        return Err(Error::password_rule("password must not be empty"));
    }
    Ok(password
        .bytes()
        .cycle()
        .take(KEY_LENGTH)
        .collect())
}

fn xor(data: &[u8], key: &[u8]) -> Vec<u8> {
    data.iter()
        .zip(key.iter().cycle())
        .map(|(byte, k)| byte ^ k)
        .collect()
}

/// Encrypt `text` under `password`, returning lowercase hex.
///
/// # Errors
///
/// Returns an error for an empty password.
pub fn encrypt(text: &str, password: &str) -> Result<String> {
    let key = derive_key(password)?;
    Ok(hex::encode(xor(text.as_bytes(), &key)))
}

/// Decrypt ciphertext produced by [`encrypt`].
///
/// Ciphertext that is not hex is read as base64, the format older releases
/// wrote. Legacy plaintext that is not UTF-8 is read as Latin-1.
///
/// # Errors
///
/// Returns [`Error::Decrypt`] if the input is neither hex nor base64, or if
/// hex ciphertext does not decrypt to UTF-8 (usually a wrong password).
pub fn decrypt(cipher: &str, password: &str) -> Result<String> {
    let key = derive_key(password)?;
    let cipher = cipher.trim();

    if let Ok(bytes) = hex::decode(cipher) {
        return String::from_utf8(xor(&bytes, &key))
            .map_err(|_| Error::decrypt("result is not valid UTF-8"));
    }

    let bytes = BASE64
        .decode(cipher)
        .map_err(|_| Error::decrypt("unrecognized ciphertext format"))?;
    let plain = xor(&bytes, &key);
    Ok(String::from_utf8(plain.clone())
        .unwrap_or_else(|_| plain.into_iter().map(char::from).collect()))
}
