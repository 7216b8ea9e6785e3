use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use xsalsa20poly1305::aead::{Aead, KeyInit};
use xsalsa20poly1305::{Key, Nonce, XSalsa20Poly1305};

const NONCE_LEN: usize = 24;

pub fn blake3_hash(bytes: &[u8]) -> [u8; 32] {
    *blake3::hash(bytes).as_bytes()
}

fn cipher_for(secret: &str) -> XSalsa20Poly1305 {
    let key = blake3_hash(secret.as_bytes());
    XSalsa20Poly1305::new(Key::from_slice(&key))
}

/// Seals `plaintext` under a key derived from `secret`.
/// Output is url-safe base64 of `nonce || ciphertext`.
pub fn encrypt(plaintext: &str, secret: &str) -> Result<String> {
    let mut nonce = [0u8; NONCE_LEN];
    rand::fill(&mut nonce[..]);

    let sealed = cipher_for(secret)
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
        .map_err(|_| anyhow!("failed to seal payload"))?;

    let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(URL_SAFE_NO_PAD.encode(out))
}

pub fn decrypt(token: &str, secret: &str) -> Result<String> {
    let raw = URL_SAFE_NO_PAD
        .decode(token.trim())
        .map_err(|e| anyhow!("token is not valid base64: {}", e))?;

    if raw.len() <= NONCE_LEN {
        return Err(anyhow!("token is too short"));
    }

    let (nonce, sealed) = raw.split_at(NONCE_LEN);
    let opened = cipher_for(secret)
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| anyhow!("token failed authentication"))?;

    String::from_utf8(opened).map_err(|e| anyhow!("token payload is not utf-8: {}", e))
}
