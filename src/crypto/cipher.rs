//! AES-256-GCM cho chunk trước khi gửi lên webhook.
//!
//! Layout của một sealed chunk: `nonce (12) || ciphertext || tag (16)`.
//! Nonce random cho mỗi chunk nên cùng plaintext cho ra payload khác nhau.

use super::kdf::{self, KEY_LEN, SALT_LEN};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use anyhow::{anyhow, ensure, Result};
use rand::{rngs::OsRng, RngCore};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

pub struct ChunkCipher {
    aead: Aes256Gcm,
}

impl ChunkCipher {
    /// Key của drive = Argon2id(secret, salt trong snapshot)
    pub fn from_secret(secret: &str, salt: &[u8; SALT_LEN]) -> Result<Self> {
        let key = kdf::derive(secret, salt)?;
        Ok(Self::from_key(&key))
    }

    fn from_key(key: &[u8; KEY_LEN]) -> Self {
        Self {
            aead: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }

    pub fn seal(&self, chunk: &[u8]) -> Result<Vec<u8>> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .aead
            .encrypt(Nonce::from_slice(&nonce), chunk)
            .map_err(|e| anyhow!("Chunk encryption failed: {}", e))?;

        let mut sealed = nonce.to_vec();
        sealed.extend(ciphertext);
        Ok(sealed)
    }

    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        ensure!(
            sealed.len() >= NONCE_LEN + TAG_LEN,
            "Sealed chunk is only {} bytes",
            sealed.len()
        );
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.aead
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| anyhow!("Cannot decrypt chunk (wrong --key?)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher(byte: u8) -> ChunkCipher {
        ChunkCipher::from_key(&[byte; KEY_LEN])
    }

    #[test]
    fn seal_then_open() -> Result<()> {
        let cipher = cipher(1);
        let sealed = cipher.seal(b"chunk payload")?;

        assert_eq!(sealed.len(), NONCE_LEN + b"chunk payload".len() + TAG_LEN);
        assert_eq!(cipher.open(&sealed)?, b"chunk payload");
        Ok(())
    }

    #[test]
    fn nonce_is_fresh_per_chunk() -> Result<()> {
        let cipher = cipher(1);
        assert_ne!(cipher.seal(b"same")?, cipher.seal(b"same")?);
        Ok(())
    }

    #[test]
    fn other_key_cannot_open() -> Result<()> {
        let sealed = cipher(1).seal(b"secret")?;
        let err = cipher(2).open(&sealed).unwrap_err();
        assert!(err.to_string().contains("wrong --key"));
        Ok(())
    }

    #[test]
    fn truncated_chunk_is_rejected() {
        assert!(cipher(1).open(&[0u8; NONCE_LEN]).is_err());
    }

    #[test]
    fn secret_keyed_cipher_round_trips() -> Result<()> {
        let salt = [4u8; SALT_LEN];
        let sealed = ChunkCipher::from_secret("k", &salt)?.seal(b"x")?;
        assert_eq!(ChunkCipher::from_secret("k", &salt)?.open(&sealed)?, b"x");
        Ok(())
    }
}
