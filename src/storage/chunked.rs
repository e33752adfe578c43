//! Chunk codec - encrypt (nếu có key) + checksum trước khi đẩy lên backend.
//!
//! Workflow upload: plaintext → encrypt → sha256 → `ChunkStore::put`
//! Workflow download: `ChunkStore::get` → verify sha256 → decrypt

use super::error::{FsError, Result};
use super::node::ChunkRef;
use crate::crypto::ChunkCipher;
use crate::transport::ChunkStore;
use sha2::{Digest, Sha256};

/// Kích thước chunk tối đa (8MiB - safe margin dưới giới hạn attachment của webhook)
pub const CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Tính SHA256 checksum
fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Encode và lưu một chunk
pub fn store_chunk(
    store: &dyn ChunkStore,
    cipher: Option<&ChunkCipher>,
    plaintext: &[u8],
) -> Result<ChunkRef> {
    let payload = match cipher {
        Some(cipher) => cipher
            .seal(plaintext)
            .map_err(|e| FsError::Crypto(e.to_string()))?,
        None => plaintext.to_vec(),
    };

    let sha256 = sha256_hex(&payload);
    let url = store.put(&payload)?;

    Ok(ChunkRef {
        url,
        size: plaintext.len() as u64,
        sha256,
    })
}

/// Tải và decode một chunk
pub fn fetch_chunk(
    store: &dyn ChunkStore,
    cipher: Option<&ChunkCipher>,
    chunk: &ChunkRef,
) -> Result<Vec<u8>> {
    let payload = store.get(&chunk.url)?;

    if sha256_hex(&payload) != chunk.sha256 {
        return Err(FsError::Crypto(format!(
            "checksum mismatch for chunk {}",
            chunk.url
        )));
    }

    let plaintext = match cipher {
        Some(cipher) => cipher
            .open(&payload)
            .map_err(|e| FsError::Crypto(e.to_string()))?,
        None => payload,
    };

    if plaintext.len() as u64 != chunk.size {
        return Err(FsError::Crypto(format!(
            "chunk {} has {} bytes, expected {}",
            chunk.url,
            plaintext.len(),
            chunk.size
        )));
    }

    Ok(plaintext)
}
