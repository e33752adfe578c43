//! Crypto cho chunk data: Argon2id key từ `--key` + AES-256-GCM cho từng chunk.

mod cipher;
mod kdf;

pub use cipher::ChunkCipher;
pub use kdf::{generate_salt, SALT_LEN};
