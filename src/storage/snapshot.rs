//! Snapshot format - toàn bộ cây thư mục được lưu thành một file.
//!
//! Workflow: Snapshot → JSON → gzip

use super::error::{FsError, Result};
use super::node::Node;
use crate::crypto::SALT_LEN;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Phiên bản format hiện tại
pub const SNAPSHOT_VERSION: u32 = 1;

/// Nội dung của file drive
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Phiên bản format (để migrate trong tương lai)
    pub version: u32,
    /// Salt cho key derivation của drive này
    pub salt: [u8; SALT_LEN],
    /// Root directory
    pub root: Node,
}

impl Snapshot {
    /// Serialize + compress
    pub fn encode(&self) -> Result<Vec<u8>> {
        let json = serde_json::to_vec(self)?;
        compress(&json)
    }

    /// Decompress + parse, kiểm tra version và root
    pub fn decode(data: &[u8]) -> Result<Self> {
        let json = decompress(data)?;
        let snapshot: Snapshot = serde_json::from_slice(&json)?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(FsError::InvalidSnapshot(format!(
                "unsupported version {}",
                snapshot.version
            )));
        }
        if !snapshot.root.is_directory() {
            return Err(FsError::InvalidSnapshot(
                "root is not a directory".to_string(),
            ));
        }

        Ok(snapshot)
    }
}

/// Compress data với gzip
fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompress data từ gzip
fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| FsError::InvalidSnapshot(format!("cannot decompress: {}", e)))?;
    Ok(decompressed)
}
