//! Error types cho storage layer.

use thiserror::Error;

/// Lỗi của virtual file system và chunk transport
#[derive(Error, Debug)]
pub enum FsError {
    /// Path không tồn tại
    #[error("No such file or directory: {0}")]
    NotFound(String),

    /// Cần directory nhưng path là file
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    /// Cần file nhưng path là directory
    #[error("Is a directory: {0}")]
    IsADirectory(String),

    /// Operation không hợp lệ (xoá root, move vào chính nó, ...)
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Snapshot hỏng hoặc không đọc được
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Network request error
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend trả về dữ liệu không hợp lệ
    #[error("Remote error: {0}")]
    Remote(String),

    /// Checksum hoặc decryption thất bại
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Local I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias cho storage operations.
pub type Result<T> = std::result::Result<T, FsError>;
