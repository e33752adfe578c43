//! Error types và exit codes của fsx CLI.

use crate::storage::FsError;
use std::fmt;
use thiserror::Error;

/// Mã lỗi cho precondition errors (dùng làm exit code)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Path không tồn tại
    NotExists,
    /// Cần directory nhưng target là file
    IsFile,
    /// Cần file nhưng target là directory
    IsDirectory,
}

impl ErrorCode {
    pub fn code(self) -> i32 {
        match self {
            ErrorCode::NotExists => -1,
            ErrorCode::IsFile => -2,
            ErrorCode::IsDirectory => -3,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::NotExists => "File or directory doesn't exist",
            ErrorCode::IsFile => "Target is a file",
            ErrorCode::IsDirectory => "Target is a directory",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Lỗi ở tầng command. Mỗi lỗi kết thúc process với `exit_code()`.
#[derive(Error, Debug)]
pub enum CliError {
    /// Thiếu cấu hình bắt buộc (webhook, drive)
    #[error("{0}")]
    Config(String),

    /// Target không tồn tại hoặc sai loại node
    #[error("{code} ({}): {path}", .code.code())]
    Precondition { code: ErrorCode, path: String },

    /// Dùng sai cách (ví dụ: upload mà không pipe data)
    #[error("{0}")]
    Usage(String),

    /// Đọc/ghi local file thất bại
    #[error("{message}: {source}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Lỗi từ storage layer
    #[error(transparent)]
    Storage(FsError),
}

impl CliError {
    pub fn precondition(code: ErrorCode, path: impl Into<String>) -> Self {
        CliError::Precondition {
            code,
            path: path.into(),
        }
    }

    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        CliError::Io {
            message: message.into(),
            source,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Precondition { code, .. } => code.code(),
            CliError::Config(_) | CliError::Usage(_) | CliError::Io { .. } | CliError::Storage(_) => 1,
        }
    }
}

impl From<FsError> for CliError {
    fn from(err: FsError) -> Self {
        match err {
            FsError::NotFound(path) => CliError::precondition(ErrorCode::NotExists, path),
            FsError::NotADirectory(path) => CliError::precondition(ErrorCode::IsFile, path),
            FsError::IsADirectory(path) => CliError::precondition(ErrorCode::IsDirectory, path),
            other => CliError::Storage(other),
        }
    }
}

/// Result type alias cho command handlers.
pub type Result<T> = std::result::Result<T, CliError>;
