//! Session - mở file system từ drive file và lưu lại sau khi thay đổi.
//!
//! Mỗi command mở đúng một `Session`, truyền qua handler rồi nhận lại.
//! Không có session global và không chia sẻ giữa các process.

use super::DriveArgs;
use crate::error::{CliError, Result};
use crate::storage::FileSystem;
use crate::transport::{ChunkStore, WebhookStore};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Cấu hình đã resolve (flag > environment > default)
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Secret key (rỗng = không mã hóa)
    pub key: String,
    /// Đường dẫn file snapshot
    pub drive: PathBuf,
    /// Webhook endpoint
    pub webhook: String,
}

impl SessionConfig {
    /// Kiểm tra các giá trị bắt buộc. clap đã áp dụng thứ tự flag > env.
    pub fn resolve(args: &DriveArgs) -> Result<Self> {
        let webhook = args
            .webhook
            .clone()
            .filter(|w| !w.is_empty())
            .ok_or_else(|| {
                CliError::Config(
                    "A webhook must be specified, either via the --webhook parameter or $FSX_WEBHOOK environment variable."
                        .to_string(),
                )
            })?;

        let drive = args
            .drive
            .clone()
            .filter(|d| !d.as_os_str().is_empty())
            .ok_or_else(|| {
                CliError::Config(
                    "A data file must be specified, either via the --drive parameter or $FSX_DRIVE environment variable."
                        .to_string(),
                )
            })?;

        Ok(Self {
            key: args.key.clone().unwrap_or_default(),
            drive,
            webhook,
        })
    }
}

/// File system đang mở cùng với drive file của nó
pub struct Session {
    pub fs: FileSystem,
    drive: PathBuf,
}

impl Session {
    pub fn drive(&self) -> &Path {
        &self.drive
    }
}

/// Mở session với webhook transport
pub fn open(config: &SessionConfig) -> Result<Session> {
    let store = WebhookStore::new(&config.webhook)?;
    open_with_store(config, Box::new(store))
}

/// Mở session với chunk backend bất kỳ
pub fn open_with_store(config: &SessionConfig, store: Box<dyn ChunkStore>) -> Result<Session> {
    let data = if config.drive.exists() {
        let bytes = fs::read(&config.drive).map_err(|e| {
            CliError::io(
                format!("Unable to read data file {}", config.drive.display()),
                e,
            )
        })?;
        tracing::debug!("Loaded {} bytes from {}", bytes.len(), config.drive.display());
        Some(bytes)
    } else {
        tracing::debug!("No data file at {}, starting empty", config.drive.display());
        None
    };

    let fs = FileSystem::init(store, &config.key, data.as_deref())?;

    Ok(Session {
        fs,
        drive: config.drive.clone(),
    })
}

/// Export snapshot và ghi đè drive file.
///
/// Thư mục chứa drive file phải tồn tại sẵn. File mới được ghi ra
/// file tạm cạnh đó rồi rename.
pub fn save(session: &Session) -> Result<()> {
    let drive = session.drive();
    let data = session.fs.export()?;

    tracing::info!("Writing data file to: {}", drive.display());

    let file_name = drive.file_name().ok_or_else(|| {
        CliError::Config(format!("Invalid data file path: {}", drive.display()))
    })?;
    let parent = match drive.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    if !parent.is_dir() {
        return Err(CliError::io(
            format!("Unable to write data file {}", drive.display()),
            io::Error::new(
                io::ErrorKind::NotFound,
                "containing directory doesn't exist",
            ),
        ));
    }

    let temp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));
    fs::write(&temp_path, &data)
        .and_then(|_| fs::rename(&temp_path, drive))
        .map_err(|e| CliError::io(format!("Unable to write data file {}", drive.display()), e))?;

    Ok(())
}
