//! CLI definitions và command implementations cho fsx.

pub mod commands;
pub mod paths;
pub mod progress;
pub mod session;
pub mod table;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// fsx - Virtual file system lưu trữ qua webhook
#[derive(Parser)]
#[command(name = "fsx")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub drive: DriveArgs,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Cấu hình drive dùng chung cho mọi command
#[derive(Args, Debug, Clone, Default)]
pub struct DriveArgs {
    /// Secret key dùng để mã hóa chunks
    #[arg(long, global = true, env = "FSX_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// File snapshot của drive
    #[arg(long, global = true, env = "FSX_DRIVE")]
    pub drive: Option<PathBuf>,

    /// Webhook endpoint để lưu chunks
    #[arg(long, global = true, env = "FSX_WEBHOOK")]
    pub webhook: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Liệt kê nội dung của một directory
    Ls {
        /// Directory cần liệt kê
        directory: String,
    },

    /// Copy file hoặc directory. Nếu <target> là directory, source được tạo bên trong nó
    Cp {
        /// File hoặc directory cần copy
        source: String,
        /// Directory đích hoặc tên file mới
        target: String,
    },

    /// Move file hoặc directory (cùng cách đặt chỗ như cp)
    Mv {
        /// File hoặc directory cần move
        source: String,
        /// Directory đích hoặc tên mới
        target: String,
    },

    /// Xoá file hoặc directory (đệ quy)
    Rm {
        /// File hoặc directory cần xoá
        target: String,
    },

    /// Upload dữ liệu từ stdin vào đường dẫn chỉ định
    Upload {
        /// Nơi file sẽ được lưu
        filename: String,
    },

    /// Download một file, ghi ra stdout
    Download {
        /// File cần download
        filename: String,
    },

    /// In script shell completion ra stdout
    Completions {
        /// Shell cần sinh script
        #[arg(value_enum)]
        shell: Shell,
    },
}
