//! Command implementations cho fsx CLI.
//!
//! Mỗi handler nhận `Session` đã mở, kiểm tra precondition trước,
//! thực hiện đúng một operation rồi trả session lại cho caller.
//! Các command thay đổi drive (cp, mv, rm, upload) tự lưu snapshot.

use super::paths;
use super::progress::{finish_transfer, report_transfer};
use super::session::{self, Session};
use super::table::{self, plural, readable_file_size, Align, TableSpec};
use super::{Cli, Commands};
use crate::error::{CliError, ErrorCode, Result};
use crate::storage::Node;
use chrono::Local;
use clap::CommandFactory;
use clap_complete::Shell;
use colored::Colorize;
use std::io::{self, IsTerminal, Read, Write};

/// Header của bảng `ls`
const LISTING_HEADER: [&str; 4] = ["name", "type", "size", "created at"];

/// Chạy command với stdin/stdout của process
pub fn run(command: Commands, session: Session) -> Result<Session> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Ls { directory } => ls(session, &directory, &mut out),
        Commands::Cp { source, target } => cp(session, &source, &target, &mut out),
        Commands::Mv { source, target } => mv(session, &source, &target),
        Commands::Rm { target } => rm(session, &target),
        Commands::Upload { filename } => {
            let stdin = io::stdin();
            let interactive = stdin.is_terminal();
            upload(session, &filename, &mut stdin.lock(), interactive)
        }
        Commands::Download { filename } => download(session, &filename, &mut out),
        Commands::Completions { shell } => {
            completions(shell, &mut out);
            Ok(session)
        }
    }
}

/// Sinh completion script cho `shell`
pub fn completions(shell: Shell, out: &mut dyn Write) {
    clap_complete::generate(shell, &mut Cli::command(), "fsx", out);
}

fn require_exists(session: &Session, path: &str) -> Result<()> {
    if session.fs.exists(path) {
        Ok(())
    } else {
        Err(CliError::precondition(ErrorCode::NotExists, path))
    }
}

/// Một dòng trong bảng `ls`
fn listing_row(node: &Node) -> Vec<String> {
    match node {
        Node::File {
            name,
            size,
            created_at,
            ..
        } => vec![
            name.clone(),
            "file".to_string(),
            readable_file_size(*size),
            created_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
        ],
        Node::Directory { name, children } => vec![
            name.clone(),
            "directory".to_string(),
            format!(
                "{} {}",
                children.len(),
                plural(children.len(), "child", "children")
            ),
            String::new(),
        ],
    }
}

/// Liệt kê nội dung directory dưới dạng bảng
pub fn ls(session: Session, directory: &str, out: &mut dyn Write) -> Result<Session> {
    let directory = paths::resolve(directory);

    let children = match session.fs.get_node(&directory) {
        None => return Err(CliError::precondition(ErrorCode::NotExists, directory)),
        Some(Node::File { .. }) => {
            return Err(CliError::precondition(ErrorCode::IsFile, directory));
        }
        Some(Node::Directory { children, .. }) => children,
    };

    let mut rows: Vec<Vec<String>> = vec![LISTING_HEADER.iter().map(|h| h.to_string()).collect()];
    rows.extend(children.iter().map(listing_row));

    let text = table::render(&TableSpec {
        alignments: vec![Align::Left, Align::Right, Align::Right, Align::Left],
        header_separator: true,
        rows,
    });

    writeln!(out, "{}", text).map_err(|e| CliError::io("Unable to write listing", e))?;
    Ok(session)
}

/// Copy rồi liệt kê lại directory chứa target
pub fn cp(mut session: Session, source: &str, target: &str, out: &mut dyn Write) -> Result<Session> {
    let source = paths::resolve(source);
    let target = paths::resolve(target);

    require_exists(&session, &source)?;
    session.fs.copy(&source, &target)?;
    session::save(&session)?;

    ls(session, &paths::parent(&target), out)
}

/// Move (copy + delete source)
pub fn mv(mut session: Session, source: &str, target: &str) -> Result<Session> {
    let source = paths::resolve(source);
    let target = paths::resolve(target);

    require_exists(&session, &source)?;
    session.fs.rename(&source, &target)?;
    session::save(&session)?;

    Ok(session)
}

/// Xoá file hoặc directory
pub fn rm(mut session: Session, target: &str) -> Result<Session> {
    let target = paths::resolve(target);

    require_exists(&session, &target)?;
    session.fs.delete(&target)?;
    session::save(&session)?;

    Ok(session)
}

/// Upload toàn bộ `input` vào `filename`
pub fn upload(
    mut session: Session,
    filename: &str,
    input: &mut dyn Read,
    interactive: bool,
) -> Result<Session> {
    if interactive {
        return Err(CliError::Usage(format!(
            "Pipe some data to this command to start an upload.\n\n    $ cat data.txt | fsx upload {}",
            filename
        )));
    }

    let filename = paths::resolve(filename);
    if let Some(Node::Directory { .. }) = session.fs.get_node(&filename) {
        return Err(CliError::precondition(ErrorCode::IsDirectory, filename));
    }

    eprintln!("{} {}...", "Uploading to".cyan(), filename);

    let mut transfer = session.fs.begin_upload(&filename)?;
    let stats = transfer.stats();
    let mut reporter = report_transfer(stats.clone());

    io::copy(input, &mut transfer)
        .map_err(|e| CliError::io(format!("Upload of {} failed", filename), e))?;
    transfer.finish()?;

    finish_transfer(&mut reporter, &stats);
    session::save(&session)?;

    Ok(session)
}

/// Download file, ghi bytes ra `out`
pub fn download(session: Session, filename: &str, out: &mut dyn Write) -> Result<Session> {
    let filename = paths::resolve(filename);

    match session.fs.get_node(&filename) {
        None => return Err(CliError::precondition(ErrorCode::NotExists, filename)),
        Some(Node::Directory { .. }) => {
            return Err(CliError::precondition(ErrorCode::IsDirectory, filename));
        }
        Some(Node::File { .. }) => {}
    }

    eprintln!("{} {}...", "Downloading".cyan(), filename);

    {
        let mut transfer = session.fs.begin_download(&filename)?;
        let stats = transfer.stats();
        let mut reporter = report_transfer(stats.clone());

        io::copy(&mut transfer, out)
            .and_then(|_| out.flush())
            .map_err(|e| CliError::io(format!("Download of {} failed", filename), e))?;
        transfer.finish()?;

        finish_transfer(&mut reporter, &stats);
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::session::{open_with_store, SessionConfig};
    use crate::transport::MemoryStore;
    use std::io::Cursor;
    use tempfile::TempDir;

    /// Drive file tạm + chunk store dùng chung giữa các session
    struct Drive {
        _dir: TempDir,
        config: SessionConfig,
        store: MemoryStore,
    }

    impl Drive {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let config = SessionConfig {
                key: String::new(),
                drive: dir.path().join("drive.fsx"),
                webhook: "https://example.com/hook".to_string(),
            };
            Self {
                _dir: dir,
                config,
                store: MemoryStore::new(),
            }
        }

        fn open(&self) -> Session {
            open_with_store(&self.config, Box::new(self.store.clone())).unwrap()
        }
    }

    fn put(session: Session, path: &str, data: &[u8]) -> Session {
        upload(session, path, &mut Cursor::new(data.to_vec()), false).unwrap()
    }

    fn cells(line: &str) -> Vec<&str> {
        line.split(" │ ").map(str::trim).collect()
    }

    fn listing(session: Session, path: &str) -> (Session, String) {
        let mut out = Vec::new();
        let session = ls(session, path, &mut out).unwrap();
        (session, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_ls_rows() {
        let drive = Drive::new();
        let mut session = drive.open();
        session = put(session, "/f", &[7u8; 512]);
        session = put(session, "/d/a", b"a");
        session = put(session, "/d/b", b"b");
        session = put(session, "/d/c", b"c");

        let (_, text) = listing(session, "/");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(cells(lines[0]), vec!["name", "type", "size", "created at"]);
        assert!(lines[1].chars().all(|c| c == '─' || c == '┼'));

        let file_row = cells(lines[2]);
        assert_eq!(&file_row[..3], &["f", "file", "512.00 B"]);
        assert_eq!(file_row[3].len(), "2024-01-01 00:00:00".len());

        assert_eq!(cells(lines[3]), vec!["d", "directory", "3 children", ""]);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_ls_on_file_fails_with_is_file() {
        let drive = Drive::new();
        let session = put(drive.open(), "/f", b"data");

        let mut out = Vec::new();
        let err = ls(session, "/f", &mut out).err().unwrap();

        assert_eq!(err.exit_code(), -2);
        assert!(out.is_empty());
    }

    #[test]
    fn test_missing_paths_fail_with_not_exists() {
        let drive = Drive::new();
        let mut out = Vec::new();

        let err = ls(drive.open(), "/nope", &mut out).err().unwrap();
        assert_eq!(err.exit_code(), -1);

        let err = rm(drive.open(), "/nope").err().unwrap();
        assert_eq!(err.exit_code(), -1);

        let err = cp(drive.open(), "/nope", "/x", &mut out).err().unwrap();
        assert_eq!(err.exit_code(), -1);

        let err = mv(drive.open(), "/nope", "/x").err().unwrap();
        assert_eq!(err.exit_code(), -1);

        // Không có gì được lưu khi precondition fail
        assert!(!drive.config.drive.exists());
    }

    #[test]
    fn test_rm_is_persisted() {
        let drive = Drive::new();
        let session = put(drive.open(), "/docs/old.txt", b"bye");

        rm(session, "docs/./old.txt").unwrap();

        let reopened = drive.open();
        assert!(!reopened.fs.exists("/docs/old.txt"));
        assert!(reopened.fs.exists("/docs"));
    }

    #[test]
    fn test_cp_is_persisted_and_lists_parent() {
        let drive = Drive::new();
        let session = put(drive.open(), "/a.txt", b"abc");

        let mut out = Vec::new();
        cp(session, "/a.txt", "/backup/../b.txt", &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.lines().any(|l| cells(l)[0] == "a.txt"));
        assert!(text.lines().any(|l| cells(l)[0] == "b.txt"));

        let reopened = drive.open();
        assert!(reopened.fs.exists("/a.txt"));
        assert!(reopened.fs.exists("/b.txt"));
    }

    #[test]
    fn test_mv_is_persisted() {
        let drive = Drive::new();
        let mut session = put(drive.open(), "/a.txt", b"abc");
        session = put(session, "/docs/keep", b"k");

        mv(session, "/a.txt", "/docs").unwrap();

        let reopened = drive.open();
        assert!(!reopened.fs.exists("/a.txt"));
        assert!(reopened.fs.exists("/docs/a.txt"));
    }

    #[test]
    fn test_mv_into_own_subtree_fails() {
        let drive = Drive::new();
        let session = put(drive.open(), "/a/b/file", b"x");
        session::save(&session).unwrap();

        let err = mv(session, "/a", "/a/b").err().unwrap();
        assert_eq!(err.exit_code(), 1);

        let reopened = drive.open();
        assert!(reopened.fs.exists("/a/b/file"));
    }

    #[test]
    fn test_bash_completions_list_subcommands() {
        let mut out = Vec::new();
        completions(Shell::Bash, &mut out);

        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("_fsx()"));
        for command in ["ls", "cp", "mv", "rm", "upload", "download"] {
            assert!(script.contains(command), "missing {}", command);
        }
    }

    #[test]
    fn test_mv_and_cp_onto_own_ancestor_fail() {
        let drive = Drive::new();
        let session = put(drive.open(), "/a/sibling.txt", b"s");
        let session = put(session, "/a/a/other.txt", b"o");
        let saved = session.fs.export().unwrap();

        let err = mv(session, "/a/a", "/").err().unwrap();
        assert_eq!(err.exit_code(), 1);

        let mut out = Vec::new();
        let err = cp(drive.open(), "/a/a", "/", &mut out).err().unwrap();
        assert_eq!(err.exit_code(), 1);
        assert!(out.is_empty());

        let reopened = drive.open();
        assert_eq!(reopened.fs.export().unwrap(), saved);
        assert!(reopened.fs.exists("/a/sibling.txt"));
        assert!(reopened.fs.exists("/a/a/other.txt"));
    }

    #[test]
    fn test_upload_then_download() {
        let drive = Drive::new();
        let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        put(drive.open(), "/bin/data", &payload);

        let mut out = Vec::new();
        download(drive.open(), "/bin/data", &mut out).unwrap();

        assert_eq!(out, payload);
    }

    #[test]
    fn test_upload_refuses_interactive_input() {
        let drive = Drive::new();
        let mut input = Cursor::new(Vec::new());

        let err = upload(drive.open(), "/f", &mut input, true).err().unwrap();

        assert!(matches!(err, CliError::Usage(_)));
        assert!(err.to_string().contains("| fsx upload /f"));
        assert!(!drive.config.drive.exists());
    }

    #[test]
    fn test_transfers_reject_directories() {
        let drive = Drive::new();
        let session = put(drive.open(), "/dir/file", b"x");
        let mut out = Vec::new();

        let err = download(session, "/dir", &mut out).err().unwrap();
        assert_eq!(err.exit_code(), -3);

        let mut input = Cursor::new(b"x".to_vec());
        let err = upload(drive.open(), "/dir", &mut input, false).err().unwrap();
        assert_eq!(err.exit_code(), -3);

        let err = download(drive.open(), "/missing", &mut out).err().unwrap();
        assert_eq!(err.exit_code(), -1);
        assert!(out.is_empty());
    }
}
