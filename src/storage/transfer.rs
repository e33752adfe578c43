//! Transfers - upload/download đang chạy với progress có thể quan sát được.
//!
//! `TransferStats` được clone sang progress reporter (thread khác),
//! còn `Upload`/`Download` giữ borrow của `FileSystem` ở foreground.

use super::error::{FsError, Result};
use super::node::{ChunkRef, Node};
use super::FileSystem;
use chrono::Utc;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Counters {
    current: AtomicU64,
    total: AtomicU64,
    finished: AtomicBool,
}

/// Bộ đếm bytes của một transfer, chia sẻ giữa các threads
#[derive(Debug, Clone, Default)]
pub struct TransferStats {
    inner: Arc<Counters>,
}

impl TransferStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes đã xử lý xong (không bao giờ giảm)
    pub fn current_bytes(&self) -> u64 {
        self.inner.current.load(Ordering::Relaxed)
    }

    /// Tổng bytes: biết trước với download, tăng dần với upload
    pub fn total_bytes(&self) -> u64 {
        self.inner.total.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::Acquire)
    }

    /// Tỉ lệ hoàn thành (chưa clamp). Transfer 0 byte tính là xong khi đã finish.
    pub fn fraction(&self) -> f64 {
        let total = self.total_bytes();
        if total == 0 {
            return if self.is_finished() { 1.0 } else { 0.0 };
        }
        self.current_bytes() as f64 / total as f64
    }

    pub(crate) fn add_current(&self, bytes: u64) {
        self.inner.current.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn add_total(&self, bytes: u64) {
        self.inner.total.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn set_total(&self, bytes: u64) {
        self.inner.total.store(bytes, Ordering::Relaxed);
    }

    pub(crate) fn mark_finished(&self) {
        self.inner.finished.store(true, Ordering::Release);
    }
}

fn to_io_error(err: FsError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err)
}

/// Upload đang chạy: ghi bytes vào, chunk đầy được đẩy lên backend ngay
pub struct Upload<'a> {
    fs: &'a mut FileSystem,
    path: Vec<String>,
    buffer: Vec<u8>,
    chunks: Vec<ChunkRef>,
    stats: TransferStats,
}

impl<'a> Upload<'a> {
    pub(super) fn new(fs: &'a mut FileSystem, path: Vec<String>) -> Self {
        Self {
            fs,
            path,
            buffer: Vec::new(),
            chunks: Vec::new(),
            stats: TransferStats::new(),
        }
    }

    /// Handle để theo dõi progress
    pub fn stats(&self) -> TransferStats {
        self.stats.clone()
    }

    fn store_front(&mut self, len: usize) -> Result<()> {
        let rest = self.buffer.split_off(len);
        let data = std::mem::replace(&mut self.buffer, rest);

        let chunk = self.fs.store_chunk(&data)?;
        tracing::debug!("Uploaded chunk {} ({} bytes)", self.chunks.len(), data.len());
        self.chunks.push(chunk);
        self.stats.add_current(data.len() as u64);
        Ok(())
    }

    /// Đẩy phần còn lại, tạo file node trong cây
    pub fn finish(mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            let len = self.buffer.len();
            self.store_front(len)?;
        }

        let name = self.path.last().cloned().unwrap_or_default();
        let node = Node::File {
            name,
            size: self.stats.current_bytes(),
            created_at: Utc::now(),
            chunks: std::mem::take(&mut self.chunks),
        };

        let segments: Vec<&str> = self.path.iter().map(String::as_str).collect();
        if let Some((_, parent)) = segments.split_last() {
            self.fs.make_dirs(parent)?;
        }
        self.fs.insert(&segments, node)?;
        self.stats.mark_finished();
        Ok(())
    }
}

impl Write for Upload<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        self.stats.add_total(buf.len() as u64);

        let chunk_size = self.fs.chunk_size();
        while self.buffer.len() >= chunk_size {
            self.store_front(chunk_size).map_err(to_io_error)?;
        }
        Ok(buf.len())
    }

    // Chunk chưa đầy chỉ được đẩy ở `finish`
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Download đang chạy: đọc bytes ra, từng chunk được tải khi cần
pub struct Download<'a> {
    fs: &'a FileSystem,
    chunks: VecDeque<ChunkRef>,
    pending: Vec<u8>,
    position: usize,
    stats: TransferStats,
}

impl<'a> Download<'a> {
    pub(super) fn new(fs: &'a FileSystem, size: u64, chunks: Vec<ChunkRef>) -> Self {
        let stats = TransferStats::new();
        stats.set_total(size);
        Self {
            fs,
            chunks: chunks.into(),
            pending: Vec::new(),
            position: 0,
            stats,
        }
    }

    /// Handle để theo dõi progress
    pub fn stats(&self) -> TransferStats {
        self.stats.clone()
    }

    /// Kiểm tra đã đọc đủ bytes
    pub fn finish(self) -> Result<()> {
        let (current, total) = (self.stats.current_bytes(), self.stats.total_bytes());
        if current != total || !self.chunks.is_empty() {
            return Err(FsError::Remote(format!(
                "download ended after {} of {} bytes",
                current, total
            )));
        }
        self.stats.mark_finished();
        Ok(())
    }
}

impl Read for Download<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.position >= self.pending.len() {
            let Some(chunk) = self.chunks.pop_front() else {
                return Ok(0);
            };
            self.pending = self.fs.fetch_chunk(&chunk).map_err(to_io_error)?;
            self.position = 0;
        }

        let available = &self.pending[self.position..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.position += n;
        self.stats.add_current(n as u64);
        Ok(n)
    }
}
