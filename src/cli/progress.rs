//! Progress reporter - vẽ một dòng progress trên stderr trong khi transfer chạy.
//!
//! Reporter chạy trên thread riêng, mỗi `interval` gọi `poll` một lần.
//! `stop()` đóng channel để báo dừng rồi join thread, nên sau khi
//! `stop()` trả về sẽ không còn tick nào nữa.

use crate::storage::TransferStats;
use anyhow::Result;
use std::io::{self, Write};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::table::readable_file_size;

/// Khoảng thời gian giữa hai lần vẽ progress
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(1000);

/// Độ rộng của thanh progress (không tính ngoặc)
const BAR_WIDTH: usize = 20;

/// Xoá dòng hiện tại (ANSI EL2)
const CLEAR_LINE: &str = "\x1b[2K";

/// Background task lặp lại cho đến khi bị `stop()`
pub struct ProgressReporter {
    cancel: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl ProgressReporter {
    /// Bắt đầu gọi `poll` sau mỗi `interval`. Tick đầu tiên chạy sau một `interval`.
    ///
    /// Lỗi từ `poll` chỉ được log, vòng lặp vẫn tiếp tục.
    pub fn start<F>(mut poll: F, interval: Duration) -> Self
    where
        F: FnMut() -> Result<()> + Send + 'static,
    {
        let (cancel, cancelled) = mpsc::channel::<()>();

        let spawned = thread::Builder::new()
            .name("fsx-progress".to_string())
            .spawn(move || loop {
                match cancelled.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        if let Err(e) = poll() {
                            tracing::debug!("Progress tick failed: {:#}", e);
                        }
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            });

        let worker = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!("Cannot start progress reporter: {}", e);
                None
            }
        };

        Self {
            cancel: Some(cancel),
            worker,
        }
    }

    /// Dừng reporter. Gọi nhiều lần không sao.
    pub fn stop(&mut self) {
        drop(self.cancel.take());

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::debug!("Progress reporter thread panicked");
            }
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Dựng dòng progress: xoá dòng, về cột 0, label, phần trăm và thanh `[===---]`.
///
/// `fraction` âm nghĩa là chưa biết tổng, chỉ vẽ label.
pub fn progress_line(label: &str, fraction: f64) -> String {
    let mut components: Vec<String> = Vec::new();

    if !label.is_empty() {
        components.push(label.to_string());
    }

    if fraction >= 0.0 {
        let percent = (fraction * 100.0).round().clamp(0.0, 100.0) as u32;
        let filled = (fraction * BAR_WIDTH as f64)
            .round()
            .clamp(0.0, BAR_WIDTH as f64) as usize;

        components.push(format!("{:>3}%", percent));
        components.push(format!(
            "[{}{}]",
            "=".repeat(filled),
            "-".repeat(BAR_WIDTH - filled)
        ));
    }

    format!("{}\r{}", CLEAR_LINE, components.join(" "))
}

/// Label dạng `  1.00 KB /   2.00 KB`
pub fn transfer_label(stats: &TransferStats) -> String {
    format!(
        "{:>9} / {:>9}",
        readable_file_size(stats.current_bytes()),
        readable_file_size(stats.total_bytes())
    )
}

/// Vẽ trạng thái hiện tại của transfer
pub fn render_transfer(out: &mut dyn Write, stats: &TransferStats) -> io::Result<()> {
    out.write_all(progress_line(&transfer_label(stats), stats.fraction()).as_bytes())?;
    out.flush()
}

/// Reporter cho một transfer, vẽ lên stderr
pub fn report_transfer(stats: TransferStats) -> ProgressReporter {
    ProgressReporter::start(
        move || {
            render_transfer(&mut io::stderr().lock(), &stats)?;
            Ok(())
        },
        PROGRESS_INTERVAL,
    )
}

/// Dừng reporter sau khi transfer xong, vẽ dòng cuối cùng và xuống dòng
pub fn finish_transfer(reporter: &mut ProgressReporter, stats: &TransferStats) {
    reporter.stop();

    let mut stderr = io::stderr().lock();
    let result = render_transfer(&mut stderr, stats).and_then(|_| writeln!(stderr));
    if let Err(e) = result {
        tracing::debug!("Cannot render final progress: {}", e);
    }
}
