use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use super::models::{ProgressUpdate, TransferEvent};

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// 完成百分比，向下取整且不超过 100
pub fn percent(downloaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (downloaded as f64 / total as f64 * 100.0).floor();
    pct.min(100.0) as u8
}

/// 自开始以来的平均速度（KB/s），耗时为 0 时没有意义
pub fn speed_kbps(downloaded: u64, elapsed: Duration) -> Option<f64> {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        Some(downloaded as f64 / secs / KIB)
    } else {
        None
    }
}

/// 超过 1024 KB/s 时切换到 MB/s
pub fn format_speed(kbps: f64) -> String {
    if kbps > KIB {
        format!("{:.2} MB/s", kbps / KIB)
    } else {
        format!("{:.2} KB/s", kbps)
    }
}

pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / MIB)
}

// 终端进度显示
pub struct ConsoleReporter {
    pb: ProgressBar,
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleReporter {
    pub fn new() -> Self {
        let pb = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
        pb.set_style(style);
        Self { pb }
    }

    pub fn handle(&self, event: &TransferEvent) {
        match event {
            TransferEvent::Resolved { title, .. } => {
                self.pb.println(format!("标题: << {} >>", title));
            }
            TransferEvent::Started { total } => {
                self.pb.set_message(status_line(&ProgressUpdate {
                    percent: 0,
                    speed_kbps: 0.0,
                    downloaded: 0,
                    total: *total,
                }));
            }
            TransferEvent::Progress(update) => {
                self.pb.set_position(update.percent as u64);
                self.pb.set_message(status_line(update));
            }
            TransferEvent::Paused => self.pb.set_message("已暂停，输入 p 继续"),
            TransferEvent::Resumed => self.pb.println("继续下载"),
            TransferEvent::Completed { .. } => self.pb.finish_with_message("下载完成"),
            TransferEvent::Cancelled => self.pb.abandon_with_message("已取消"),
            TransferEvent::Failed { .. } => self.pb.abandon_with_message("下载失败"),
        }
    }
}

/// 速度、已下载大小和总大小
pub fn status_line(update: &ProgressUpdate) -> String {
    format!(
        "速度: {} | 大小: {} | 总大小: {}",
        format_speed(update.speed_kbps),
        format_megabytes(update.downloaded),
        format_megabytes(update.total)
    )
}
