use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use super::error::DownloadError;

// 一次下载请求，开始后不可修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub source_url: String,
    pub output_dir: PathBuf,
}

impl TransferRequest {
    pub fn new(source_url: impl Into<String>, output_dir: impl Into<PathBuf>) -> Result<Self, DownloadError> {
        let source_url = source_url.into().trim().to_string();
        let parsed = Url::parse(&source_url).map_err(|_| DownloadError::InvalidUrl(source_url.clone()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DownloadError::InvalidUrl(source_url));
        }

        Ok(Self {
            source_url,
            output_dir: output_dir.into(),
        })
    }
}

/// 下载过程中的状态快照
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferState {
    pub downloaded: u64,
    pub total: u64,
    pub elapsed: Duration,
    pub paused: bool,
    pub cancelled: bool,
}

/// 每个数据块之后推送给前端的进度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub percent: u8,
    pub speed_kbps: f64, // KB/s，自开始以来的平均值
    pub downloaded: u64,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransferEvent {
    Resolved {
        title: String,
        suggested_filename: Option<String>,
    },
    Started {
        total: u64,
    },
    Progress(ProgressUpdate),
    Paused,
    Resumed,
    Completed {
        path: PathBuf,
    },
    Cancelled,
    Failed {
        message: String,
    },
}

impl TransferEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransferEvent::Completed { .. } | TransferEvent::Cancelled | TransferEvent::Failed { .. }
        )
    }
}

// 下载任务的最终结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed(PathBuf),
    Cancelled,
    Failed(String),
}

impl From<&TransferOutcome> for TransferEvent {
    fn from(outcome: &TransferOutcome) -> Self {
        match outcome {
            TransferOutcome::Completed(path) => TransferEvent::Completed { path: path.clone() },
            TransferOutcome::Cancelled => TransferEvent::Cancelled,
            TransferOutcome::Failed(message) => TransferEvent::Failed {
                message: message.clone(),
            },
        }
    }
}

// --------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransferStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed(String),
}

impl From<&TransferOutcome> for TransferStatus {
    fn from(outcome: &TransferOutcome) -> Self {
        match outcome {
            TransferOutcome::Completed(_) => TransferStatus::Completed,
            TransferOutcome::Cancelled => TransferStatus::Cancelled,
            TransferOutcome::Failed(message) => TransferStatus::Failed(message.clone()),
        }
    }
}
