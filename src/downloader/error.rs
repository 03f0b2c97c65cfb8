use thiserror::Error;

use crate::resolver::ResolveError;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("解析失败: {0}")]
    Resolve(#[from] ResolveError),

    #[error("无效的URL: {0}")]
    InvalidUrl(String),

    #[error("响应缺少 Content-Length，无法获取文件大小")]
    SizeUnknown,

    #[error("HTTP错误: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP 请求失败，状态码: {status}，URL: {url}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("数据流读取失败: {0}")]
    Stream(#[source] std::io::Error),

    #[error("文件操作失败: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("已有下载任务在进行中")]
    TransferAlreadyRunning,
}

impl DownloadError {
    // 只有连接层面的错误和 5xx 值得重试
    pub fn is_retryable(&self) -> bool {
        match self {
            DownloadError::Network(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            DownloadError::HttpStatus { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}
