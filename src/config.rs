use std::path::PathBuf;
use std::time::Duration;

/// 每次读取的块大小（字节）
pub const DEFAULT_CHUNK_SIZE: usize = 1024;
/// 输出文件的扩展名
pub const DEFAULT_EXTENSION: &str = "mp3";
/// 下载中临时文件的后缀
pub const TEMP_SUFFIX: &str = "part";
/// 最大尝试次数（包含第一次）
pub const MAX_RETRY: u32 = 3;
/// 重试的基础等待时间
pub const RETRY_DELAY: Duration = Duration::from_secs(5);

/// 提取器可执行文件的环境变量
pub const EXTRACTOR_ENV: &str = "YOUTUBE_DL_PATH";
pub const DEFAULT_EXTRACTOR: &str = "youtube-dl";
/// 提取器写出的元数据文件后缀
pub const METADATA_SUFFIX: &str = ".info.json";

// 下载相关配置
#[derive(Debug, Clone)]
pub struct TransferConfig {
    pub chunk_size: usize,
    pub extension: String,
    pub temp_suffix: String,
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            extension: DEFAULT_EXTENSION.to_string(),
            temp_suffix: TEMP_SUFFIX.to_string(),
            max_attempts: MAX_RETRY,
            retry_delay: RETRY_DELAY,
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("trackdl/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

// 外部提取器配置
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// 可执行文件
    pub program: String,
    /// 放在 URL 和模式参数之前的参数，比如 `python -m yt_dlp`
    pub base_args: Vec<String>,
    pub metadata_suffix: String,
    /// 临时工作目录的父目录，默认使用系统临时目录
    pub scratch_root: Option<PathBuf>,
}

impl ExtractorConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            metadata_suffix: METADATA_SUFFIX.to_string(),
            scratch_root: None,
        }
    }

    // 获取提取器路径（支持环境变量）
    pub fn from_env() -> Self {
        let program = std::env::var(EXTRACTOR_ENV).unwrap_or_else(|_| DEFAULT_EXTRACTOR.to_string());
        Self::new(program)
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_EXTRACTOR)
    }
}
