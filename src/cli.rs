use clap::Parser;
use std::path::PathBuf;

use track_downloader::config::{self, ExtractorConfig, TransferConfig};

/// 单曲音频下载器
#[derive(Parser, Debug)]
#[command(name = "trackdl")]
#[command(version)]
#[command(author = "rpeng252@gmail.com")]
#[command(about = "通过页面链接下载单个音频文件", long_about = None)]
pub struct Cli {
    /// 音频页面链接（不提供时会在终端中询问）
    #[arg(value_name = "URL")]
    #[arg(value_hint = clap::ValueHint::Url)]
    pub url: Option<String>,

    /// 保存目录
    #[arg(short = 'o', long, value_name = "DIR")]
    #[arg(default_value = ".")]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub output_dir: PathBuf,

    /// 提取器可执行文件 (默认读取 YOUTUBE_DL_PATH，否则为 youtube-dl)
    #[arg(long, value_name = "PATH")]
    pub extractor: Option<String>,

    /// 传给提取器的额外前置参数，可重复
    #[arg(long = "extractor-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub extractor_args: Vec<String>,

    /// 输出文件扩展名
    #[arg(long, default_value = config::DEFAULT_EXTENSION)]
    pub extension: String,

    /// 每次读取的字节数
    #[arg(long, default_value_t = config::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,

    /// 打开下载连接的最大尝试次数
    #[arg(long, default_value_t = config::MAX_RETRY)]
    pub retries: u32,

    /// 重试基础间隔（秒）
    #[arg(long, value_name = "SECS", default_value_t = config::RETRY_DELAY.as_secs())]
    pub retry_delay: u64,

    /// 输出调试日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn transfer_config(&self) -> TransferConfig {
        TransferConfig {
            chunk_size: self.chunk_size.max(1),
            extension: self.extension.trim_start_matches('.').to_string(),
            max_attempts: self.retries.max(1),
            retry_delay: std::time::Duration::from_secs(self.retry_delay),
            ..TransferConfig::default()
        }
    }

    pub fn extractor_config(&self) -> ExtractorConfig {
        let mut extractor = match &self.extractor {
            Some(program) => ExtractorConfig::new(program.clone()),
            None => ExtractorConfig::from_env(),
        };
        extractor.base_args = self.extractor_args.clone();
        extractor
    }
}
