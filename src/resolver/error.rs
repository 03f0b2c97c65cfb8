use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("无法启动提取器 {program}: {source}")]
    ExtractorSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("提取器退出异常 (code: {code:?}): {stderr}")]
    ExtractorProcess { code: Option<i32>, stderr: String },

    #[error("未找到元数据文件: {0}")]
    MetadataNotFound(PathBuf),

    #[error("找到多个元数据文件，无法确定使用哪一个: {0:?}")]
    AmbiguousMetadata(Vec<PathBuf>),

    #[error("元数据解析失败: {0}")]
    MetadataParse(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ResolveError {
    fn from(e: serde_json::Error) -> Self {
        Self::MetadataParse(e.to_string())
    }
}
