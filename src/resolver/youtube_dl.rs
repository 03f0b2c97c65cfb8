use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use super::MediaResolver;
use super::error::ResolveError;
use super::models::{InfoJson, ResolvedMedia};
use super::utils::find_sidecar;
use crate::config::ExtractorConfig;

/// 基于 youtube-dl（或兼容的 yt-dlp）的解析器
///
/// 每次解析都在独立的临时目录中运行提取器，元数据文件读取后即删除，
/// 临时目录在解析结束时（无论成功与否）一并清理。
pub struct YoutubeDlResolver {
    config: ExtractorConfig,
}

impl YoutubeDlResolver {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    fn command(&self, workdir: &Path) -> Command {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.base_args)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> ResolveError {
        error!("❌ 无法运行提取器 {}，请确认已安装或设置 YOUTUBE_DL_PATH", self.config.program);
        ResolveError::ExtractorSpawn {
            program: self.config.program.clone(),
            source,
        }
    }

    /// 查询提取器给出的文件名（仅用于日志）
    pub async fn query_filename(&self, source_url: &str, workdir: &Path) -> Result<String, ResolveError> {
        let output = self
            .command(workdir)
            .arg("--get-filename")
            .arg(source_url)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(ResolveError::ExtractorProcess {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    /// 让提取器只写出元数据文件，不下载内容
    pub async fn write_metadata(&self, source_url: &str, workdir: &Path) -> Result<(), ResolveError> {
        let output = self
            .command(workdir)
            .arg("--write-info-json")
            .arg("--skip-download")
            .arg(source_url)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!("❌ 提取器执行失败，错误日志如下：\n{}", stderr);
            return Err(ResolveError::ExtractorProcess {
                code: output.status.code(),
                stderr,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl MediaResolver for YoutubeDlResolver {
    async fn resolve(&self, source_url: &str) -> Result<ResolvedMedia, ResolveError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("trackdl-");
        let workdir = match &self.config.scratch_root {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        debug!("提取器工作目录: {:?}", workdir.path());

        // 文件名查询失败不影响后续流程
        let suggested_filename = match self.query_filename(source_url, workdir.path()).await {
            Ok(name) if !name.is_empty() => {
                info!("检测到文件名: {}", name);
                Some(name)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("获取文件名失败，继续解析: {}", e);
                None
            }
        };

        self.write_metadata(source_url, workdir.path()).await?;

        let sidecar = find_sidecar(workdir.path(), &self.config.metadata_suffix).await?;
        let raw = tokio::fs::read(&sidecar).await?;
        tokio::fs::remove_file(&sidecar).await?;
        debug!("元数据文件已读取并删除: {:?}", sidecar);

        let info: InfoJson = serde_json::from_slice(&raw)?;
        let media_url = info
            .url
            .ok_or_else(|| ResolveError::MetadataParse("缺少 url 字段".to_string()))?;
        let title = info
            .fulltitle
            .or(info.title)
            .ok_or_else(|| ResolveError::MetadataParse("缺少 fulltitle 字段".to_string()))?;

        Ok(ResolvedMedia {
            media_url,
            title,
            suggested_filename,
        })
    }
}
