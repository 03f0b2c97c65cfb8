use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::ResolveError;

/// 把标题中的路径分隔符替换成下划线，避免写到别的目录里
pub fn sanitize_title(title: &str) -> String {
    title.replace(['/', '\\'], "_")
}

/// 在目录中查找唯一的元数据文件
pub async fn find_sidecar(dir: &Path, suffix: &str) -> Result<PathBuf, ResolveError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut matches = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        if name.to_string_lossy().ends_with(suffix) {
            matches.push(entry.path());
        }
    }
    matches.sort();
    debug!("元数据文件候选: {:?}", matches);

    match matches.len() {
        0 => Err(ResolveError::MetadataNotFound(dir.to_path_buf())),
        1 => Ok(matches.remove(0)),
        _ => Err(ResolveError::AmbiguousMetadata(matches)),
    }
}
