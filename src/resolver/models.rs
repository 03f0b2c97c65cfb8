use serde::Deserialize;

use super::utils::sanitize_title;

// 解析完成的媒体信息，每次下载只产生一次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub media_url: String,                  // 可直接下载的音频地址
    pub title: String,                      // 原始标题
    pub suggested_filename: Option<String>, // 提取器建议的文件名，仅用于日志
}

impl ResolvedMedia {
    /// 最终文件名：清理后的标题加扩展名
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", sanitize_title(&self.title), extension)
    }
}

// 元数据文件（*.info.json）中我们关心的字段
#[derive(Debug, Default, Clone, Deserialize)]
pub struct InfoJson {
    pub url: Option<String>,
    pub fulltitle: Option<String>,
    pub title: Option<String>,
}
