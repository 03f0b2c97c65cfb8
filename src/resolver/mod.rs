use async_trait::async_trait;

pub mod error;
pub mod models;
pub mod utils;
pub mod youtube_dl;

pub use error::ResolveError;
pub use models::ResolvedMedia;
pub use youtube_dl::YoutubeDlResolver;

// 把用户给的页面地址解析成可直接下载的媒体地址
// 其他来源（比如测试里的固定地址）可以实现这个trait
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, source_url: &str) -> Result<ResolvedMedia, ResolveError>;
}
