#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use futures::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use track_downloader::config::TransferConfig;
use track_downloader::resolver::{MediaResolver, ResolveError, ResolvedMedia};

pub const TRACK_SIZE: usize = 10_000_000;
pub const SLOW_SIZE: usize = 256 * 1024;

#[derive(Clone, Default)]
struct ServerState {
    flaky_hits: Arc<AtomicUsize>,
}

/// 本地测试用 HTTP 服务
pub struct TestServer {
    pub addr: SocketAddr,
    pub flaky_hits: Arc<AtomicUsize>,
}

impl TestServer {
    pub async fn start() -> Self {
        let state = ServerState::default();
        let app = Router::new()
            .route("/track.mp3", get(track))
            .route("/chunked.mp3", get(chunked))
            .route("/slow.mp3", get(slow))
            .route("/flaky.mp3", get(flaky))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            flaky_hits: state.flaky_hits,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

// 带 Content-Length 的完整响应
async fn track() -> Vec<u8> {
    payload(TRACK_SIZE)
}

// 分块传输，没有 Content-Length
async fn chunked() -> Response {
    let chunks = futures::stream::iter((0..4).map(|_| Ok::<_, std::io::Error>(Bytes::from(vec![1u8; 4096]))));
    Body::from_stream(chunks).into_response()
}

// 每 1KB 停顿一下，方便测试暂停和取消
async fn slow() -> Response {
    let chunks = futures::stream::iter(0..SLOW_SIZE / 1024).then(|_| async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok::<_, std::io::Error>(Bytes::from(vec![2u8; 1024]))
    });
    (
        [(header::CONTENT_LENGTH, SLOW_SIZE.to_string())],
        Body::from_stream(chunks),
    )
        .into_response()
}

// 前两次返回 503
async fn flaky(State(state): State<ServerState>) -> Response {
    let hit = state.flaky_hits.fetch_add(1, Ordering::SeqCst);
    if hit < 2 {
        StatusCode::SERVICE_UNAVAILABLE.into_response()
    } else {
        payload(2048).into_response()
    }
}

/// 声明 `declared` 字节，只发送 `sent` 字节就断开连接的服务，返回媒体地址
pub async fn truncated_server(declared: usize, sent: usize) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };
        // 读完请求头再回复
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: audio/mpeg\r\nContent-Length: {}\r\n\r\n",
            declared
        );
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.write_all(&payload(sent)).await;
        let _ = socket.flush().await;
        // socket 在这里被丢弃，连接中断
    });
    format!("http://{}/cut.mp3", addr)
}

/// 直接返回固定结果的解析器
pub struct StaticResolver {
    pub media: ResolvedMedia,
}

impl StaticResolver {
    pub fn new(media_url: String, title: &str) -> Arc<Self> {
        Arc::new(Self {
            media: ResolvedMedia {
                media_url,
                title: title.to_string(),
                suggested_filename: None,
            },
        })
    }
}

#[async_trait]
impl MediaResolver for StaticResolver {
    async fn resolve(&self, _source_url: &str) -> Result<ResolvedMedia, ResolveError> {
        Ok(self.media.clone())
    }
}

/// 永远不会返回的解析器
pub struct PendingResolver;

#[async_trait]
impl MediaResolver for PendingResolver {
    async fn resolve(&self, _source_url: &str) -> Result<ResolvedMedia, ResolveError> {
        std::future::pending().await
    }
}

pub fn fast_config() -> TransferConfig {
    TransferConfig {
        retry_delay: Duration::from_millis(10),
        ..TransferConfig::default()
    }
}

pub fn dir_entries(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
