use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::TryStreamExt;
use reqwest::{Client, Response};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tokio_util::io::StreamReader;
use tracing::{debug, error, info, warn};

use super::control::TransferControl;
use super::error::DownloadError;
use super::models::{ProgressUpdate, TransferEvent, TransferOutcome, TransferRequest, TransferState};
use super::progress::{percent, speed_kbps};
use crate::config::TransferConfig;
use crate::resolver::MediaResolver;

/// 下载任务向外推送事件与状态的出口
pub struct EventSink {
    events: mpsc::UnboundedSender<TransferEvent>,
    state: watch::Sender<TransferState>,
    outcome: watch::Sender<Option<TransferOutcome>>,
}

/// 与 [`EventSink`] 配对的接收端
pub struct TransferWatch {
    pub events: mpsc::UnboundedReceiver<TransferEvent>,
    pub state: watch::Receiver<TransferState>,
    pub outcome: watch::Receiver<Option<TransferOutcome>>,
}

impl EventSink {
    pub fn channel() -> (EventSink, TransferWatch) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(TransferState::default());
        let (outcome_tx, outcome_rx) = watch::channel(None);
        (
            EventSink {
                events: events_tx,
                state: state_tx,
                outcome: outcome_tx,
            },
            TransferWatch {
                events: events_rx,
                state: state_rx,
                outcome: outcome_rx,
            },
        )
    }

    // 前端可能已经不再接收事件，忽略发送失败
    pub fn emit(&self, event: TransferEvent) {
        let _ = self.events.send(event);
    }

    pub fn update_state(&self, f: impl FnOnce(&mut TransferState)) {
        self.state.send_modify(f);
    }

    /// 先记录结果，再发出终止事件
    pub fn finish(&self, outcome: &TransferOutcome) {
        if *outcome == TransferOutcome::Cancelled {
            self.update_state(|s| s.cancelled = true);
        }
        self.outcome.send_replace(Some(outcome.clone()));
        self.emit(outcome.into());
    }
}

// 数据流结束的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    Finished { downloaded: u64 },
    Cancelled,
}

/// 按固定大小分块把数据写入文件，每块之后推送一次进度
pub async fn stream_to_file<R>(
    reader: &mut R,
    file: &mut File,
    total: u64,
    chunk_size: usize,
    control: &TransferControl,
    sink: &EventSink,
) -> Result<StreamEnd, DownloadError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let started = Instant::now();
    let mut downloaded = 0u64;
    let mut speed = 0.0;

    loop {
        if control.is_cancelled() {
            return Ok(StreamEnd::Cancelled);
        }

        if control.is_paused() {
            debug!("下载已暂停，已下载 {} 字节", downloaded);
            sink.update_state(|s| s.paused = true);
            sink.emit(TransferEvent::Paused);
            if !control.wait_while_paused().await {
                return Ok(StreamEnd::Cancelled);
            }
            sink.update_state(|s| s.paused = false);
            sink.emit(TransferEvent::Resumed);
            debug!("下载已恢复");
        }

        let n = tokio::select! {
            biased;
            _ = control.cancelled() => return Ok(StreamEnd::Cancelled),
            read = reader.read(&mut buf) => read.map_err(DownloadError::Stream)?,
        };
        if n == 0 {
            break;
        }

        file.write_all(&buf[..n]).await?;
        downloaded += n as u64;

        let elapsed = started.elapsed();
        if let Some(kbps) = speed_kbps(downloaded, elapsed) {
            speed = kbps;
        }
        sink.update_state(|s| {
            s.downloaded = downloaded;
            s.elapsed = elapsed;
        });
        sink.emit(TransferEvent::Progress(ProgressUpdate {
            percent: percent(downloaded, total),
            speed_kbps: speed,
            downloaded,
            total,
        }));
    }

    file.flush().await?;
    Ok(StreamEnd::Finished { downloaded })
}

/// 第 n 次重试前的等待时间：base * 2^n
pub fn retry_delay(retry_count: u32, base: Duration) -> Duration {
    base.saturating_mul(2_u32.saturating_pow(retry_count))
}

/// 打开媒体地址的响应，失败时有限次重试。被取消时返回 None
pub async fn open_with_retry(
    client: &Client,
    url: &str,
    config: &TransferConfig,
    control: &TransferControl,
) -> Result<Option<Response>, DownloadError> {
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let result = tokio::select! {
            biased;
            _ = control.cancelled() => return Ok(None),
            res = open_stream(client, url) => res,
        };

        match result {
            Ok(response) => return Ok(Some(response)),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = retry_delay(attempt - 1, config.retry_delay);
                warn!("⚠️ 第 {} 次请求失败: {}，{:?} 后重试", attempt, e, delay);
                tokio::select! {
                    _ = control.cancelled() => return Ok(None),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(e) => return Err(e),
        }
    }
}

async fn open_stream(client: &Client, url: &str) -> Result<Response, DownloadError> {
    debug!("请求媒体地址: {}", url);
    let response = client.get(url).send().await?;
    check_response_status(&response, url)?;
    Ok(response)
}

// 检查响应状态
fn check_response_status(response: &Response, url: &str) -> Result<(), DownloadError> {
    let status = response.status();
    debug!("Response Status: {}", status);

    if status.is_success() {
        Ok(())
    } else {
        warn!("❌ 非成功状态码: {}", status);
        Err(DownloadError::HttpStatus {
            status,
            url: url.to_string(),
        })
    }
}

/// 总大小必须来自 Content-Length
pub fn content_length(response: &Response) -> Result<u64, DownloadError> {
    response
        .headers()
        .get(reqwest::header::CONTENT_LENGTH)
        .and_then(|ct_len| ct_len.to_str().ok())
        .and_then(|ct_len| ct_len.parse().ok())
        .ok_or(DownloadError::SizeUnknown)
}

/// 一次下载所需的全部上下文
pub struct TransferJob {
    pub request: TransferRequest,
    pub resolver: Arc<dyn MediaResolver>,
    pub client: Client,
    pub config: TransferConfig,
    pub control: TransferControl,
    pub sink: EventSink,
}

/// 执行一次完整的下载，所有错误都在这里转换成终止事件
pub async fn run_transfer(job: TransferJob) -> TransferOutcome {
    let outcome = match execute(&job).await {
        Ok(Some(path)) => {
            info!("✅ 下载完成: {}", path.display());
            TransferOutcome::Completed(path)
        }
        Ok(None) => {
            info!("下载已取消: {}", job.request.source_url);
            TransferOutcome::Cancelled
        }
        Err(e) => {
            error!("❌ 下载失败: {}, 错误: {}", job.request.source_url, e);
            TransferOutcome::Failed(e.to_string())
        }
    };

    job.sink.finish(&outcome);
    outcome
}

async fn execute(job: &TransferJob) -> Result<Option<PathBuf>, DownloadError> {
    let TransferJob {
        request,
        resolver,
        client,
        config,
        control,
        sink,
    } = job;

    if control.is_cancelled() {
        return Ok(None);
    }

    info!("开始解析: {}", request.source_url);
    let media = tokio::select! {
        biased;
        _ = control.cancelled() => return Ok(None),
        media = resolver.resolve(&request.source_url) => media?,
    };
    sink.emit(TransferEvent::Resolved {
        title: media.title.clone(),
        suggested_filename: media.suggested_filename.clone(),
    });

    let Some(response) = open_with_retry(client, &media.media_url, config, control).await? else {
        return Ok(None);
    };
    let total = content_length(&response)?;
    debug!("Content Length: {}", total);
    sink.update_state(|s| s.total = total);
    sink.emit(TransferEvent::Started { total });

    tokio::fs::create_dir_all(&request.output_dir).await?;
    let file_name = media.file_name(&config.extension);
    let final_path = request.output_dir.join(&file_name);
    let temp_path = request
        .output_dir
        .join(format!("{}.{}", file_name, config.temp_suffix));

    info!("开始下载: {}", file_name);
    let mut file = File::create(&temp_path).await?;
    let stream = response.bytes_stream().map_err(std::io::Error::other);
    let mut reader = StreamReader::new(Box::pin(stream));

    match stream_to_file(&mut reader, &mut file, total, config.chunk_size, control, sink).await? {
        StreamEnd::Cancelled => {
            drop(file);
            tokio::fs::remove_file(&temp_path).await?;
            debug!("临时文件已删除: {:?}", temp_path);
            Ok(None)
        }
        StreamEnd::Finished { downloaded } => {
            drop(file);
            if downloaded != total {
                warn!("实际大小 {} 与声明大小 {} 不一致", downloaded, total);
            }
            tokio::fs::rename(&temp_path, &final_path).await?;
            Ok(Some(final_path))
        }
    }
}
