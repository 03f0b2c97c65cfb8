use std::sync::Arc;

use reqwest::Client;
use tokio::sync::{Mutex, mpsc, watch};
use tracing::{debug, info, warn};

use super::control::TransferControl;
use super::core::{EventSink, TransferJob, run_transfer};
use super::error::DownloadError;
use super::models::{TransferEvent, TransferOutcome, TransferRequest, TransferState, TransferStatus};
use crate::config::TransferConfig;
use crate::resolver::MediaResolver;

// 当前（或最近一次）下载任务
struct ActiveTransfer {
    control: TransferControl,
    state: watch::Receiver<TransferState>,
    outcome: watch::Receiver<Option<TransferOutcome>>,
}

/// 单任务下载控制器
///
/// 状态：`Idle → Running → {Completed, Cancelled, Failed}`，暂停只是 Running 的子状态。
/// 同一时间最多只有一个任务在运行。
pub struct TransferController {
    resolver: Arc<dyn MediaResolver>,
    client: Client,
    config: TransferConfig,
    active: Mutex<Option<ActiveTransfer>>,
}

impl TransferController {
    pub fn new(resolver: Arc<dyn MediaResolver>, config: TransferConfig) -> Result<Self, DownloadError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self::with_client(resolver, client, config))
    }

    pub fn with_client(resolver: Arc<dyn MediaResolver>, client: Client, config: TransferConfig) -> Self {
        Self {
            resolver,
            client,
            config,
            active: Mutex::new(None),
        }
    }

    /// 启动下载任务，返回事件接收端。任务结束后接收端会关闭
    pub async fn start(
        &self,
        request: TransferRequest,
    ) -> Result<mpsc::UnboundedReceiver<TransferEvent>, DownloadError> {
        let mut active = self.active.lock().await;
        if let Some(current) = active.as_ref() {
            if current.outcome.borrow().is_none() {
                warn!("已有下载任务在进行中，拒绝新的任务: {}", request.source_url);
                return Err(DownloadError::TransferAlreadyRunning);
            }
        }

        let control = TransferControl::new();
        let (sink, watch) = EventSink::channel();
        let job = TransferJob {
            request,
            resolver: Arc::clone(&self.resolver),
            client: self.client.clone(),
            config: self.config.clone(),
            control: control.clone(),
            sink,
        };

        debug!("启动下载任务: {}", job.request.source_url);
        tokio::spawn(run_transfer(job));

        *active = Some(ActiveTransfer {
            control,
            state: watch.state,
            outcome: watch.outcome,
        });
        Ok(watch.events)
    }

    // 只对运行中的任务生效
    async fn running_control(&self) -> Option<TransferControl> {
        let active = self.active.lock().await;
        active
            .as_ref()
            .filter(|a| a.outcome.borrow().is_none())
            .map(|a| a.control.clone())
    }

    pub async fn pause(&self) -> bool {
        match self.running_control().await {
            Some(control) => control.set_paused(true),
            None => false,
        }
    }

    pub async fn resume(&self) -> bool {
        match self.running_control().await {
            Some(control) => control.set_paused(false),
            None => false,
        }
    }

    /// 切换暂停/继续，返回切换后是否处于暂停状态；没有运行中的任务时返回 None
    pub async fn toggle_pause(&self) -> Option<bool> {
        let control = self.running_control().await?;
        let paused = control.toggle_pause();
        info!("{}", if paused { "下载已暂停" } else { "下载继续" });
        Some(paused)
    }

    pub async fn cancel(&self) {
        if let Some(control) = self.running_control().await {
            info!("正在取消下载...");
            control.cancel();
        }
    }

    /// 等待当前任务结束；从未启动过任务时返回 None
    pub async fn wait(&self) -> Option<TransferOutcome> {
        let mut outcome = {
            let active = self.active.lock().await;
            active.as_ref()?.outcome.clone()
        };

        match outcome.wait_for(|o| o.is_some()).await {
            Ok(done) => done.clone(),
            // 发送端在写入结果前就被丢弃，说明任务异常退出
            Err(_) => Some(TransferOutcome::Failed("下载任务异常退出".to_string())),
        }
    }

    pub async fn cancel_and_wait(&self) -> Option<TransferOutcome> {
        self.cancel().await;
        self.wait().await
    }

    pub async fn status(&self) -> TransferStatus {
        let active = self.active.lock().await;
        match active.as_ref() {
            None => TransferStatus::Idle,
            Some(a) => match a.outcome.borrow().as_ref() {
                None => TransferStatus::Running,
                Some(outcome) => TransferStatus::from(outcome),
            },
        }
    }

    pub async fn is_paused(&self) -> bool {
        self.running_control().await.is_some_and(|c| c.is_paused())
    }

    /// 最新的状态快照
    pub async fn snapshot(&self) -> Option<TransferState> {
        let active = self.active.lock().await;
        active.as_ref().map(|a| {
            let mut state = a.state.borrow().clone();
            state.paused = a.control.is_paused();
            state.cancelled = a.control.is_cancelled();
            state
        })
    }
}
