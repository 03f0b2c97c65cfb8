use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info};

use track_downloader::common::logger::PrettyLogger;
use track_downloader::downloader::{ConsoleReporter, TransferController, TransferOutcome, TransferRequest};
use track_downloader::resolver::YoutubeDlResolver;

mod cli;

/// 单独的线程读取标准输入，避免阻塞运行时退出
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// 命令行没有给出链接时，在终端询问
async fn prompt_url(lines: &mut mpsc::UnboundedReceiver<String>) -> Result<String> {
    print!("请输入音频链接: ");
    std::io::stdout().flush()?;
    match lines.recv().await {
        Some(line) if !line.trim().is_empty() => Ok(line.trim().to_string()),
        _ => Err(anyhow!("未提供链接")),
    }
}

/// 处理下载过程中的键盘指令
async fn handle_commands(mut lines: mpsc::UnboundedReceiver<String>, controller: Arc<TransferController>) {
    while let Some(line) = lines.recv().await {
        match line.trim() {
            "p" | "pause" | "resume" => {
                controller.toggle_pause().await;
            }
            "c" | "cancel" => {
                controller.cancel().await;
                break;
            }
            "" => {}
            other => debug!("未知指令: {}", other),
        }
    }
}

/// 输出最终结果，返回下载是否成功
fn report_outcome(outcome: Option<TransferOutcome>) -> Result<bool> {
    match outcome {
        Some(TransferOutcome::Completed(path)) => {
            PrettyLogger::success("音频下载完成");
            PrettyLogger::file_info("文件", path.display().to_string());
            Ok(true)
        }
        Some(TransferOutcome::Cancelled) => {
            PrettyLogger::warning("下载已取消，临时文件已删除");
            Ok(true)
        }
        Some(TransferOutcome::Failed(message)) => {
            PrettyLogger::error(format!("发生错误: {}", message));
            Ok(false)
        }
        None => Err(anyhow!("下载任务未启动")),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // 解析命令行参数
    let args = cli::Cli::parse();

    // 初始化日志
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut lines = spawn_stdin_reader();
    let url = match &args.url {
        Some(url) => url.clone(),
        None => prompt_url(&mut lines).await?,
    };

    let request = TransferRequest::new(url, args.output_dir.clone())?;
    info!("开始下载音频: {}", request.source_url);
    debug!("保存目录: {:?}", request.output_dir);

    let resolver = Arc::new(YoutubeDlResolver::new(args.extractor_config()));
    let controller = Arc::new(TransferController::new(resolver, args.transfer_config())?);
    let mut events = controller.start(request).await?;
    PrettyLogger::controls_hint();

    // Ctrl-C 时取消下载，等待临时文件清理完成后再退出
    {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                controller.cancel().await;
            }
        });
    }
    tokio::spawn(handle_commands(lines, Arc::clone(&controller)));

    let reporter = ConsoleReporter::new();
    while let Some(event) = events.recv().await {
        reporter.handle(&event);
        if event.is_terminal() {
            break;
        }
    }
    // 进度条在输出结果之前收尾
    drop(reporter);

    if report_outcome(controller.wait().await)? {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
