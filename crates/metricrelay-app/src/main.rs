//! # metricrelay-app
//!
//! metricrelay 바이너리 진입점.
//! 설정 로드, 어댑터 조립, 스케줄러와 라이프사이클 관리.

mod lifecycle;
mod scheduler;

use anyhow::{Context, Result};
use clap::Parser;
use metricrelay_core::config_manager::ConfigManager;
use metricrelay_core::ports::diagnostics::{Diagnostics, TracingDiagnostics};
use metricrelay_network::scraper::HttpScraper;
use metricrelay_network::writer::RemoteWriter;
use metricrelay_parser::ExpositionParser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::lifecycle::ShutdownSignal;
use crate::scheduler::{Scheduler, SchedulerConfig};

/// 종료 시 전송 태스크를 기다리는 최대 시간
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Prometheus 노출 포맷 스크레이프 → remote-write 릴레이
#[derive(Parser, Debug)]
#[command(name = "metricrelay")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (YAML)
    #[arg(long, short = 'c', default_value = "metricrelay.yaml")]
    config: PathBuf,

    /// remote-write 엔드포인트 (반복 지정 가능, 설정 파일의 remote_write를 대체)
    #[arg(long = "endpoint", short = 'e')]
    endpoints: Vec<String>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "metricrelay={0},metricrelay_app={0},metricrelay_core={0},metricrelay_parser={0},metricrelay_network={0}",
        args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    info!("metricrelay 시작");

    let config = ConfigManager::load_with_endpoints(&args.config, &args.endpoints)
        .with_context(|| format!("설정 로드 실패: {}", args.config.display()))?;

    let diagnostics: Arc<dyn Diagnostics> = Arc::new(TracingDiagnostics);
    let (writer, writer_tasks) =
        RemoteWriter::spawn(&config.endpoint_urls(), &config.writer, diagnostics)
            .context("remote-write 라이터 시작 실패")?;

    let scraper = HttpScraper::new(config.global.scrape_timeout()?, &config.writer.user_agent)
        .context("스크레이퍼 생성 실패")?;
    let scheduler = Scheduler::new(
        SchedulerConfig::from_app_config(&config)?,
        Arc::new(scraper),
        Arc::new(ExpositionParser::new()),
        Arc::new(writer),
    );

    let (shutdown, shutdown_rx) = ShutdownSignal::new();
    let scheduler_task = tokio::spawn(async move {
        scheduler.run(shutdown_rx).await;
    });

    if let Err(e) = shutdown.trigger_on_os_signal().await {
        error!("시그널 핸들러 등록 실패: {e}");
    }

    // 스케줄러가 끝나면 마지막 라이터 핸들이 drop되고 인코더/전송 태스크가 연쇄 종료
    if let Err(e) = scheduler_task.await {
        error!("스케줄러 태스크 비정상 종료: {e}");
    }
    lifecycle::drain(writer_tasks, SHUTDOWN_GRACE).await;

    info!("metricrelay 종료");
    Ok(())
}
