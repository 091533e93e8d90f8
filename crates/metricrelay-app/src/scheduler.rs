//! 스크레이프 스케줄러.
//!
//! (잡, 대상)마다 루프 하나. 주기마다 가져오기 → 파싱 → 레이블 추가 → 라이터 제출.
//! 한 대상의 실패는 그 틱만 건너뛰고 다른 대상에는 영향이 없다.

use metricrelay_core::config::AppConfig;
use metricrelay_core::error::CoreError;
use metricrelay_core::models::scrape::ScrapeTarget;
use metricrelay_core::models::series::Label;
use metricrelay_core::ports::parser::MetricParser;
use metricrelay_core::ports::source::MetricSource;
use metricrelay_core::ports::writer::MetricWriter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// 잡 레이블 키
const JOB_LABEL: &str = "job";

/// 인스턴스 레이블 키
const INSTANCE_LABEL: &str = "instance";

/// 대상 하나와 그 주기
#[derive(Debug, Clone)]
pub struct ScrapeJob {
    pub target: ScrapeTarget,
    pub interval: Duration,
}

/// 스케줄러 설정
#[derive(Debug, Clone, Default)]
pub struct SchedulerConfig {
    pub jobs: Vec<ScrapeJob>,
    /// 모든 시계열 끝에 붙는 레이블
    pub external_labels: Vec<Label>,
}

impl SchedulerConfig {
    /// 앱 설정의 모든 잡/정적 대상을 펼친다
    pub fn from_app_config(config: &AppConfig) -> Result<Self, CoreError> {
        let mut jobs = Vec::new();
        for job in &config.scrape_configs {
            let interval = job.scrape_interval(&config.global)?;
            jobs.extend(
                job.targets()
                    .into_iter()
                    .map(|target| ScrapeJob { target, interval }),
            );
        }

        let external_labels = config
            .global
            .external_labels
            .iter()
            .map(|(k, v)| Label::new(k.as_str(), v.as_str()))
            .collect();

        Ok(Self {
            jobs,
            external_labels,
        })
    }
}

/// 스크레이프 스케줄러
pub struct Scheduler {
    config: SchedulerConfig,
    source: Arc<dyn MetricSource>,
    parser: Arc<dyn MetricParser>,
    writer: Arc<dyn MetricWriter>,
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        source: Arc<dyn MetricSource>,
        parser: Arc<dyn MetricParser>,
        writer: Arc<dyn MetricWriter>,
    ) -> Self {
        Self {
            config,
            source,
            parser,
            writer,
        }
    }

    /// 종료 신호까지 대상별 루프 실행
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!("스케줄러 시작: 대상 {}개", self.config.jobs.len());

        let mut tasks = Vec::with_capacity(self.config.jobs.len());
        for job in &self.config.jobs {
            let target = job.target.clone();
            let every = job.interval;
            let source = self.source.clone();
            let parser = self.parser.clone();
            let writer = self.writer.clone();
            let external_labels = self.config.external_labels.clone();
            let mut shutdown = shutdown_rx.clone();

            tasks.push(tokio::spawn(async move {
                let mut interval = tokio::time::interval(every);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            match scrape_once(
                                &target,
                                source.as_ref(),
                                parser.as_ref(),
                                writer.as_ref(),
                                &external_labels,
                            )
                            .await
                            {
                                Ok(count) => debug!("{} 시계열 {count}개 제출", target.url),
                                Err(CoreError::Closed(e)) => {
                                    warn!("라이터 종료됨, 스크레이프 중단 {}: {e}", target.url);
                                    break;
                                }
                                Err(e) => warn!("스크레이프 건너뜀 {}: {e}", target.url),
                            }
                        }
                        _ = shutdown.changed() => {
                            debug!("스크레이프 루프 종료: {}", target.url);
                            break;
                        }
                    }
                }
            }));
        }

        let _ = shutdown_rx.changed().await;
        info!("스케줄러 종료 신호 수신");

        for task in tasks {
            task.abort();
        }
    }
}

/// 대상 한 번 스크레이프. 제출한 시계열 수 반환.
pub async fn scrape_once(
    target: &ScrapeTarget,
    source: &dyn MetricSource,
    parser: &dyn MetricParser,
    writer: &dyn MetricWriter,
    external_labels: &[Label],
) -> Result<usize, CoreError> {
    let text = source.fetch(target).await?;
    let series = parser.parse_text(&text)?;
    let count = series.len();

    for mut ts in series {
        ts.labels.push(Label::new(JOB_LABEL, target.job.as_str()));
        ts.labels
            .push(Label::new(INSTANCE_LABEL, target.instance.as_str()));
        ts.labels.extend(external_labels.iter().cloned());
        writer.write(ts).await?;
    }

    Ok(count)
}
