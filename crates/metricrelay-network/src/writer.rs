//! 배치 인코더와 `MetricWriter` 구현.
//!
//! producer → (수신 확인 핸드오프) → 인코더 태스크 → 엔드포인트 큐 → 전송 태스크
//!
//! 인코더는 `batch_size`개가 모일 때마다 한 번 직렬화/압축하고, 같은 페이로드를
//! 모든 엔드포인트 큐에 블로킹 없이 넣는다. 입력 채널이 닫히면 채우던 배치는
//! 버리고 종료하며, 엔드포인트/보고 태스크도 연쇄적으로 종료된다.

use async_trait::async_trait;
use bytes::Bytes;
use metricrelay_core::config::WriterConfig;
use metricrelay_core::error::CoreError;
use metricrelay_core::models::series::TimeSeries;
use metricrelay_core::ports::compressor::Compressor;
use metricrelay_core::ports::diagnostics::{DiagnosticLevel, Diagnostics};
use metricrelay_core::ports::writer::MetricWriter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::compression::SnappyCompressor;
use crate::endpoint::Endpoint;
use crate::future_reports::{FutureReporter, FutureTally};
use crate::remote_write::{build_write_request, encode_payload};

/// 시계열 제출 핸들. 복제해서 여러 producer가 공유한다.
#[derive(Clone)]
pub struct RemoteWriter {
    incoming: mpsc::Sender<Handoff>,
}

/// 인코더에 넘기는 시계열 하나와 수신 확인 채널
struct Handoff {
    series: TimeSeries,
    accepted: oneshot::Sender<()>,
}

/// 라이터가 띄운 백그라운드 태스크 묶음
pub struct WriterTasks {
    handles: Vec<JoinHandle<()>>,
}

impl WriterTasks {
    /// 모든 태스크 종료 대기. 모든 `RemoteWriter`가 drop된 뒤에 끝난다.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!("라이터 태스크 비정상 종료: {e}");
            }
        }
    }
}

impl RemoteWriter {
    /// 엔드포인트별 전송 태스크, 미래 샘플 보고 태스크, 인코더 태스크 시작.
    ///
    /// 잘못된 URL은 에러 진단을 남기고 건너뛴다. 유효한 엔드포인트가 하나도
    /// 없으면 `CoreError::Config`.
    pub fn spawn(
        urls: &[String],
        config: &WriterConfig,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<(Self, WriterTasks), CoreError> {
        config.validate()?;

        let compressor: Arc<dyn Compressor> = Arc::new(SnappyCompressor::new());
        let mut endpoints = Vec::with_capacity(urls.len());
        let mut handles = Vec::with_capacity(urls.len() + 2);

        for url in urls {
            match Endpoint::spawn(
                url,
                config,
                compressor.content_encoding(),
                diagnostics.clone(),
            ) {
                Ok((endpoint, handle)) => {
                    endpoints.push(endpoint);
                    handles.push(handle);
                }
                Err(e) => diagnostics.emit(
                    DiagnosticLevel::Error,
                    &format!("엔드포인트 건너뜀 {url}: {e}"),
                ),
            }
        }

        if endpoints.is_empty() {
            return Err(CoreError::Config(
                "유효한 remote-write 엔드포인트가 없습니다".to_string(),
            ));
        }

        info!(
            "remote-write 시작: 엔드포인트 {}개, 배치 {}개, 큐 용량 {}",
            endpoints.len(),
            config.batch_size,
            config.queue_capacity
        );

        let (futures_tx, reporter) =
            FutureReporter::spawn(config.report_interval(), diagnostics.clone());
        handles.push(reporter);

        let (writer, encoder) =
            Self::spawn_with(endpoints, futures_tx, compressor, config, diagnostics);
        handles.push(encoder);

        Ok((writer, WriterTasks { handles }))
    }

    /// 이미 구성된 엔드포인트로 인코더 태스크만 시작
    pub(crate) fn spawn_with(
        endpoints: Vec<Endpoint>,
        futures: mpsc::UnboundedSender<FutureTally>,
        compressor: Arc<dyn Compressor>,
        config: &WriterConfig,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(1);
        let encoder = BatchEncoder {
            incoming: rx,
            endpoints,
            futures,
            compressor,
            batch_size: config.batch_size,
            flush_interval: config.flush_interval(),
            future_tolerance: config.future_tolerance(),
            diagnostics,
        };
        let handle = tokio::spawn(encoder.run());
        (Self { incoming: tx }, handle)
    }
}

#[async_trait]
impl MetricWriter for RemoteWriter {
    /// 인코더가 시계열을 꺼내 갈 때까지 대기한다
    async fn write(&self, series: TimeSeries) -> Result<(), CoreError> {
        let (accepted, ack) = oneshot::channel();
        self.incoming
            .send(Handoff { series, accepted })
            .await
            .map_err(|_| CoreError::Closed("인코더 태스크가 종료됨".to_string()))?;
        // 채널에 남은 채로 인코더가 종료되면 확인 송신자도 drop된다
        ack.await
            .map_err(|_| CoreError::Closed("인코더 태스크가 종료됨".to_string()))
    }
}

struct BatchEncoder {
    incoming: mpsc::Receiver<Handoff>,
    endpoints: Vec<Endpoint>,
    futures: mpsc::UnboundedSender<FutureTally>,
    compressor: Arc<dyn Compressor>,
    batch_size: usize,
    flush_interval: Option<Duration>,
    future_tolerance: Duration,
    diagnostics: Arc<dyn Diagnostics>,
}

impl BatchEncoder {
    async fn run(mut self) {
        while let Some(batch) = self.fill_batch().await {
            self.dispatch(batch);
        }
        debug!("입력 채널 닫힘, 인코더 종료");
    }

    /// 배치 하나를 채운다. 입력이 닫히면 None (채우던 배치는 버림).
    ///
    /// `flush_interval`이 있으면 첫 시계열 수신 후 그 시간이 지나면 부분 배치를 반환한다.
    async fn fill_batch(&mut self) -> Option<Vec<TimeSeries>> {
        let first = Self::accept(self.incoming.recv().await?);
        let mut batch = Vec::with_capacity(self.batch_size);
        batch.push(first);

        let deadline = self.flush_interval.map(|d| Instant::now() + d);

        while batch.len() < self.batch_size {
            let next = match deadline {
                Some(deadline) => {
                    match tokio::time::timeout_at(deadline, self.incoming.recv()).await {
                        Ok(next) => next,
                        Err(_) => {
                            debug!("플러시 주기 도달, 부분 배치 {}개 전송", batch.len());
                            return Some(batch);
                        }
                    }
                }
                None => self.incoming.recv().await,
            };

            match next {
                Some(handoff) => batch.push(Self::accept(handoff)),
                None => {
                    debug!("미완성 배치 {}개 폐기", batch.len());
                    return None;
                }
            }
        }

        Some(batch)
    }

    /// producer에게 수신을 알리고 시계열을 꺼낸다
    fn accept(handoff: Handoff) -> TimeSeries {
        // producer가 이미 포기했으면 무시
        let _ = handoff.accepted.send(());
        handoff.series
    }

    /// 인코딩 후 모든 엔드포인트에 투입. 인코딩 실패 시 배치만 버린다.
    fn dispatch(&mut self, batch: Vec<TimeSeries>) {
        let count = batch.len();
        let tolerance_ms = i64::try_from(self.future_tolerance.as_millis()).unwrap_or(i64::MAX);
        let cutoff = chrono::Utc::now()
            .timestamp_millis()
            .saturating_add(tolerance_ms);

        let (request, tally) = build_write_request(batch, cutoff);
        let payload: Bytes = match encode_payload(&request, self.compressor.as_ref()) {
            Ok(payload) => payload,
            Err(e) => {
                self.diagnostics.emit(
                    DiagnosticLevel::Error,
                    &format!("배치 {count}개 인코딩 실패, 폐기: {e}"),
                );
                return;
            }
        };

        if !tally.is_empty() && self.futures.send(tally).is_err() {
            debug!("미래 샘플 보고 태스크 종료됨");
        }

        for endpoint in &mut self.endpoints {
            // Bytes clone은 참조 카운트만 증가
            endpoint.offer(payload.clone());
        }
        debug!("배치 {count}개 전송 ({} bytes)", payload.len());
    }
}
