//! remote-write 엔드포인트.
//!
//! 엔드포인트마다 bounded 큐 하나와 전송 태스크 하나를 둔다.
//! 큐가 가득 차면 새 페이로드를 버리고(newest-dropped), 느린 엔드포인트가
//! 인코더나 다른 엔드포인트를 막지 않는다.
//!
//! - 큐 포화 래치: 인코더 태스크가 소유 (`Endpoint`)
//! - 전송 실패 래치: 전송 태스크가 소유 (`DeliveryWorker`)

use bytes::Bytes;
use metricrelay_core::config::WriterConfig;
use metricrelay_core::error::CoreError;
use metricrelay_core::latch::Latch;
use metricrelay_core::ports::diagnostics::{DiagnosticLevel, Diagnostics};
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::debug;
use url::Url;

use crate::remote_write;

/// 경로 없는 URL에 붙이는 기본 write 경로
pub const DEFAULT_WRITE_PATH: &str = "/api/v1/prom/remote/write";

/// 경로가 없으면 기본 write 경로를 붙이고, 있으면 그대로 사용
pub fn normalize_url(raw: &str) -> Result<String, CoreError> {
    let mut url =
        Url::parse(raw).map_err(|e| CoreError::Config(format!("잘못된 엔드포인트 URL {raw}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CoreError::Config(format!(
            "지원하지 않는 엔드포인트 스킴 {}: {raw}",
            url.scheme()
        )));
    }

    if url.path().is_empty() || url.path() == "/" {
        url.set_path(DEFAULT_WRITE_PATH);
        Ok(url.to_string())
    } else {
        Ok(raw.to_string())
    }
}

/// 큐 투입 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// 큐에 들어감
    Queued,
    /// 큐 포화로 버려짐
    Dropped,
    /// 전송 태스크가 종료됨
    Closed,
}

/// 인코더 쪽 엔드포인트 핸들
pub struct Endpoint {
    url: String,
    queue: mpsc::Sender<Bytes>,
    queue_full: Latch,
    closed: Latch,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Endpoint {
    /// URL 정규화, HTTP 클라이언트 생성 후 전송 태스크 시작
    pub fn spawn(
        raw_url: &str,
        config: &WriterConfig,
        content_encoding: &'static str,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<(Self, JoinHandle<()>), CoreError> {
        let url = normalize_url(raw_url)?;
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let worker = DeliveryWorker::new(
            url.clone(),
            rx,
            config,
            content_encoding,
            diagnostics.clone(),
        )?;
        let handle = tokio::spawn(worker.run());
        debug!(
            "엔드포인트 시작: {url} (큐 용량 {})",
            config.queue_capacity
        );

        Ok((Self::with_queue(url, tx, diagnostics), handle))
    }

    /// 이미 만들어진 큐에 연결된 핸들
    pub fn with_queue(
        url: String,
        queue: mpsc::Sender<Bytes>,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Self {
        Self {
            url,
            queue,
            queue_full: Latch::new(),
            closed: Latch::new(),
            diagnostics,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// 블로킹 없이 큐에 넣는다.
    ///
    /// 포화 시 페이로드를 버리고, 포화 상태로 들어설 때 한 번만 경고한다.
    pub fn offer(&mut self, payload: Bytes) -> EnqueueOutcome {
        match self.queue.try_send(payload) {
            Ok(()) => {
                if self.queue_full.reset() {
                    debug!("엔드포인트 큐 복구: {}", self.url);
                }
                EnqueueOutcome::Queued
            }
            Err(TrySendError::Full(_)) => {
                if self.queue_full.trip() {
                    let overflow = CoreError::QueueOverflow(self.url.clone());
                    self.diagnostics
                        .emit(DiagnosticLevel::Warn, &format!("{overflow}, 새 페이로드 버림"));
                }
                EnqueueOutcome::Dropped
            }
            Err(TrySendError::Closed(_)) => {
                if self.closed.trip() {
                    self.diagnostics.emit(
                        DiagnosticLevel::Error,
                        &format!("엔드포인트 전송 태스크 종료됨: {}", self.url),
                    );
                }
                EnqueueOutcome::Closed
            }
        }
    }
}

/// 엔드포인트 전송 태스크.
///
/// 큐에서 가장 오래된 페이로드부터 꺼내 POST 한다. 재시도 없음 (at-most-once).
pub struct DeliveryWorker {
    url: String,
    client: reqwest::Client,
    queue: mpsc::Receiver<Bytes>,
    content_encoding: &'static str,
    failing: Latch,
    diagnostics: Arc<dyn Diagnostics>,
}

impl DeliveryWorker {
    /// 전송 태스크 전용 HTTP 클라이언트 생성
    pub fn new(
        url: String,
        queue: mpsc::Receiver<Bytes>,
        config: &WriterConfig,
        content_encoding: &'static str,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            url,
            client,
            queue,
            content_encoding,
            failing: Latch::new(),
            diagnostics,
        })
    }

    /// 큐가 닫힐 때까지 전송
    pub async fn run(mut self) {
        while let Some(payload) = self.queue.recv().await {
            match self.deliver(payload).await {
                Ok(()) => {
                    if self.failing.reset() {
                        debug!("엔드포인트 전송 복구: {}", self.url);
                    }
                }
                Err(e) => {
                    if self.failing.trip() {
                        self.diagnostics.emit(
                            DiagnosticLevel::Error,
                            &format!("엔드포인트 전송 실패 {}: {e}", self.url),
                        );
                    }
                }
            }
        }
        debug!("엔드포인트 큐 닫힘, 전송 태스크 종료: {}", self.url);
    }

    /// 페이로드 하나 전송. 응답 본문은 상태 코드와 무관하게 모두 읽고 버린다.
    async fn deliver(&self, payload: Bytes) -> Result<(), CoreError> {
        let resp = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, remote_write::CONTENT_TYPE)
            .header(CONTENT_ENCODING, self.content_encoding)
            .header(remote_write::VERSION_HEADER, remote_write::PROTOCOL_VERSION)
            .body(payload)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("요청 실패: {e}")))?;

        let status = resp.status();
        resp.bytes()
            .await
            .map_err(|e| CoreError::Network(format!("응답 본문 읽기 실패: {e}")))?;

        if !status.is_success() {
            debug!("엔드포인트 응답 {status}: {}", self.url);
        }
        Ok(())
    }
}
