//! # metricrelay-network
//!
//! remote-write 전송 어댑터.
//! 시계열을 고정 크기 배치로 모아 protobuf 직렬화 + snappy 압축한 뒤
//! 엔드포인트마다 독립된 큐/전송 태스크로 팬아웃한다.
//! 노출 텍스트를 가져오는 HTTP 스크레이퍼도 포함한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use metricrelay_core::ports::writer::MetricWriter;
//! use metricrelay_network::writer::RemoteWriter;
//!
//! let (writer, tasks) = RemoteWriter::spawn(&urls, &config.writer, diagnostics)?;
//! writer.write(series).await?;
//!
//! // 모든 핸들을 drop하면 인코더 → 엔드포인트/보고 태스크 순으로 종료
//! drop(writer);
//! tasks.join().await;
//! ```

pub mod compression;
pub mod endpoint;
pub mod future_reports;
pub mod remote_write;
pub mod scraper;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;
