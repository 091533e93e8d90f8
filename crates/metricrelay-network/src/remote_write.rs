//! Prometheus remote-write 와이어 포맷.
//!
//! 배치를 `WriteRequest`로 변환하고 protobuf 직렬화 + 블록 압축한다.
//! 변환 과정에서 소스별 미래 타임스탬프 샘플 수를 함께 센다.
//!
//! 메시지 정의는 `prometheus/prompb/remote.proto`, `types.proto`의 필드 번호를 따른다.

use bytes::Bytes;
use metricrelay_core::error::CoreError;
use metricrelay_core::models::series::{Label, TimeSeries, NAME_LABEL};
use metricrelay_core::ports::compressor::Compressor;
use prost::Message;

use crate::future_reports::FutureTally;

/// 미래 샘플 집계에 쓰는 소스 식별 레이블
pub const SOURCE_LABEL: &str = "spcu_serial";

/// 소스 레이블이 없을 때의 식별자
pub const UNKNOWN_SOURCE: &str = "UNKNOWN";

/// `Content-Type` 헤더 값
pub const CONTENT_TYPE: &str = "application/x-protobuf";

/// remote-write 프로토콜 버전 헤더
pub const VERSION_HEADER: &str = "X-Prometheus-Remote-Write-Version";

/// remote-write 프로토콜 버전
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// remote-write protobuf 메시지
pub mod prompb {
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct WriteRequest {
        #[prost(message, repeated, tag = "1")]
        pub timeseries: Vec<TimeSeries>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct TimeSeries {
        #[prost(message, repeated, tag = "1")]
        pub labels: Vec<Label>,
        #[prost(message, repeated, tag = "2")]
        pub samples: Vec<Sample>,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Label {
        #[prost(string, tag = "1")]
        pub name: String,
        #[prost(string, tag = "2")]
        pub value: String,
    }

    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Sample {
        #[prost(double, tag = "1")]
        pub value: f64,
        /// 밀리초
        #[prost(int64, tag = "2")]
        pub timestamp: i64,
    }
}

/// 배치를 `WriteRequest`로 변환.
///
/// 각 시계열에 `__name__` 레이블을 덧붙이고, `future_cutoff_ms`보다 늦은
/// 샘플을 소스 식별자별로 센다. 시계열 순서는 유지된다.
pub fn build_write_request(
    batch: Vec<TimeSeries>,
    future_cutoff_ms: i64,
) -> (prompb::WriteRequest, FutureTally) {
    let mut tally = FutureTally::new();

    let timeseries = batch
        .into_iter()
        .map(|mut series| {
            series
                .labels
                .push(Label::new(NAME_LABEL, series.name.as_str()));

            if series.sample.timestamp > future_cutoff_ms {
                tally.record(series.label(SOURCE_LABEL).unwrap_or(UNKNOWN_SOURCE));
            }

            prompb::TimeSeries {
                labels: series
                    .labels
                    .into_iter()
                    .map(|l| prompb::Label {
                        name: l.key,
                        value: l.value,
                    })
                    .collect(),
                samples: vec![prompb::Sample {
                    value: series.sample.value,
                    timestamp: series.sample.timestamp,
                }],
            }
        })
        .collect();

    (prompb::WriteRequest { timeseries }, tally)
}

/// protobuf 직렬화 후 압축
pub fn encode_payload(
    request: &prompb::WriteRequest,
    compressor: &dyn Compressor,
) -> Result<Bytes, CoreError> {
    let mut buf = Vec::with_capacity(request.encoded_len());
    request
        .encode(&mut buf)
        .map_err(|e| CoreError::Encoding(format!("protobuf 직렬화 실패: {e}")))?;
    let compressed = compressor.compress(&buf)?;
    Ok(Bytes::from(compressed))
}

/// 압축 해제 후 protobuf 역직렬화
pub fn decode_payload(
    payload: &[u8],
    compressor: &dyn Compressor,
) -> Result<prompb::WriteRequest, CoreError> {
    let raw = compressor.decompress(payload)?;
    prompb::WriteRequest::decode(raw.as_slice())
        .map_err(|e| CoreError::Encoding(format!("protobuf 역직렬화 실패: {e}")))
}
