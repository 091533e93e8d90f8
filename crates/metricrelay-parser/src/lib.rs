//! # metricrelay-parser
//!
//! Prometheus 텍스트 노출 포맷 파서.
//! `name value` / `name{k="v", ...} value` 줄을 `TimeSeries`로 변환한다.
//! `MetricParser` 포트 구현.

pub mod exposition;

pub use exposition::ExpositionParser;
