//! metricrelay 도메인 모델.
//!
//! 파서가 만들고 라이터가 소비하는 시계열 구조체, 스크레이프 대상 정의.

pub mod scrape;
pub mod series;
