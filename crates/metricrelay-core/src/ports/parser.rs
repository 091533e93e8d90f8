//! 노출 포맷 파서 포트.
//!
//! 구현: `metricrelay-parser` crate

use crate::error::ParseError;
use crate::models::series::TimeSeries;

/// 텍스트 → 시계열 변환기 (상태 없음)
pub trait MetricParser: Send + Sync {
    /// 문서 전체를 파싱한다. 에러 시 부분 결과 없음.
    fn parse_text(&self, text: &str) -> Result<Vec<TimeSeries>, ParseError>;
}
