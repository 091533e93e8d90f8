//! 압축 포트.
//!
//! 구현: `metricrelay-network` crate (snap)

use crate::error::CoreError;

/// 페이로드 블록 압축 인터페이스
pub trait Compressor: Send + Sync {
    /// `Content-Encoding` 헤더 값
    fn content_encoding(&self) -> &'static str;

    /// 데이터 압축
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CoreError>;

    /// 데이터 해제
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CoreError>;
}
