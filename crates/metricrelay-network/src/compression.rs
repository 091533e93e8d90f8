//! Snappy 압축 어댑터.
//!
//! `Compressor` 포트 구현. remote-write 프로토콜은 snappy 블록 포맷(프레이밍 없음)을 쓴다.

use metricrelay_core::error::CoreError;
use metricrelay_core::ports::compressor::Compressor;

/// Snappy 블록 압축기 — `Compressor` 포트 구현
#[derive(Debug, Default, Clone, Copy)]
pub struct SnappyCompressor;

impl SnappyCompressor {
    pub fn new() -> Self {
        Self
    }
}

impl Compressor for SnappyCompressor {
    fn content_encoding(&self) -> &'static str {
        "snappy"
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CoreError> {
        snap::raw::Encoder::new()
            .compress_vec(data)
            .map_err(|e| CoreError::Encoding(format!("snappy 압축 실패: {e}")))
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CoreError> {
        snap::raw::Decoder::new()
            .decompress_vec(data)
            .map_err(|e| CoreError::Encoding(format!("snappy 해제 실패: {e}")))
    }
}
