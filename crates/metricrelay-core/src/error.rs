//! metricrelay 핵심 에러 타입.
//!
//! 어댑터 crate는 `CoreError`를 그대로 반환하고, 바이너리는 `anyhow`로 감싼다.

use thiserror::Error;

/// 노출 포맷 파싱 에러.
///
/// 문서 단위로 치명적이다. 첫 번째 에러에서 전체 파싱을 중단하고 부분 결과는 반환하지 않는다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// 줄 구조가 문법에 맞지 않음
    #[error("잘못된 메트릭 줄 ({reason}): {line}")]
    MalformedLine {
        /// 문제가 된 줄
        line: String,
        /// 실패 사유
        reason: &'static str,
    },

    /// 값 토큰을 f64로 변환할 수 없음
    #[error("메트릭 값 변환 실패: {line}")]
    InvalidValue {
        /// 문제가 된 줄
        line: String,
    },
}

impl ParseError {
    /// `MalformedLine` 생성 헬퍼
    pub fn malformed(line: &str, reason: &'static str) -> Self {
        Self::MalformedLine {
            line: line.to_string(),
            reason,
        }
    }
}

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 노출 포맷 파싱 실패
    #[error("파싱 에러: {0}")]
    Parse(#[from] ParseError),

    /// 스크레이프 실패 (잡 단위로 격리됨)
    #[error("스크레이프 실패 — {target}: {message}")]
    Scrape {
        /// 스크레이프 대상 URL
        target: String,
        /// 실패 사유
        message: String,
    },

    /// 배치 직렬화/압축 실패 (배치만 버려짐)
    #[error("인코딩 에러: {0}")]
    Encoding(String),

    /// 엔드포인트 큐 포화로 페이로드 버려짐
    #[error("큐 포화: {0}")]
    QueueOverflow(String),

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 파이프라인 태스크가 이미 종료됨
    #[error("채널 닫힘: {0}")]
    Closed(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for CoreError {
    fn from(e: config::ConfigError) -> Self {
        CoreError::Config(e.to_string())
    }
}
