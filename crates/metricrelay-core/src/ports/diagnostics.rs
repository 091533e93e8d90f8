//! 진단 출력 포트.
//!
//! 파이프라인 컴포넌트는 생성 시점에 `Arc<dyn Diagnostics>`를 주입받아
//! 운영자용 진단(큐 포화, 전송 실패, 미래 샘플 보고)을 내보낸다.

use std::fmt;

/// 진단 레벨
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DiagnosticLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticLevel::Debug => "debug",
            DiagnosticLevel::Info => "info",
            DiagnosticLevel::Warn => "warn",
            DiagnosticLevel::Error => "error",
        };
        f.write_str(s)
    }
}

/// 진단 메시지 싱크
pub trait Diagnostics: Send + Sync {
    fn emit(&self, level: DiagnosticLevel, message: &str);
}

/// `tracing`으로 전달하는 기본 구현
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn emit(&self, level: DiagnosticLevel, message: &str) {
        match level {
            DiagnosticLevel::Debug => tracing::debug!(target: "metricrelay::diagnostics", "{message}"),
            DiagnosticLevel::Info => tracing::info!(target: "metricrelay::diagnostics", "{message}"),
            DiagnosticLevel::Warn => tracing::warn!(target: "metricrelay::diagnostics", "{message}"),
            DiagnosticLevel::Error => tracing::error!(target: "metricrelay::diagnostics", "{message}"),
        }
    }
}
