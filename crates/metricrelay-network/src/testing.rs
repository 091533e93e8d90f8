//! 테스트용 진단 싱크.

use metricrelay_core::ports::diagnostics::{DiagnosticLevel, Diagnostics};
use std::sync::Mutex;

/// 내보낸 진단을 기록하는 싱크
#[derive(Default)]
pub struct RecordingDiagnostics {
    entries: Mutex<Vec<(DiagnosticLevel, String)>>,
}

impl RecordingDiagnostics {
    pub fn count(&self, level: DiagnosticLevel) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .count()
    }

    pub fn messages(&self, level: DiagnosticLevel) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn emit(&self, level: DiagnosticLevel, message: &str) {
        self.entries
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }
}
