//! 미래 타임스탬프 샘플 집계.
//!
//! 인코더가 배치마다 보내는 소스별 카운트를 누적하고,
//! 고정 주기마다 0이 아닌 소스를 한 줄씩 보고한 뒤 전체를 비운다.

use metricrelay_core::ports::diagnostics::{DiagnosticLevel, Diagnostics};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

/// 소스 식별자 → 미래 샘플 수
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FutureTally {
    counts: HashMap<String, u64>,
}

impl FutureTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// 소스의 카운트를 1 증가
    pub fn record(&mut self, source: &str) {
        *self.counts.entry(source.to_string()).or_insert(0) += 1;
    }

    /// 다른 집계를 더한다
    pub fn merge(&mut self, other: FutureTally) {
        for (source, count) in other.counts {
            *self.counts.entry(source).or_insert(0) += count;
        }
    }

    pub fn get(&self, source: &str) -> u64 {
        self.counts.get(source).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// 소스 이름순으로 비우며 반환
    pub fn drain_sorted(&mut self) -> Vec<(String, u64)> {
        let mut entries: Vec<_> = self.counts.drain().collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

/// 미래 샘플 보고 태스크
pub struct FutureReporter {
    tally: FutureTally,
    period: Duration,
    incoming: mpsc::UnboundedReceiver<FutureTally>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl FutureReporter {
    /// 보고 태스크 시작. 반환된 sender로 배치별 집계를 보낸다.
    pub fn spawn(
        period: Duration,
        diagnostics: Arc<dyn Diagnostics>,
    ) -> (mpsc::UnboundedSender<FutureTally>, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let reporter = Self {
            tally: FutureTally::new(),
            period,
            incoming: rx,
            diagnostics,
        };
        let handle = tokio::spawn(reporter.run());
        (tx, handle)
    }

    async fn run(mut self) {
        // 첫 보고는 시작 후 한 주기 뒤
        let mut ticker = tokio::time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.flush(),
                received = self.incoming.recv() => match received {
                    Some(tally) => self.tally.merge(tally),
                    None => {
                        debug!("미래 샘플 집계 채널 닫힘, 보고 태스크 종료");
                        break;
                    }
                },
            }
        }
    }

    fn flush(&mut self) {
        for (source, count) in self.tally.drain_sorted() {
            if count > 0 {
                self.diagnostics.emit(
                    DiagnosticLevel::Info,
                    &format!("미래 타임스탬프 샘플 {count}개 수신: source={source:?}"),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingDiagnostics;

    fn tally(entries: &[(&str, u64)]) -> FutureTally {
        let mut t = FutureTally::new();
        for (source, count) in entries {
            for _ in 0..*count {
                t.record(source);
            }
        }
        t
    }

    #[test]
    fn merge_accumulates_per_source() {
        let mut total = tally(&[("X", 3)]);
        total.merge(tally(&[("X", 2), ("Y", 1)]));
        assert_eq!(total.get("X"), 5);
        assert_eq!(total.get("Y"), 1);
        assert_eq!(total.get("Z"), 0);
    }

    #[test]
    fn drain_sorted_resets() {
        let mut t = tally(&[("b", 1), ("a", 2)]);
        let drained = t.drain_sorted();
        assert_eq!(drained, vec![("a".to_string(), 2), ("b".to_string(), 1)]);
        assert!(t.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reports_once_per_period_then_resets() {
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let period = Duration::from_secs(600);
        let (tx, handle) = FutureReporter::spawn(period, diagnostics.clone());

        tx.send(tally(&[("X", 3)])).unwrap();
        tx.send(tally(&[("X", 1), ("Y", 2)])).unwrap();

        // 주기 전에는 아무것도 보고하지 않음
        tokio::time::sleep(period / 2).await;
        assert_eq!(diagnostics.count(DiagnosticLevel::Info), 0);

        tokio::time::sleep(period / 2 + Duration::from_millis(10)).await;
        let messages = diagnostics.messages(DiagnosticLevel::Info);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("4개") && messages[0].contains("\"X\""));
        assert!(messages[1].contains("2개") && messages[1].contains("\"Y\""));

        // 다음 주기에는 비워진 상태라 보고 없음
        tokio::time::sleep(period).await;
        assert_eq!(diagnostics.count(DiagnosticLevel::Info), 2);

        drop(tx);
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn empty_period_emits_nothing() {
        let diagnostics = Arc::new(RecordingDiagnostics::default());
        let (tx, handle) = FutureReporter::spawn(Duration::from_secs(10), diagnostics.clone());

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(diagnostics.count(DiagnosticLevel::Info), 0);

        drop(tx);
        handle.await.unwrap();
    }
}
