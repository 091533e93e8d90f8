//! 종료 처리.
//!
//! OS 시그널을 스크레이프 루프 종료 신호로 바꾸고, 스케줄러가 멈춘 뒤
//! 엔드포인트 큐에 남은 페이로드를 유예 시간 안에서만 흘려보낸다.

use metricrelay_network::writer::WriterTasks;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// 스케줄러에 전달되는 종료 신호
pub struct ShutdownSignal {
    tx: watch::Sender<bool>,
}

impl ShutdownSignal {
    /// 신호와 첫 수신기. 추가 수신기는 `Receiver::clone`으로 만든다.
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, rx)
    }

    pub fn trigger(&self, reason: &str) {
        info!("종료 신호 발송: {reason}");
        self.tx.send_replace(true);
    }

    /// SIGINT/SIGTERM (그 외 플랫폼은 Ctrl+C) 대기 후 종료 신호 발송.
    ///
    /// 핸들러 등록에 실패해도 신호는 보내서 프로세스가 멈추지 않게 한다.
    pub async fn trigger_on_os_signal(&self) -> std::io::Result<()> {
        match wait_for_os_signal().await {
            Ok(name) => {
                self.trigger(name);
                Ok(())
            }
            Err(e) => {
                self.trigger("시그널 핸들러 등록 실패");
                Err(e)
            }
        }
    }
}

#[cfg(unix)]
async fn wait_for_os_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let name = tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    };
    Ok(name)
}

#[cfg(not(unix))]
async fn wait_for_os_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl+C")
}

/// 라이터 태스크 종료를 최대 `grace`만큼 기다린다. 시간 안에 끝나면 true.
///
/// 모든 `RemoteWriter` 핸들이 drop된 뒤에 호출해야 태스크가 끝날 수 있다.
pub async fn drain(tasks: WriterTasks, grace: Duration) -> bool {
    match tokio::time::timeout(grace, tasks.join()).await {
        Ok(()) => {
            info!("전송 태스크 정리 완료");
            true
        }
        Err(_) => {
            warn!(
                "전송 태스크 종료 대기 {}초 초과, 남은 페이로드 폐기",
                grace.as_secs()
            );
            false
        }
    }
}
