//! 애플리케이션 설정 구조체.
//!
//! Prometheus `scrape_configs` 레이아웃의 잡 정의, remote-write 엔드포인트,
//! 라이터 파라미터를 정의한다. `config` crate를 통해 YAML/환경변수에서 로드.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::CoreError;
use crate::models::scrape::ScrapeTarget;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 전역 스크레이프 설정
    #[serde(default)]
    pub global: GlobalConfig,
    /// 스크레이프 잡 목록
    #[serde(default)]
    pub scrape_configs: Vec<JobConfig>,
    /// remote-write 엔드포인트 목록
    #[serde(default)]
    pub remote_write: Vec<RemoteWriteConfig>,
    /// 배치/큐/전송 파라미터
    #[serde(default)]
    pub writer: WriterConfig,
}

impl AppConfig {
    /// 설정값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        self.global.scrape_interval()?;
        self.global.scrape_timeout()?;
        self.writer.validate()?;

        if self.remote_write.is_empty() {
            return Err(CoreError::Config(
                "remote_write 엔드포인트가 최소 1개 필요합니다".to_string(),
            ));
        }

        for job in &self.scrape_configs {
            if job.job_name.trim().is_empty() {
                return Err(CoreError::Config("job_name이 비어 있습니다".to_string()));
            }
            job.scrape_interval(&self.global)?;
        }

        Ok(())
    }

    /// remote-write URL 목록
    pub fn endpoint_urls(&self) -> Vec<String> {
        self.remote_write.iter().map(|r| r.url.clone()).collect()
    }
}

// ============================================================
// 스크레이프 설정
// ============================================================

/// 전역 스크레이프 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// 기본 스크레이프 주기 (humantime, 예: "15s")
    #[serde(default = "default_scrape_interval")]
    pub scrape_interval: String,
    /// 스크레이프 요청 타임아웃
    #[serde(default = "default_scrape_timeout")]
    pub scrape_timeout: String,
    /// 모든 시계열에 붙는 레이블
    #[serde(default)]
    pub external_labels: BTreeMap<String, String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            scrape_interval: default_scrape_interval(),
            scrape_timeout: default_scrape_timeout(),
            external_labels: BTreeMap::new(),
        }
    }
}

impl GlobalConfig {
    pub fn scrape_interval(&self) -> Result<Duration, CoreError> {
        parse_duration("scrape_interval", &self.scrape_interval)
    }

    pub fn scrape_timeout(&self) -> Result<Duration, CoreError> {
        parse_duration("scrape_timeout", &self.scrape_timeout)
    }
}

fn default_scrape_interval() -> String {
    "15s".to_string()
}

fn default_scrape_timeout() -> String {
    "10s".to_string()
}

/// 정적 대상 묶음
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticConfig {
    #[serde(default)]
    pub targets: Vec<String>,
}

/// 스크레이프 잡
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// 잡 이름 (`job` 레이블)
    pub job_name: String,
    /// 메트릭 경로
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
    /// URL 스킴 (http/https)
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// 잡별 스크레이프 주기 (없으면 global 사용)
    #[serde(default)]
    pub scrape_interval: Option<String>,
    /// 정적 대상 목록
    #[serde(default)]
    pub static_configs: Vec<StaticConfig>,
}

impl JobConfig {
    /// 모든 정적 대상을 스크레이프 대상으로 펼친다
    pub fn targets(&self) -> Vec<ScrapeTarget> {
        self.static_configs
            .iter()
            .flat_map(|sc| sc.targets.iter())
            .map(|t| ScrapeTarget::new(&self.job_name, &self.scheme, t, &self.metrics_path))
            .collect()
    }

    /// 잡에 적용되는 스크레이프 주기
    pub fn scrape_interval(&self, global: &GlobalConfig) -> Result<Duration, CoreError> {
        match &self.scrape_interval {
            Some(s) => parse_duration("scrape_interval", s),
            None => global.scrape_interval(),
        }
    }
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_scheme() -> String {
    "http".to_string()
}

// ============================================================
// remote-write 설정
// ============================================================

/// remote-write 엔드포인트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteWriteConfig {
    pub url: String,
}

/// 라이터 설정 — 배치 크기, 엔드포인트 큐, 전송 타임아웃
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriterConfig {
    /// 배치당 시계열 수
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// 엔드포인트별 큐 용량 (배치 단위)
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// 요청 타임아웃 (초)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// User-Agent 헤더
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// 미래 샘플 판정 허용치 (초)
    #[serde(default = "default_future_tolerance_secs")]
    pub future_tolerance_secs: u64,
    /// 미래 샘플 보고 주기 (초)
    #[serde(default = "default_report_interval_secs")]
    pub report_interval_secs: u64,
    /// 부분 배치 강제 전송 주기 (밀리초, 없으면 배치가 찰 때까지 대기)
    #[serde(default)]
    pub flush_interval_ms: Option<u64>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            queue_capacity: default_queue_capacity(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            future_tolerance_secs: default_future_tolerance_secs(),
            report_interval_secs: default_report_interval_secs(),
            flush_interval_ms: None,
        }
    }
}

impl WriterConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.batch_size == 0 {
            return Err(CoreError::Config("batch_size는 0보다 커야 합니다".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(CoreError::Config(
                "queue_capacity는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.report_interval_secs == 0 {
            return Err(CoreError::Config(
                "report_interval_secs는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.flush_interval_ms == Some(0) {
            return Err(CoreError::Config(
                "flush_interval_ms는 0보다 커야 합니다".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn future_tolerance(&self) -> Duration {
        Duration::from_secs(self.future_tolerance_secs)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }

    pub fn flush_interval(&self) -> Option<Duration> {
        self.flush_interval_ms.map(Duration::from_millis)
    }
}

fn default_batch_size() -> usize {
    800
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "metricrelay".to_string()
}

fn default_future_tolerance_secs() -> u64 {
    60
}

fn default_report_interval_secs() -> u64 {
    600
}

fn parse_duration(field: &str, value: &str) -> Result<Duration, CoreError> {
    humantime::parse_duration(value)
        .map_err(|e| CoreError::Config(format!("{field} 값 '{value}' 해석 실패: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(name: &str, targets: &[&str]) -> JobConfig {
        JobConfig {
            job_name: name.to_string(),
            metrics_path: default_metrics_path(),
            scheme: default_scheme(),
            scrape_interval: None,
            static_configs: vec![StaticConfig {
                targets: targets.iter().map(|t| t.to_string()).collect(),
            }],
        }
    }

    fn valid_config() -> AppConfig {
        AppConfig {
            scrape_configs: vec![job("node", &["localhost:9100"])],
            remote_write: vec![RemoteWriteConfig {
                url: "http://m3:7201".to_string(),
            }],
            ..AppConfig::default()
        }
    }

    #[test]
    fn writer_defaults() {
        let w = WriterConfig::default();
        assert_eq!(w.batch_size, 800);
        assert_eq!(w.queue_capacity, 1000);
        assert_eq!(w.request_timeout(), Duration::from_secs(30));
        assert_eq!(w.future_tolerance(), Duration::from_secs(60));
        assert_eq!(w.report_interval(), Duration::from_secs(600));
        assert!(w.flush_interval().is_none());
    }

    #[test]
    fn job_expands_every_target() {
        let j = job("node", &["a:1", "b:2"]);
        let targets = j.targets();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].url, "http://a:1/metrics");
        assert_eq!(targets[1].instance, "b:2");
        assert!(targets.iter().all(|t| t.job == "node"));
    }

    #[test]
    fn job_interval_falls_back_to_global() {
        let global = GlobalConfig::default();
        let mut j = job("node", &[]);
        assert_eq!(j.scrape_interval(&global).unwrap(), Duration::from_secs(15));
        j.scrape_interval = Some("1m".to_string());
        assert_eq!(j.scrape_interval(&global).unwrap(), Duration::from_secs(60));
    }

    #[test]
    fn validate_accepts_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_endpoints() {
        let mut cfg = valid_config();
        cfg.remote_write.clear();
        assert!(matches!(cfg.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn validate_rejects_zero_batch() {
        let mut cfg = valid_config();
        cfg.writer.batch_size = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_duration() {
        let mut cfg = valid_config();
        cfg.global.scrape_interval = "fast".to_string();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("scrape_interval"));
    }

    #[test]
    fn validate_rejects_blank_job_name() {
        let mut cfg = valid_config();
        cfg.scrape_configs.push(job("  ", &["x:1"]));
        assert!(cfg.validate().is_err());
    }
}
