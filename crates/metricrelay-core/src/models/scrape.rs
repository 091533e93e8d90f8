//! 스크레이프 대상 모델.

use serde::{Deserialize, Serialize};

/// 잡의 개별 스크레이프 대상 (`scheme://target/metrics_path`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeTarget {
    /// 잡 이름 (`job` 레이블)
    pub job: String,
    /// `host:port` (`instance` 레이블)
    pub instance: String,
    /// 완성된 스크레이프 URL
    pub url: String,
}

impl ScrapeTarget {
    pub fn new(job: &str, scheme: &str, instance: &str, metrics_path: &str) -> Self {
        Self {
            job: job.to_string(),
            instance: instance.to_string(),
            url: format!("{scheme}://{instance}{metrics_path}"),
        }
    }
}
