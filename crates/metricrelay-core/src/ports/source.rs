//! 샘플 소스 포트.
//!
//! 구현: `metricrelay-network` crate (reqwest)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::scrape::ScrapeTarget;

/// 대상별 원시 노출 텍스트 공급자
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// 대상에서 노출 텍스트를 가져온다
    async fn fetch(&self, target: &ScrapeTarget) -> Result<String, CoreError>;
}
