//! HTTP 스크레이퍼 — `MetricSource` 포트 구현.

use async_trait::async_trait;
use metricrelay_core::error::CoreError;
use metricrelay_core::models::scrape::ScrapeTarget;
use metricrelay_core::ports::source::MetricSource;
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::debug;

/// 노출 포맷 요청 시 `Accept` 헤더
const ACCEPT_EXPOSITION: &str = "text/plain;version=0.0.4;q=1,*/*;q=0.1";

/// 대상 URL에서 노출 텍스트를 GET 하는 소스
pub struct HttpScraper {
    client: reqwest::Client,
}

impl HttpScraper {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MetricSource for HttpScraper {
    async fn fetch(&self, target: &ScrapeTarget) -> Result<String, CoreError> {
        let scrape_err = |message: String| CoreError::Scrape {
            target: target.url.clone(),
            message,
        };

        let resp = self
            .client
            .get(&target.url)
            .header(ACCEPT, ACCEPT_EXPOSITION)
            .send()
            .await
            .map_err(|e| scrape_err(format!("요청 실패: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(scrape_err(format!("HTTP {status}")));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| scrape_err(format!("본문 읽기 실패: {e}")))?;
        debug!("스크레이프 완료: {} ({} bytes)", target.url, body.len());
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(server: &mockito::Server) -> ScrapeTarget {
        ScrapeTarget::new("node", "http", &server.host_with_port(), "/metrics")
    }

    fn scraper() -> HttpScraper {
        HttpScraper::new(Duration::from_secs(5), "metricrelay").unwrap()
    }

    #[tokio::test]
    async fn fetches_exposition_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/metrics")
            .match_header("user-agent", "metricrelay")
            .match_header("accept", mockito::Matcher::Regex("text/plain".to_string()))
            .with_status(200)
            .with_body("# HELP up\nup 1\n")
            .create_async()
            .await;

        let body = scraper().fetch(&target(&server)).await.unwrap();
        assert_eq!(body, "# HELP up\nup 1\n");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_scrape_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/metrics")
            .with_status(503)
            .create_async()
            .await;

        let t = target(&server);
        match scraper().fetch(&t).await {
            Err(CoreError::Scrape { target, message }) => {
                assert_eq!(target, t.url);
                assert!(message.contains("503"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_target_is_scrape_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let t = ScrapeTarget::new("node", "http", &addr.to_string(), "/metrics");
        assert!(matches!(
            scraper().fetch(&t).await,
            Err(CoreError::Scrape { .. })
        ));
    }
}
