//! 설정 파일 로드.
//!
//! YAML 파일을 읽고 `METRICRELAY__` 접두사 환경변수로 덮어쓴 뒤 검증한다.
//! 예: `METRICRELAY__WRITER__BATCH_SIZE=400`
//!
//! `config` crate는 맵 키를 소문자로 바꾸므로 `external_labels` 키는
//! 원본 YAML에서 다시 읽어 대소문자를 복원한다.

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::config::{AppConfig, RemoteWriteConfig};
use crate::error::CoreError;

/// 환경변수 접두사
const ENV_PREFIX: &str = "METRICRELAY";

/// 환경변수 키 구분자
const ENV_SEPARATOR: &str = "__";

/// 설정 로더
pub struct ConfigManager;

impl ConfigManager {
    /// 파일 경로에서 설정 로드 (환경변수 오버라이드 포함)
    pub fn load(path: &Path) -> Result<AppConfig, CoreError> {
        Self::load_with_endpoints(path, &[])
    }

    /// 설정 로드 후 `endpoints`가 비어 있지 않으면 `remote_write`를 대체하고 검증
    pub fn load_with_endpoints(path: &Path, endpoints: &[String]) -> Result<AppConfig, CoreError> {
        if !path.exists() {
            return Err(CoreError::Config(format!(
                "설정 파일을 찾을 수 없습니다: {}",
                path.display()
            )));
        }

        let yaml = std::fs::read_to_string(path)?;
        let mut config: AppConfig = Config::builder()
            .add_source(File::from_str(&yaml, FileFormat::Yaml))
            .add_source(Self::env_source())
            .build()?
            .try_deserialize()?;
        Self::restore_label_case(&mut config, &yaml)?;

        if !endpoints.is_empty() {
            debug!("remote_write를 명령행 엔드포인트 {}개로 대체", endpoints.len());
            config.remote_write = endpoints
                .iter()
                .map(|url| RemoteWriteConfig { url: url.clone() })
                .collect();
        }

        config.validate()?;
        info!(
            "설정 로드 완료: {} (잡 {}개, 엔드포인트 {}개)",
            path.display(),
            config.scrape_configs.len(),
            config.remote_write.len()
        );
        Ok(config)
    }

    /// YAML 문자열에서 설정 로드 (환경변수 미적용)
    pub fn from_yaml_str(yaml: &str) -> Result<AppConfig, CoreError> {
        let mut config: AppConfig = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize()?;
        Self::restore_label_case(&mut config, yaml)?;

        config.validate()?;
        debug!("YAML 설정 파싱 완료");
        Ok(config)
    }

    /// `external_labels` 키를 YAML에 적힌 대소문자로 되돌린다.
    ///
    /// 값은 환경변수 오버라이드가 반영된 쪽을 쓴다. 대소문자만 다른 키가
    /// 둘 이상이면 병합 과정에서 값이 사라지므로 거부한다.
    fn restore_label_case(config: &mut AppConfig, yaml: &str) -> Result<(), CoreError> {
        // 빈 문서는 null
        let raw: Option<RawDocument> = serde_yaml::from_str(yaml)
            .map_err(|e| CoreError::Config(format!("YAML 파싱 실패: {e}")))?;
        let written: Vec<String> = raw
            .and_then(|r| r.global)
            .and_then(|g| g.external_labels)
            .map(|labels| labels.into_keys().collect())
            .unwrap_or_default();

        let labels = std::mem::take(&mut config.global.external_labels);
        for (key, value) in labels {
            let mut matches = written.iter().filter(|w| w.to_lowercase() == key.to_lowercase());
            let restored = match (matches.next(), matches.next()) {
                (Some(original), None) => original.clone(),
                (Some(a), Some(b)) => {
                    return Err(CoreError::Config(format!(
                        "external_labels 키가 대소문자만 다릅니다: {a}, {b}"
                    )))
                }
                // 환경변수로만 추가된 레이블
                (None, _) => key,
            };
            config.global.external_labels.insert(restored, value);
        }
        Ok(())
    }

    fn env_source() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
    }
}

/// 키 대소문자 복원용 최소 YAML 뷰
#[derive(Deserialize)]
struct RawDocument {
    global: Option<RawGlobal>,
}

#[derive(Deserialize)]
struct RawGlobal {
    external_labels: Option<BTreeMap<String, serde_yaml::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    const SAMPLE_YAML: &str = r#"
global:
  scrape_interval: 30s
  external_labels:
    region: eu
scrape_configs:
  - job_name: node
    static_configs:
      - targets: ["localhost:9100", "localhost:9101"]
  - job_name: app
    scheme: https
    metrics_path: /stats
    scrape_interval: 5s
    static_configs:
      - targets: ["app:443"]
remote_write:
  - url: http://m3:7201
  - url: http://backup:9201/custom/write
writer:
  batch_size: 200
"#;

    #[test]
    fn parses_yaml_with_defaults() {
        let config = ConfigManager::from_yaml_str(SAMPLE_YAML).unwrap();

        assert_eq!(config.global.scrape_interval().unwrap(), Duration::from_secs(30));
        assert_eq!(config.global.scrape_timeout().unwrap(), Duration::from_secs(10));
        assert_eq!(
            config.global.external_labels.get("region").map(String::as_str),
            Some("eu")
        );

        assert_eq!(config.scrape_configs.len(), 2);
        let node = &config.scrape_configs[0];
        assert_eq!(node.scheme, "http");
        assert_eq!(node.metrics_path, "/metrics");
        assert_eq!(node.targets().len(), 2);

        let app = &config.scrape_configs[1];
        assert_eq!(app.targets()[0].url, "https://app:443/stats");
        assert_eq!(
            app.scrape_interval(&config.global).unwrap(),
            Duration::from_secs(5)
        );

        assert_eq!(
            config.endpoint_urls(),
            vec![
                "http://m3:7201".to_string(),
                "http://backup:9201/custom/write".to_string()
            ]
        );
        assert_eq!(config.writer.batch_size, 200);
        assert_eq!(config.writer.queue_capacity, 1000);
    }

    #[test]
    fn rejects_config_without_endpoints() {
        let yaml = "scrape_configs: []\n";
        let result = ConfigManager::from_yaml_str(yaml);
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(SAMPLE_YAML.as_bytes()).unwrap();

        let config = ConfigManager::load(file.path()).unwrap();
        assert_eq!(config.scrape_configs.len(), 2);
    }

    #[test]
    fn endpoint_override_replaces_remote_write() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(b"scrape_configs: []\n").unwrap();

        // 파일에 엔드포인트가 없어도 명령행 값이 있으면 통과
        let config = ConfigManager::load_with_endpoints(
            file.path(),
            &["http://override:7201".to_string()],
        )
        .unwrap();
        assert_eq!(config.endpoint_urls(), vec!["http://override:7201".to_string()]);

        assert!(ConfigManager::load(file.path()).is_err());
    }

    #[test]
    fn external_label_keys_keep_their_case() {
        let yaml = r#"
global:
  external_labels:
    Region: EU
    dataCenter: one
    rack: 7
remote_write:
  - url: http://m3:7201
"#;
        let config = ConfigManager::from_yaml_str(yaml).unwrap();
        let labels: Vec<(&str, &str)> = config
            .global
            .external_labels
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        assert_eq!(
            labels,
            vec![("Region", "EU"), ("dataCenter", "one"), ("rack", "7")]
        );

        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        let loaded = ConfigManager::load(file.path()).unwrap();
        assert_eq!(loaded.global.external_labels, config.global.external_labels);
    }

    #[test]
    fn external_label_keys_differing_only_in_case_are_rejected() {
        let yaml = r#"
global:
  external_labels:
    Region: EU
    region: us
remote_write:
  - url: http://m3:7201
"#;
        let result = ConfigManager::from_yaml_str(yaml);
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn unreadable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigManager::load(dir.path());
        assert!(matches!(result, Err(CoreError::Io(_))));
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let result = ConfigManager::load(Path::new("/nonexistent/metricrelay.yaml"));
        assert!(matches!(result, Err(CoreError::Config(_))));
    }
}
