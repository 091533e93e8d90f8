//! 노출 포맷 파서.
//!
//! 문서 단위 all-or-nothing: 첫 번째 잘못된 줄에서 에러를 반환하고 부분 결과는 버린다.
//! 노출 포맷에는 타임스탬프가 없으므로 파싱 시점의 시각(밀리초)을 찍는다.

use metricrelay_core::error::ParseError;
use metricrelay_core::models::series::{Label, Sample, TimeSeries};
use metricrelay_core::ports::parser::MetricParser;
use tracing::{debug, warn};

/// 레이블 항목 구분자
const LABEL_SEPARATOR: &str = ", ";

/// 노출 포맷 파서 — `MetricParser` 포트 구현
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpositionParser;

impl ExpositionParser {
    pub fn new() -> Self {
        Self
    }

    /// 지정한 타임스탬프로 문서 파싱
    pub fn parse_at(&self, text: &str, timestamp: i64) -> Result<Vec<TimeSeries>, ParseError> {
        let mut series = Vec::new();

        for line in text.lines() {
            let trimmed = line.trim();
            // 주석, 빈 줄
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            match parse_line(trimmed, timestamp) {
                Ok(ts) => series.push(ts),
                Err(e) => {
                    warn!("메트릭 줄 파싱 실패: {e}");
                    return Err(e);
                }
            }
        }

        debug!("시계열 {}개 파싱", series.len());
        Ok(series)
    }
}

impl MetricParser for ExpositionParser {
    fn parse_text(&self, text: &str) -> Result<Vec<TimeSeries>, ParseError> {
        self.parse_at(text, chrono::Utc::now().timestamp_millis())
    }
}

/// 주석이 아닌 한 줄 파싱
fn parse_line(line: &str, timestamp: i64) -> Result<TimeSeries, ParseError> {
    if line.matches('{').count() > 1 {
        return Err(ParseError::malformed(line, "여는 중괄호가 두 개 이상"));
    }
    if line.matches('}').count() > 1 {
        return Err(ParseError::malformed(line, "닫는 중괄호가 두 개 이상"));
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 2 {
        return Err(ParseError::malformed(line, "공백으로 구분된 토큰이 두 개 미만"));
    }

    let value = tokens[tokens.len() - 1]
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidValue {
            line: line.to_string(),
        })?;

    let (name, labels) = match line.split_once('{') {
        Some((name, rest)) => (name, parse_labels(line, rest)?),
        None => (tokens[0], Vec::new()),
    };

    if name.is_empty() {
        return Err(ParseError::malformed(line, "메트릭 이름 없음"));
    }

    Ok(TimeSeries::new(name, labels, Sample { timestamp, value }))
}

/// `{` 이후 문자열에서 레이블 목록 파싱
fn parse_labels(line: &str, rest: &str) -> Result<Vec<Label>, ParseError> {
    if rest.is_empty() {
        return Err(ParseError::malformed(line, "중괄호 뒤에 내용 없음"));
    }

    let (section, _) = rest
        .split_once('}')
        .ok_or_else(|| ParseError::malformed(line, "닫는 중괄호 없음"))?;
    if section.is_empty() {
        return Err(ParseError::malformed(line, "레이블 섹션이 비어 있음"));
    }

    section
        .split(LABEL_SEPARATOR)
        .map(|entry| {
            let (key, raw_value) = entry
                .split_once('=')
                .ok_or_else(|| ParseError::malformed(line, "레이블에 '=' 없음"))?;
            Ok(Label::new(key, unquote(raw_value)))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}
