//! 시계열 모델.
//!
//! 하나의 `TimeSeries`는 정확히 하나의 샘플을 가진다.
//! 같은 이름/레이블의 관측이 여러 번이면 인스턴스도 여러 개다.

use serde::{Deserialize, Serialize};

/// 메트릭 이름을 담는 합성 레이블 키
pub const NAME_LABEL: &str = "__name__";

/// 단일 관측값
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Unix epoch 기준 밀리초
    pub timestamp: i64,
    /// 측정값
    pub value: f64,
}

/// 시계열을 한정하는 key/value 쌍.
///
/// 키 중복을 허용한다 (목록 의미, 삽입 순서 유지).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Label {
    pub key: String,
    pub value: String,
}

impl Label {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// 이름 + 레이블 + 샘플 하나
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// 메트릭 이름
    pub name: String,
    /// 레이블 목록 (순서 유지)
    #[serde(default)]
    pub labels: Vec<Label>,
    /// 단일 샘플
    pub sample: Sample,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>, labels: Vec<Label>, sample: Sample) -> Self {
        Self {
            name: name.into(),
            labels,
            sample,
        }
    }

    /// 키에 해당하는 레이블 값. 같은 키가 여러 번 나오면 마지막 값이 이긴다.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .rev()
            .find(|l| l.key == key)
            .map(|l| l.value.as_str())
    }
}
