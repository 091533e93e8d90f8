//! 시계열 라이터 포트.
//!
//! 구현: `metricrelay-network` crate (`RemoteWriter`)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::series::TimeSeries;

/// 시계열 제출 인터페이스.
///
/// 여러 producer에서 동시에 호출할 수 있다. 한 producer가 제출한 순서는 배치 안에서 유지된다.
#[async_trait]
pub trait MetricWriter: Send + Sync {
    /// 시계열 하나 제출. 인코더가 받을 준비가 될 때까지 대기한다.
    async fn write(&self, series: TimeSeries) -> Result<(), CoreError>;
}
