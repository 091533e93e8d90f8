//! # metricrelay-core
//!
//! metricrelay 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`] — 시계열/스크레이프 대상 구조체 (serde Serialize/Deserialize)
//! - [`ports`] — 포트 인터페이스 (파서, 소스, 라이터, 압축, 진단)
//! - [`error`] — 핵심 에러 타입 (thiserror)
//! - [`config`] — 애플리케이션 설정 구조체
//! - [`config_manager`] — YAML 설정 로드
//! - [`latch`] — 진단 중복 억제용 단발성 래치

pub mod config;
pub mod config_manager;
pub mod error;
pub mod latch;
pub mod models;
pub mod ports;
