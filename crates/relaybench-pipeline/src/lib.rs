//! # relaybench-pipeline
//!
//! 수집 파이프라인과 읽기 벤치마크 실행기.
//!
//! - [`counters`]: 수집기와 샘플러가 공유하는 lock-free 카운터
//! - [`source`]: 레코드 소스 구현 (파일, 인메모리)
//! - [`verify`]: 기본 이벤트 검증기
//! - [`ingestor`]: 레코드를 읽어 검증/저장하는 생산자
//! - [`sampler`]: 주기적으로 카운터를 비워 시계열 샘플 발행
//! - [`controller`]: 수집 상태 머신과 종료 프로토콜
//! - [`benchmark`]: count/fetch 짝 측정 벤치마크 실행기

pub mod benchmark;
pub mod controller;
pub mod counters;
pub mod ingestor;
pub mod sampler;
pub mod source;
pub mod verify;
