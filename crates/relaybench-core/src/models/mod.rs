//! relaybench 도메인 모델.
//!
//! 수집 파이프라인, 샘플러, 벤치마크 러너가 공유하는 데이터 구조체를 정의한다.
//! 관측 가능한 값으로 발행되는 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod benchmark;
pub mod event;
pub mod filter;
pub mod metrics;
pub mod state;
