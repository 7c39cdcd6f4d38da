//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! 저장소/검증기/레코드 소스 구현체가 이 trait들을 구현하며,
//! `relaybench-app`에서 `Arc<dyn T>`로 와이어링한다.
//!
//! I/O가 있는 trait은 `async_trait` 매크로로 object safety를 보장한다.

pub mod source;
pub mod store;
pub mod verifier;
