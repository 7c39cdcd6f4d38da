//! # relaybench-storage
//!
//! 벤치마크 대상 저장소 어댑터.
//! SQLite 기반 이벤트 저장, 태그 인덱스, 필터 조회,
//! 스키마 마이그레이션과 ANALYZE/VACUUM 유지보수를 제공한다.
//!
//! ## 모듈
//! - `sqlite`: 이벤트 저장소 (EventStore 구현)
//! - `migration`: 스키마 마이그레이션

pub mod migration;
pub mod sqlite;
