//! 레코드 검증 포트.
//!
//! 구현: `relaybench-pipeline::verify`

use crate::error::CoreError;
use crate::models::event::Event;

/// 파싱된 이벤트의 구조/서명 검증기
///
/// CPU 작업이므로 동기 trait이다.
pub trait Verifier: Send + Sync {
    /// 유효하지 않으면 `CoreError::Verification` 반환
    fn verify(&self, event: &Event) -> Result<(), CoreError>;
}
