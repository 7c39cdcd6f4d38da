//! 레코드 소스 포트.
//!
//! 구현: `relaybench-pipeline::source` (파일, 인메모리)

use async_trait::async_trait;

use crate::error::CoreError;

/// 한 줄이 레코드 하나인 유한 순차 소스
#[async_trait]
pub trait RecordSource: Send {
    /// 다음 줄 (개행 제외). 소스가 끝나면 `Ok(None)`
    async fn next_line(&mut self) -> Result<Option<String>, CoreError>;
}
