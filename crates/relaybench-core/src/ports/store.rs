//! 이벤트 저장소 포트.
//!
//! 구현: `relaybench-storage` crate (rusqlite)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::event::{Event, RawEvent};
use crate::models::filter::Filter;

/// 벤치마크 대상 이벤트 저장소
///
/// 수집 중에는 단일 writer(수집기)만 `insert`를 호출한다.
/// 모든 실패는 `CoreError::StoreIo`로 보고하며 재시도하지 않는다.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// 이벤트 저장
    async fn insert(&self, event: &Event) -> Result<(), CoreError>;

    /// 필터에 일치하는 이벤트 수 (limit 적용)
    async fn count(&self, filter: &Filter) -> Result<u64, CoreError>;

    /// 필터에 일치하는 원본 이벤트 (최신순, limit 적용)
    async fn raw_query(&self, filter: &Filter) -> Result<Vec<RawEvent>, CoreError>;

    /// 현재 저장소 크기 (바이트)
    async fn current_size_bytes(&self) -> Result<u64, CoreError>;

    /// 통계 갱신 (쿼리 플래너용)
    async fn analyse(&self) -> Result<(), CoreError>;

    /// 공간 회수
    async fn vacuum(&self) -> Result<(), CoreError>;
}
