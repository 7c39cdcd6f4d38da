//! 수집기 (생산자).
//!
//! 소스에서 한 줄씩 읽어 파싱 → 검증 → 저장 → 분류 순으로 처리하고
//! 공유 카운터를 갱신한다. 샘플러 종료는 컨트롤러 책임이다.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use relaybench_core::config::InvalidRecordPolicy;
use relaybench_core::error::CoreError;
use relaybench_core::models::event::{Event, RecordKind};
use relaybench_core::ports::source::RecordSource;
use relaybench_core::ports::store::EventStore;
use relaybench_core::ports::verifier::Verifier;

use crate::counters::MetricCounters;

/// 진행 로그 간격 (레코드 수)
const LOG_EVERY_LINES: u64 = 100_000;

/// 수집 결과 요약
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// 처리한 레코드 수 (건너뛴 레코드 포함)
    pub lines: u64,
    /// 읽은 원본 바이트 (개행 제외)
    pub bytes: u64,
    /// 건너뛴 잘못된 레코드 수
    pub rejected: u64,
}

/// 레코드 수집기
pub struct Ingestor {
    store: Arc<dyn EventStore>,
    verifier: Arc<dyn Verifier>,
    counters: Arc<MetricCounters>,
    policy: InvalidRecordPolicy,
}

impl Ingestor {
    pub fn new(
        store: Arc<dyn EventStore>,
        verifier: Arc<dyn Verifier>,
        counters: Arc<MetricCounters>,
    ) -> Self {
        Self {
            store,
            verifier,
            counters,
            policy: InvalidRecordPolicy::default(),
        }
    }

    /// 잘못된 레코드 처리 정책 지정
    pub fn with_policy(mut self, policy: InvalidRecordPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 소스가 끝날 때까지 수집
    ///
    /// 빈 줄은 레코드가 아니므로 건너뛴다. 저장소 에러는 정책과 무관하게 치명적이다.
    pub async fn run(&self, source: &mut dyn RecordSource) -> Result<IngestSummary, CoreError> {
        info!("수집 시작 (잘못된 레코드 정책: {:?})", self.policy);
        let mut summary = IngestSummary::default();

        while let Some(line) = source.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let bytes = line.len() as u64;

            match self.process(&line).await {
                Ok(kind) => self.counters.record_line(kind, bytes),
                Err(e) if e.is_record_error() && self.policy == InvalidRecordPolicy::Skip => {
                    warn!("레코드 건너뜀 (줄 {}): {e}", summary.lines + 1);
                    self.counters.record_rejected(bytes);
                    summary.rejected += 1;
                }
                Err(e) => {
                    error!("수집 중단 (줄 {}): {e}", summary.lines + 1);
                    return Err(e);
                }
            }

            summary.lines += 1;
            summary.bytes += bytes;
            if summary.lines % LOG_EVERY_LINES == 0 {
                debug!("수집 진행: {} 레코드, {} 바이트", summary.lines, summary.bytes);
            }
        }

        info!(
            "수집 완료: {} 레코드, {} 바이트, {} 건너뜀",
            summary.lines, summary.bytes, summary.rejected
        );
        Ok(summary)
    }

    /// 한 레코드 처리 후 분류 반환
    async fn process(&self, line: &str) -> Result<Option<RecordKind>, CoreError> {
        let event = Event::from_json(line)?;
        self.verifier.verify(&event)?;
        self.store.insert(&event).await?;
        Ok(event.record_kind())
    }
}
