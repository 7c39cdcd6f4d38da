//! 수집 메트릭 카운터.
//!
//! 수집기(생산자)는 `fetch_add`로만 증가시키고, 샘플러는 틱마다
//! `swap(0)`으로 구간 값을 비운다. 드레인 이후에 선형화된 증가는
//! 다음 구간에 속하므로 구간 경계에서 증가가 유실되거나 중복되지 않는다.

use std::sync::atomic::{AtomicU64, Ordering};

use relaybench_core::models::event::RecordKind;

/// 구간 카운터 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    Follows,
    Mutes,
    Reports,
    Lines,
    Bytes,
}

impl Counter {
    /// 레코드 분류에 대응하는 카운터
    pub fn for_kind(kind: RecordKind) -> Self {
        match kind {
            RecordKind::FollowList => Counter::Follows,
            RecordKind::MuteList => Counter::Mutes,
            RecordKind::Report => Counter::Reports,
        }
    }
}

/// 공유 메트릭 카운터
///
/// 구간 카운터(`follows`..`bytes`)는 샘플러가 비우고,
/// 누적 카운터(`*_total`)는 비우지 않는다.
#[derive(Debug, Default)]
pub struct MetricCounters {
    follows: AtomicU64,
    mutes: AtomicU64,
    reports: AtomicU64,
    lines: AtomicU64,
    bytes: AtomicU64,
    lines_total: AtomicU64,
    bytes_total: AtomicU64,
    rejected_total: AtomicU64,
}

impl MetricCounters {
    pub fn new() -> Self {
        Self::default()
    }

    fn cell(&self, counter: Counter) -> &AtomicU64 {
        match counter {
            Counter::Follows => &self.follows,
            Counter::Mutes => &self.mutes,
            Counter::Reports => &self.reports,
            Counter::Lines => &self.lines,
            Counter::Bytes => &self.bytes,
        }
    }

    /// 1 증가
    pub fn increment(&self, counter: Counter) {
        self.add(counter, 1);
    }

    /// n 증가
    pub fn add(&self, counter: Counter, n: u64) {
        self.cell(counter).fetch_add(n, Ordering::Relaxed);
    }

    /// 현재 구간 값을 읽고 0으로 초기화
    pub fn drain(&self, counter: Counter) -> u64 {
        self.cell(counter).swap(0, Ordering::AcqRel)
    }

    /// 처리된 레코드 한 건 기록
    ///
    /// `lines`와 `bytes`는 항상, 분류 카운터는 최대 하나만 증가한다.
    pub fn record_line(&self, kind: Option<RecordKind>, bytes: u64) {
        if let Some(kind) = kind {
            self.increment(Counter::for_kind(kind));
        }
        self.count_line(bytes);
    }

    /// 건너뛴 잘못된 레코드 한 건 기록 (skip 정책)
    pub fn record_rejected(&self, bytes: u64) {
        self.rejected_total.fetch_add(1, Ordering::Relaxed);
        self.count_line(bytes);
    }

    fn count_line(&self, bytes: u64) {
        self.add(Counter::Bytes, bytes);
        self.increment(Counter::Lines);
        self.lines_total.fetch_add(1, Ordering::Relaxed);
        self.bytes_total.fetch_add(bytes, Ordering::Relaxed);
    }

    /// 누적 처리 레코드 수
    pub fn lines_total(&self) -> u64 {
        self.lines_total.load(Ordering::Acquire)
    }

    /// 누적 읽은 바이트
    pub fn bytes_total(&self) -> u64 {
        self.bytes_total.load(Ordering::Acquire)
    }

    /// 누적 건너뛴 레코드 수
    pub fn rejected_total(&self) -> u64 {
        self.rejected_total.load(Ordering::Acquire)
    }
}
