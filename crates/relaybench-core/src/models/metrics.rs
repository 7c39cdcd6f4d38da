//! 수집 메트릭 모델.
//!
//! 틱 단위 시계열 샘플과 누적 진행 상태를 표현.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const MIB: f64 = 1024.0 * 1024.0;

/// 시계열의 한 점: 틱 하나의 구간을 정확히 덮는다
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// 샘플 생성 시각
    pub timestamp: DateTime<Utc>,
    /// 수집 시작 이후 경과 시간
    pub offset: Duration,
    /// 구간 내 팔로우 목록 레코드 수
    pub follows: u64,
    /// 구간 내 뮤트 목록 레코드 수
    pub mutes: u64,
    /// 구간 내 신고 레코드 수
    pub reports: u64,
    /// 구간 내 전체 레코드 수 (분류되지 않은 레코드 포함)
    pub lines: u64,
    /// 구간 내 읽은 원본 바이트
    pub bytes: u64,
    /// 직전 틱 대비 저장소 크기 증가량 (바이트)
    pub db_size_delta: u64,
}

impl Sample {
    /// 구간 내 읽은 데이터 (MiB)
    pub fn lines_mb(&self) -> f64 {
        self.bytes as f64 / MIB
    }

    /// 저장소 증가량 (MiB)
    pub fn db_size_delta_mb(&self) -> f64 {
        self.db_size_delta as f64 / MIB
    }
}

/// 누적 진행 상태: 최신 값만 유효
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    /// 처리한 전체 레코드 수
    pub lines_processed: u64,
    /// 읽은 전체 바이트
    pub bytes_imported: u64,
    /// 현재 저장소 크기 (바이트)
    pub total_db_size: u64,
    /// 건너뛴 잘못된 레코드 수 (skip 정책일 때만 증가)
    pub rejected: u64,
}

impl ProgressState {
    /// 읽은 데이터 (MiB, 반올림)
    pub fn mb_imported(&self) -> u64 {
        (self.bytes_imported as f64 / MIB).round() as u64
    }

    /// 저장소 크기 (MiB, 반올림)
    pub fn db_size_mb(&self) -> u64 {
        (self.total_db_size as f64 / MIB).round() as u64
    }

    /// 예상 전체 레코드 수 대비 진행률 (%). 기대값이 0이면 0
    pub fn percent(&self, expected_lines: u64) -> u32 {
        if expected_lines == 0 {
            return 0;
        }
        (100.0 * self.lines_processed as f64 / expected_lines as f64).round() as u32
    }
}
