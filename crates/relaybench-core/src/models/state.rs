//! 수집 상태 머신 모델.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 수집 실행 상태
///
/// `NotStarted → Running → Finished` 단방향 전이만 허용된다.
/// 실패한 실행은 `Running`에 머물며 `Finished`에 도달하지 않는다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IngestionState {
    #[default]
    NotStarted,
    Running {
        /// 수집 시작 시각
        started_at: DateTime<Utc>,
    },
    Finished {
        /// 시작부터 수집 완료까지 걸린 시간
        elapsed: Duration,
    },
}

impl IngestionState {
    pub fn is_running(&self) -> bool {
        matches!(self, IngestionState::Running { .. })
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, IngestionState::Finished { .. })
    }

    /// 완료 시 소요 시간 (분, 소수 첫째 자리 반올림)
    pub fn elapsed_minutes(&self) -> Option<f64> {
        match self {
            IngestionState::Finished { elapsed } => {
                Some((10.0 * elapsed.as_secs_f64() / 60.0).round() / 10.0)
            }
            _ => None,
        }
    }

    /// 상태 이름 (로그용)
    pub fn name(&self) -> &'static str {
        match self {
            IngestionState::NotStarted => "not_started",
            IngestionState::Running { .. } => "running",
            IngestionState::Finished { .. } => "finished",
        }
    }
}
