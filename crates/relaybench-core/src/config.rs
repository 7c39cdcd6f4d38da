//! 애플리케이션 설정 구조체.
//!
//! 입력 파일, 샘플링 주기, 저장소 경로, 벤치마크 파라미터 등
//! 런타임 설정을 정의한다. `config` crate를 통해 파일/환경변수에서 로드.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 수집 파이프라인 설정
    pub ingest: IngestConfig,
    /// 저장소 설정
    pub storage: StorageConfig,
    /// 읽기 벤치마크 설정
    #[serde(default)]
    pub benchmark: BenchmarkConfig,
}

/// 잘못된 레코드 처리 정책
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidRecordPolicy {
    /// 실행 전체 중단
    #[default]
    Abort,
    /// 건너뛰고 rejected 카운터 증가
    Skip,
}

/// 수집 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// 입력 JSONL 파일 경로
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,
    /// 샘플러 틱 주기 (밀리초)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// 수집 완료 후 샘플러 종료 전 대기 시간 (밀리초)
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,
    /// 진행률 계산용 예상 전체 레코드 수
    #[serde(default = "default_expected_lines")]
    pub expected_lines: u64,
    /// 파싱/검증 실패 레코드 처리 정책
    #[serde(default)]
    pub invalid_record_policy: InvalidRecordPolicy,
}

impl IngestConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source_path: default_source_path(),
            tick_interval_ms: default_tick_interval_ms(),
            grace_period_ms: default_grace_period_ms(),
            expected_lines: default_expected_lines(),
            invalid_record_policy: InvalidRecordPolicy::default(),
        }
    }
}

/// 저장소 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite DB 파일 경로 (None이면 플랫폼 기본 경로)
    pub db_path: Option<PathBuf>,
    /// 수집 시작 전 기존 DB 삭제
    #[serde(default = "default_true")]
    pub reset_on_start: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            reset_on_start: true,
        }
    }
}

/// 읽기 벤치마크 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// 기준 사용자 공개키 (hex)
    #[serde(default = "default_pubkey")]
    pub pubkey: String,
    /// ID 조회 벤치마크 대상
    #[serde(default = "default_ids")]
    pub ids: Vec<String>,
    /// 날짜 조건 벤치마크의 하한 (unix seconds)
    #[serde(default = "default_since")]
    pub since: i64,
    /// 결과 제한
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            pubkey: default_pubkey(),
            ids: default_ids(),
            since: default_since(),
            limit: default_limit(),
        }
    }
}

impl AppConfig {
    /// 기본 설정
    pub fn default_config() -> Self {
        Self {
            ingest: IngestConfig::default(),
            storage: StorageConfig::default(),
            benchmark: BenchmarkConfig::default(),
        }
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.ingest.tick_interval_ms == 0 {
            return Err(CoreError::Config(
                "ingest.tick_interval_ms는 0보다 커야 합니다".to_string(),
            ));
        }
        if !is_hex_of_len(&self.benchmark.pubkey, 64) {
            return Err(CoreError::Config(format!(
                "benchmark.pubkey 형식 오류: {}",
                self.benchmark.pubkey
            )));
        }
        if let Some(bad) = self.benchmark.ids.iter().find(|id| !is_hex_of_len(id, 64)) {
            return Err(CoreError::Config(format!("benchmark.ids 형식 오류: {bad}")));
        }
        if self.benchmark.limit == 0 {
            return Err(CoreError::Config(
                "benchmark.limit는 0보다 커야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}

fn is_hex_of_len(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_hexdigit())
}

fn default_true() -> bool {
    true
}
fn default_source_path() -> PathBuf {
    PathBuf::from("assets/wot.jsonl")
}
fn default_tick_interval_ms() -> u64 {
    1_000
}
fn default_grace_period_ms() -> u64 {
    1_000
}
fn default_expected_lines() -> u64 {
    2_158_366
}
fn default_pubkey() -> String {
    "460c25e682fda7832b52d1f22d3d22b3176d972f60dcdc3212ed8c92ef85065c".to_string()
}
fn default_ids() -> Vec<String> {
    vec![
        "0a2a28949c42599506cc48709fb60ac77dcda257b8f9a8ff46abfee76ea0c75f".to_string(),
        "a80548db0e8f519dcb542e9f8f2818d22a7fd7ed7d0b5d366af53a1358510431".to_string(),
    ]
}
fn default_since() -> i64 {
    1_764_553_447 // 2025-12
}
fn default_limit() -> u32 {
    500
}
