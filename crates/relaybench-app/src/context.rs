//! 벤치마크 컨텍스트.
//!
//! 저장소를 소유하고 파이프라인 구성요소를 만들어 주는 명시적 소유자 객체.
//! 수집 전에 기존 DB를 지우고, 종료 시 WAL 체크포인트 후 닫는다.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use relaybench_core::config::AppConfig;
use relaybench_core::ports::store::EventStore;
use relaybench_pipeline::benchmark::BenchmarkRunner;
use relaybench_pipeline::controller::IngestionController;
use relaybench_pipeline::verify::EventIdVerifier;
use relaybench_storage::sqlite::SqliteEventStore;

const DB_FILE_NAME: &str = "relaybench.db";

/// 데이터베이스 경로 결정 (설정값 또는 플랫폼별 기본 경로)
///
/// # 플랫폼별 기본 경로:
/// - macOS: `~/Library/Application Support/dev.relaybench.relaybench/relaybench.db`
/// - Windows: `%APPDATA%\relaybench\relaybench\data\relaybench.db`
/// - Linux: `~/.local/share/relaybench/relaybench.db`
pub fn resolve_db_path(configured: Option<&Path>) -> PathBuf {
    configured
        .map(Path::to_path_buf)
        .or_else(|| {
            ProjectDirs::from("dev", "relaybench", "relaybench")
                .map(|p| p.data_dir().join(DB_FILE_NAME))
        })
        .unwrap_or_else(|| PathBuf::from(DB_FILE_NAME))
}

/// 저장소 소유자
pub struct BenchContext {
    config: AppConfig,
    db_path: PathBuf,
    store: Arc<SqliteEventStore>,
}

impl BenchContext {
    /// 저장소 열기. `reset`이면 기존 DB 파일(-wal, -shm 포함)을 먼저 삭제
    pub fn open(config: AppConfig, reset: bool) -> Result<Self> {
        let db_path = resolve_db_path(config.storage.db_path.as_deref());

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("DB 디렉토리 생성 실패: {}", parent.display()))?;
        }
        if reset {
            SqliteEventStore::remove_files(&db_path)?;
            info!("기존 DB 삭제: {}", db_path.display());
        }

        let store = SqliteEventStore::open(&db_path)
            .with_context(|| format!("DB 열기 실패: {}", db_path.display()))?;
        info!("DB 경로: {}", db_path.display());

        Ok(Self {
            config,
            db_path,
            store: Arc::new(store),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn store(&self) -> Arc<dyn EventStore> {
        self.store.clone()
    }

    /// 수집 컨트롤러 생성 (기본 검증기)
    pub fn ingestion_controller(&self) -> IngestionController {
        IngestionController::new(
            self.store(),
            Arc::new(EventIdVerifier::new()),
            &self.config.ingest,
        )
    }

    /// 읽기 벤치마크 실행기 생성
    pub fn benchmark_runner(&self) -> BenchmarkRunner {
        BenchmarkRunner::new(self.store())
    }

    /// WAL 체크포인트 후 닫기
    pub fn close(self) -> Result<()> {
        self.store.checkpoint()?;
        info!("DB 닫기: {}", self.db_path.display());
        Ok(())
    }
}
