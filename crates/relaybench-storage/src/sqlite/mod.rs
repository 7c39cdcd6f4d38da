//! SQLite 저장소 어댑터.
//!
//! `EventStore` 포트 구현.
//!
//! # 모듈 구조
//! - `events`: 이벤트/태그 저장
//! - `query`: 필터 → SQL 변환, count/raw_query
//! - `maintenance`: 크기 측정, ANALYZE, VACUUM, WAL 체크포인트

mod events;
mod maintenance;
mod query;

use async_trait::async_trait;
use relaybench_core::error::CoreError;
use relaybench_core::models::event::{Event, RawEvent};
use relaybench_core::models::filter::Filter;
use relaybench_core::ports::store::EventStore;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::migration;

/// SQLite 이벤트 저장소: `EventStore` 포트 구현
pub struct SqliteEventStore {
    pub(super) conn: Mutex<Connection>,
    /// DB 파일 경로 (인메모리면 None)
    pub(super) path: Option<PathBuf>,
}

impl SqliteEventStore {
    /// 파일 기반 SQLite 저장소 생성
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        let conn = Connection::open(path)
            .map_err(|e| CoreError::StoreIo(format!("SQLite 열기 실패: {e}")))?;

        // 대량 수집용 PRAGMA 설정
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            PRAGMA foreign_keys=ON;
            PRAGMA cache_size=8000;
            PRAGMA temp_store=MEMORY;
            PRAGMA mmap_size=268435456;
            PRAGMA page_size=4096;
            ",
        )
        .map_err(|e| CoreError::StoreIo(format!("PRAGMA 설정 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::StoreIo(format!("마이그레이션 실패: {e}")))?;

        info!("SQLite 저장소 초기화: {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// 인메모리 SQLite 저장소 생성 (테스트용)
    pub fn open_in_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CoreError::StoreIo(format!("인메모리 SQLite 생성 실패: {e}")))?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| CoreError::StoreIo(format!("PRAGMA 설정 실패: {e}")))?;

        migration::run_migrations(&conn)
            .map_err(|e| CoreError::StoreIo(format!("마이그레이션 실패: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    /// DB 파일과 WAL/SHM 파일 삭제 (새 실행 전 초기화용)
    pub fn remove_files(path: &Path) -> Result<(), CoreError> {
        for candidate in Self::sidecar_paths(path) {
            match std::fs::remove_file(&candidate) {
                Ok(()) => info!("기존 DB 파일 삭제: {}", candidate.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(CoreError::Io(e)),
            }
        }
        Ok(())
    }

    /// DB 파일 경로
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// `db`, `db-wal`, `db-shm` 경로
    pub(super) fn sidecar_paths(path: &Path) -> [PathBuf; 3] {
        let base = path.as_os_str().to_os_string();
        let with_suffix = |suffix: &str| {
            let mut p = base.clone();
            p.push(suffix);
            PathBuf::from(p)
        };
        [path.to_path_buf(), with_suffix("-wal"), with_suffix("-shm")]
    }

    pub(super) fn lock(&self) -> Result<MutexGuard<'_, Connection>, CoreError> {
        self.conn
            .lock()
            .map_err(|e| CoreError::StoreIo(format!("잠금 획득 실패: {e}")))
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    async fn insert(&self, event: &Event) -> Result<(), CoreError> {
        self.insert_event(event).map(|_| ())
    }

    async fn count(&self, filter: &Filter) -> Result<u64, CoreError> {
        self.count_matching(filter)
    }

    async fn raw_query(&self, filter: &Filter) -> Result<Vec<RawEvent>, CoreError> {
        self.query_matching(filter)
    }

    async fn current_size_bytes(&self) -> Result<u64, CoreError> {
        self.size_bytes().await
    }

    async fn analyse(&self) -> Result<(), CoreError> {
        self.run_analyze()
    }

    async fn vacuum(&self) -> Result<(), CoreError> {
        self.run_vacuum()
    }
}
