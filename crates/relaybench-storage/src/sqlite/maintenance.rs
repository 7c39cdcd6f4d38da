//! 저장소 유지보수.
//!
//! 크기 측정(DB + WAL 파일), ANALYZE, VACUUM, WAL 체크포인트.

use relaybench_core::error::CoreError;
use tracing::{debug, info};

use super::SqliteEventStore;

impl SqliteEventStore {
    /// 현재 저장소 크기 (바이트)
    ///
    /// 파일 기반이면 DB 파일과 WAL 파일 크기의 합이며 연결 잠금을 잡지 않는다.
    /// 인메모리면 `page_count * page_size`.
    pub(super) async fn size_bytes(&self) -> Result<u64, CoreError> {
        let Some(path) = self.path.as_deref() else {
            return self.page_bytes();
        };

        let [db, wal, _] = Self::sidecar_paths(path);
        let mut total = 0;
        for file in [db, wal] {
            match tokio::fs::metadata(&file).await {
                Ok(meta) => total += meta.len(),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(CoreError::StoreIo(format!(
                        "파일 크기 측정 실패: {}: {e}",
                        file.display()
                    )))
                }
            }
        }
        Ok(total)
    }

    fn page_bytes(&self) -> Result<u64, CoreError> {
        let conn = self.lock()?;
        let (pages, page_size): (i64, i64) = conn
            .query_row(
                "SELECT page_count, page_size FROM pragma_page_count(), pragma_page_size()",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| CoreError::StoreIo(format!("페이지 수 조회 실패: {e}")))?;
        Ok((pages * page_size) as u64)
    }

    /// 쿼리 플래너 통계 갱신
    pub fn run_analyze(&self) -> Result<(), CoreError> {
        let conn = self.lock()?;
        conn.execute_batch("ANALYZE;")
            .map_err(|e| CoreError::StoreIo(format!("ANALYZE 실패: {e}")))?;
        info!("ANALYZE 완료");
        Ok(())
    }

    /// 빈 페이지 회수
    pub fn run_vacuum(&self) -> Result<(), CoreError> {
        let conn = self.lock()?;
        conn.execute_batch("VACUUM;")
            .map_err(|e| CoreError::StoreIo(format!("VACUUM 실패: {e}")))?;
        info!("VACUUM 완료");
        Ok(())
    }

    /// WAL 내용을 DB 파일로 반영하고 WAL을 비운다 (종료 시)
    pub fn checkpoint(&self) -> Result<(), CoreError> {
        if self.path.is_none() {
            return Ok(());
        }
        let conn = self.lock()?;
        conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
            .map_err(|e| CoreError::StoreIo(format!("WAL 체크포인트 실패: {e}")))?;
        debug!("WAL 체크포인트 완료");
        Ok(())
    }
}
