//! 이벤트 저장.
//!
//! 이벤트 행과 단일 문자 태그 행을 한 트랜잭션으로 저장한다.
//! 같은 ID의 이벤트는 무시된다 (INSERT OR IGNORE).

use relaybench_core::error::CoreError;
use relaybench_core::models::event::Event;
use rusqlite::Transaction;
use tracing::debug;

use super::SqliteEventStore;

impl SqliteEventStore {
    /// 단일 이벤트 저장. 새로 저장되면 true, 중복이면 false
    pub fn insert_event(&self, event: &Event) -> Result<bool, CoreError> {
        let json = event.to_json()?;

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| CoreError::StoreIo(format!("트랜잭션 시작 실패: {e}")))?;

        let inserted = Self::insert_in_tx(&tx, event, &json)?;

        tx.commit()
            .map_err(|e| CoreError::StoreIo(format!("트랜잭션 커밋 실패: {e}")))?;

        if !inserted {
            debug!("중복 이벤트 무시: {}", event.id);
        }
        Ok(inserted)
    }

    /// 여러 이벤트를 한 트랜잭션으로 배치 저장
    ///
    /// 모든 이벤트가 성공하거나 모두 롤백됨.
    /// 반환값은 새로 저장된 이벤트 수 (중복 제외).
    pub fn insert_batch(&self, events: &[Event]) -> Result<usize, CoreError> {
        if events.is_empty() {
            return Ok(0);
        }

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| CoreError::StoreIo(format!("트랜잭션 시작 실패: {e}")))?;

        let mut inserted = 0;
        for event in events {
            let json = event.to_json()?;
            if Self::insert_in_tx(&tx, event, &json)? {
                inserted += 1;
            }
        }

        tx.commit()
            .map_err(|e| CoreError::StoreIo(format!("트랜잭션 커밋 실패: {e}")))?;

        debug!("이벤트 배치 저장: {inserted}/{}개", events.len());
        Ok(inserted)
    }

    fn insert_in_tx(tx: &Transaction<'_>, event: &Event, json: &str) -> Result<bool, CoreError> {
        let changed = tx
            .prepare_cached(
                "INSERT OR IGNORE INTO events (id, pubkey, created_at, kind, json) VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .and_then(|mut stmt| {
                stmt.execute(rusqlite::params![
                    event.id,
                    event.pubkey,
                    event.created_at,
                    event.kind,
                    json
                ])
            })
            .map_err(|e| CoreError::StoreIo(format!("이벤트 저장 실패: {e}")))?;

        if changed == 0 {
            return Ok(false);
        }

        let mut stmt = tx
            .prepare_cached("INSERT INTO event_tags (event_id, name, value) VALUES (?1, ?2, ?3)")
            .map_err(|e| CoreError::StoreIo(format!("쿼리 준비 실패: {e}")))?;

        for (name, value) in event.indexable_tags() {
            stmt.execute(rusqlite::params![event.id, name, value])
                .map_err(|e| CoreError::StoreIo(format!("태그 저장 실패: {e}")))?;
        }

        Ok(true)
    }
}
