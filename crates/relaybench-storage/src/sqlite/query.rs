//! 필터 조회.
//!
//! `Filter`를 하나의 WHERE 절로 변환한다. count와 raw_query는 같은 절과
//! 같은 LIMIT을 공유하므로 동일 필터의 카디널리티가 일치한다.

use relaybench_core::error::CoreError;
use relaybench_core::models::event::RawEvent;
use relaybench_core::models::filter::Filter;
use rusqlite::types::Value;
use tracing::debug;

use super::SqliteEventStore;

/// WHERE 절과 바인딩 파라미터
#[derive(Debug, Default)]
pub(super) struct WhereClause {
    pub sql: String,
    pub params: Vec<Value>,
}

impl WhereClause {
    /// 필터 → `WHERE ... ORDER BY ... LIMIT ?`
    pub(super) fn from_filter(filter: &Filter) -> Self {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if !filter.ids.is_empty() {
            conditions.push(format!("e.id IN ({})", placeholders(filter.ids.len())));
            params.extend(filter.ids.iter().cloned().map(Value::Text));
        }

        if !filter.authors.is_empty() {
            conditions.push(format!("e.pubkey IN ({})", placeholders(filter.authors.len())));
            params.extend(filter.authors.iter().cloned().map(Value::Text));
        }

        if !filter.kinds.is_empty() {
            conditions.push(format!("e.kind IN ({})", placeholders(filter.kinds.len())));
            params.extend(filter.kinds.iter().map(|k| Value::Integer(i64::from(*k))));
        }

        for (name, values) in filter.tags.iter().filter(|(_, v)| !v.is_empty()) {
            conditions.push(format!(
                "EXISTS (SELECT 1 FROM event_tags t WHERE t.event_id = e.id AND t.name = ? AND t.value IN ({}))",
                placeholders(values.len())
            ));
            params.push(Value::Text(name.clone()));
            params.extend(values.iter().cloned().map(Value::Text));
        }

        if let Some(since) = filter.since {
            conditions.push("e.created_at >= ?".to_string());
            params.push(Value::Integer(since));
        }

        if let Some(until) = filter.until {
            conditions.push("e.created_at <= ?".to_string());
            params.push(Value::Integer(until));
        }

        let mut sql = String::new();
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY e.created_at DESC, e.id ASC LIMIT ?");
        // SQLite: 음수 LIMIT은 제한 없음
        params.push(Value::Integer(filter.limit.map_or(-1, i64::from)));

        Self { sql, params }
    }
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

impl SqliteEventStore {
    /// 필터 일치 이벤트 수 (LIMIT 적용)
    pub fn count_matching(&self, filter: &Filter) -> Result<u64, CoreError> {
        let clause = WhereClause::from_filter(filter);
        let sql = format!("SELECT COUNT(*) FROM (SELECT e.id FROM events e{})", clause.sql);

        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(&sql, rusqlite::params_from_iter(clause.params.iter()), |row| {
                row.get(0)
            })
            .map_err(|e| CoreError::StoreIo(format!("count 실행 실패: {e}")))?;

        debug!("count: {count}");
        Ok(count as u64)
    }

    /// 필터 일치 원본 이벤트 (최신순, LIMIT 적용)
    pub fn query_matching(&self, filter: &Filter) -> Result<Vec<RawEvent>, CoreError> {
        let clause = WhereClause::from_filter(filter);
        let sql = format!(
            "SELECT e.id, e.kind, e.created_at, e.json FROM events e{}",
            clause.sql
        );

        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| CoreError::StoreIo(format!("쿼리 준비 실패: {e}")))?;

        let rows = stmt
            .query_map(rusqlite::params_from_iter(clause.params.iter()), |row| {
                Ok(RawEvent {
                    id: row.get(0)?,
                    kind: row.get(1)?,
                    created_at: row.get(2)?,
                    json: row.get(3)?,
                })
            })
            .map_err(|e| CoreError::StoreIo(format!("쿼리 실행 실패: {e}")))?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row.map_err(|e| CoreError::StoreIo(format!("행 읽기 실패: {e}")))?);
        }

        debug!("raw_query: {}개", events.len());
        Ok(events)
    }
}
