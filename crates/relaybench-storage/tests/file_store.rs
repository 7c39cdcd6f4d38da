//! 파일 기반 저장소 통합 테스트.
//!
//! 열기 → 저장 → 크기 측정 → 재열기 → 파일 삭제.

use relaybench_core::models::event::Event;
use relaybench_core::models::filter::Filter;
use relaybench_core::ports::store::EventStore;
use relaybench_storage::sqlite::SqliteEventStore;
use tempfile::TempDir;

const AUTHOR: &str = "460c25e682fda7832b52d1f22d3d22b3176d972f60dcdc3212ed8c92ef85065c";

fn make_event(i: i64) -> Event {
    Event::build(
        AUTHOR,
        1_700_000_000 + i,
        3,
        vec![vec!["p".to_string(), format!("{i:064x}")]],
        format!("content {i}"),
        "e".repeat(128),
    )
    .unwrap()
}

#[tokio::test]
async fn size_grows_with_inserts() {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteEventStore::open(&temp_dir.path().join("events.db")).unwrap();

    let before = store.current_size_bytes().await.unwrap();
    let batch: Vec<_> = (0..1_000).map(make_event).collect();
    assert_eq!(store.insert_batch(&batch).unwrap(), 1_000);
    let after = store.current_size_bytes().await.unwrap();

    assert!(after > before, "before={before}, after={after}");
}

#[tokio::test]
async fn data_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("events.db");

    {
        let store = SqliteEventStore::open(&path).unwrap();
        for i in 0..10 {
            store.insert(&make_event(i)).await.unwrap();
        }
        store.checkpoint().unwrap();
    }

    let store = SqliteEventStore::open(&path).unwrap();
    assert_eq!(store.count(&Filter::new()).await.unwrap(), 10);
    assert_eq!(store.path(), Some(path.as_path()));
}

#[tokio::test]
async fn remove_files_resets_database() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("events.db");

    {
        let store = SqliteEventStore::open(&path).unwrap();
        store.insert(&make_event(1)).await.unwrap();
    }

    SqliteEventStore::remove_files(&path).unwrap();
    assert!(!path.exists());
    // 없는 파일 삭제도 에러 없음
    SqliteEventStore::remove_files(&path).unwrap();

    let store = SqliteEventStore::open(&path).unwrap();
    assert_eq!(store.count(&Filter::new()).await.unwrap(), 0);
}

#[tokio::test]
async fn count_matches_query_length_for_many_filters() {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteEventStore::open(&temp_dir.path().join("events.db")).unwrap();
    let batch: Vec<_> = (0..200).map(make_event).collect();
    store.insert_batch(&batch).unwrap();

    let filters = [
        Filter::new(),
        Filter::new().kinds([3]).limit(50),
        Filter::new().authors([AUTHOR]).since(1_700_000_150),
        Filter::new().tag("p", [format!("{:064x}", 7)]),
        Filter::new().kinds([1984]),
    ];

    for filter in &filters {
        let count = store.count(filter).await.unwrap();
        let rows = store.raw_query(filter).await.unwrap();
        assert_eq!(count, rows.len() as u64, "filter={filter:?}");
    }
}
