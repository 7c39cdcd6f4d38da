//! 수집 파이프라인 통합 테스트.
//!
//! 컨트롤러 → 수집기/샘플러 → SQLite 저장소 전체 흐름과
//! 종료 프로토콜 타이밍(가상 시간)을 검증한다.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use relaybench_core::config::{IngestConfig, InvalidRecordPolicy};
use relaybench_core::error::CoreError;
use relaybench_core::models::event::Event;
use relaybench_core::models::filter::Filter;
use relaybench_core::models::state::IngestionState;
use relaybench_core::ports::source::RecordSource;
use relaybench_core::ports::store::EventStore;
use relaybench_pipeline::controller::IngestionController;
use relaybench_pipeline::source::{FileRecordSource, LinesSource};
use relaybench_pipeline::verify::EventIdVerifier;
use relaybench_storage::sqlite::SqliteEventStore;

const PUBKEY: &str = "460c25e682fda7832b52d1f22d3d22b3176d972f60dcdc3212ed8c92ef85065c";

fn line(kind: u32, created_at: i64) -> String {
    Event::build(
        PUBKEY,
        created_at,
        kind,
        vec![vec!["p".to_string(), PUBKEY.to_string()]],
        "",
        "0".repeat(128),
    )
    .unwrap()
    .to_json()
    .unwrap()
}

/// 줄마다 `delay`만큼 걸리는 소스
struct SlowSource {
    lines: LinesSource,
    delay: Duration,
}

#[async_trait]
impl RecordSource for SlowSource {
    async fn next_line(&mut self) -> Result<Option<String>, CoreError> {
        if self.lines.remaining() == 0 {
            return Ok(None);
        }
        tokio::time::sleep(self.delay).await;
        self.lines.next_line().await
    }
}

fn controller(store: Arc<SqliteEventStore>, config: &IngestConfig) -> IngestionController {
    IngestionController::new(store, Arc::new(EventIdVerifier::new()), config)
}

#[tokio::test(start_paused = true)]
async fn three_records_of_distinct_kinds() {
    let store = Arc::new(SqliteEventStore::open_in_memory().unwrap());
    let mut controller = controller(store.clone(), &IngestConfig::default());
    let samples = controller.samples();
    let progress = controller.progress();

    let lines = vec![line(3, 1), line(10_000, 2), line(1984, 3)];
    let total_bytes: u64 = lines.iter().map(|l| l.len() as u64).sum();

    let summary = controller
        .run(Box::new(LinesSource::new(lines)))
        .await
        .unwrap();
    assert_eq!(summary.lines, 3);
    assert_eq!(summary.bytes, total_bytes);

    let samples = samples.borrow().clone();
    assert_eq!(samples.iter().map(|s| s.follows).sum::<u64>(), 1);
    assert_eq!(samples.iter().map(|s| s.mutes).sum::<u64>(), 1);
    assert_eq!(samples.iter().map(|s| s.reports).sum::<u64>(), 1);
    assert_eq!(samples.iter().map(|s| s.lines).sum::<u64>(), 3);
    assert_eq!(samples.iter().map(|s| s.bytes).sum::<u64>(), total_bytes);

    let progress = progress.borrow().clone();
    assert_eq!(progress.lines_processed, 3);
    assert_eq!(progress.bytes_imported, total_bytes);
    assert_eq!(progress.rejected, 0);
    assert!(progress.total_db_size > 0);
    assert_eq!(store.count(&Filter::new()).await.unwrap(), 3);
}

#[tokio::test(start_paused = true)]
async fn shutdown_delivers_one_final_sample() {
    let store = Arc::new(SqliteEventStore::open_in_memory().unwrap());
    let mut controller = controller(store, &IngestConfig::default());
    let samples = controller.samples();
    let state = controller.state();

    let source = SlowSource {
        lines: LinesSource::new((0..10).map(|i| line(3, i))),
        delay: Duration::from_secs(1),
    };
    controller.run(Box::new(source)).await.unwrap();

    let completion = Duration::from_secs(10);
    assert_eq!(
        *state.borrow(),
        IngestionState::Finished {
            elapsed: completion
        }
    );

    let samples = samples.borrow().clone();
    let after_completion = samples.iter().filter(|s| s.offset > completion).count();
    assert_eq!(after_completion, 1);
    assert_eq!(samples.iter().map(|s| s.lines).sum::<u64>(), 10);
    assert!(samples
        .windows(2)
        .all(|pair| pair[0].offset < pair[1].offset));
}

#[tokio::test(start_paused = true)]
async fn completion_between_ticks_still_yields_one_final_sample() {
    let store = Arc::new(SqliteEventStore::open_in_memory().unwrap());
    let mut controller = controller(store, &IngestConfig::default());
    let samples = controller.samples();
    let state = controller.state();

    let source = SlowSource {
        lines: LinesSource::new((0..10).map(|i| line(3, i))),
        delay: Duration::from_millis(1050),
    };
    let begun = tokio::time::Instant::now();
    controller.run(Box::new(source)).await.unwrap();

    // 10.5초 완료 + 1초 유예. 11초 틱이 이미 있으므로 추가 틱 없이 끝난다
    let completion = Duration::from_millis(10_500);
    assert_eq!(
        *state.borrow(),
        IngestionState::Finished {
            elapsed: completion
        }
    );
    assert_eq!(begun.elapsed(), Duration::from_millis(11_500));

    let samples = samples.borrow().clone();
    let after: Vec<Duration> = samples
        .iter()
        .map(|s| s.offset)
        .filter(|offset| *offset > completion)
        .collect();
    assert_eq!(after, vec![Duration::from_secs(11)]);
    assert_eq!(samples.iter().map(|s| s.lines).sum::<u64>(), 10);
}

#[tokio::test(start_paused = true)]
async fn skip_policy_finishes_with_rejected_count() {
    let store = Arc::new(SqliteEventStore::open_in_memory().unwrap());
    let config = IngestConfig {
        invalid_record_policy: InvalidRecordPolicy::Skip,
        ..IngestConfig::default()
    };
    let mut controller = controller(store.clone(), &config);
    let progress = controller.progress();

    let lines = vec![line(3, 1), "garbage".to_string(), line(3, 2)];
    let summary = controller
        .run(Box::new(LinesSource::new(lines)))
        .await
        .unwrap();

    assert_eq!(summary.rejected, 1);
    assert_eq!(progress.borrow().rejected, 1);
    assert_eq!(progress.borrow().lines_processed, 3);
    assert_eq!(store.count(&Filter::new()).await.unwrap(), 2);
    assert!(controller.state().borrow().is_finished());
}

#[tokio::test]
async fn ingests_from_jsonl_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("wot.jsonl");
    let body: Vec<String> = (0..50).map(|i| line(if i % 2 == 0 { 3 } else { 1984 }, i)).collect();
    std::fs::write(&path, body.join("\n") + "\n").unwrap();

    let store = Arc::new(SqliteEventStore::open(&dir.path().join("events.db")).unwrap());
    let config = IngestConfig {
        tick_interval_ms: 20,
        grace_period_ms: 20,
        ..IngestConfig::default()
    };
    let mut controller = controller(store.clone(), &config);
    let samples = controller.samples();

    let source = FileRecordSource::open(&path).await.unwrap();
    let summary = controller.run(Box::new(source)).await.unwrap();

    assert_eq!(summary.lines, 50);
    let samples = samples.borrow().clone();
    assert_eq!(samples.iter().map(|s| s.follows).sum::<u64>(), 25);
    assert_eq!(samples.iter().map(|s| s.reports).sum::<u64>(), 25);
    assert_eq!(store.count(&Filter::new().kinds([3])).await.unwrap(), 25);
}
