//! 콘솔 리포터.
//!
//! 파이프라인이 발행하는 관찰 값(샘플, 진행 상태, 벤치마크 결과)을 구독해
//! 사람이 읽을 수 있는 형태로 출력한다.

use chrono::Local;
use std::fmt::Write as _;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use relaybench_core::models::benchmark::BenchmarkRunResults;
use relaybench_core::models::metrics::{ProgressState, Sample};
use relaybench_core::models::state::IngestionState;

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// 샘플 한 줄 포맷
pub fn format_sample(sample: &Sample, progress: &ProgressState, expected_lines: u64) -> String {
    format!(
        "{} [{:>7.1}s] +{} 레코드 ({:.2} MiB) follows={} mutes={} reports={} DB +{:.2} MiB | {}% · {} MB 읽음 · DB {} MB",
        sample.timestamp.with_timezone(&Local).format("%H:%M:%S"),
        sample.offset.as_secs_f64(),
        sample.lines,
        sample.lines_mb(),
        sample.follows,
        sample.mutes,
        sample.reports,
        sample.db_size_delta_mb(),
        progress.percent(expected_lines),
        progress.mb_imported(),
        progress.db_size_mb(),
    )
}

/// 수집 종료 요약
pub fn format_finished(state: &IngestionState, progress: &ProgressState) -> String {
    let minutes = state
        .elapsed_minutes()
        .map(|m| format!("{m:.1}분"))
        .unwrap_or_else(|| state.name().to_string());
    let mut out = format!(
        "수집 완료: {} 레코드, {} MB 읽음, DB {} MB, 소요 {minutes}",
        progress.lines_processed,
        progress.mb_imported(),
        progress.db_size_mb(),
    );
    if progress.rejected > 0 {
        let _ = write!(out, ", 건너뜀 {}", progress.rejected);
    }
    out
}

/// 벤치마크 결과 표
pub fn format_results(results: &BenchmarkRunResults) -> String {
    let mut out = format!(
        "{:<20} {:>8} {:>12} {:>12}\n",
        "벤치마크", "건수", "count(ms)", "fetch(ms)"
    );
    for (name, result) in results.iter() {
        let _ = writeln!(
            out,
            "{:<20} {:>8} {:>12.2} {:>12.2}",
            name,
            result.cardinality(),
            millis(result.count.duration),
            millis(result.fetch.duration),
        );
    }
    out
}

/// 새 샘플이 추가될 때마다 출력하는 태스크
///
/// 샘플 채널이 닫히면 남은 샘플을 출력하고 끝난다.
pub fn spawn_ingest_reporter(
    mut samples: watch::Receiver<Vec<Sample>>,
    progress: watch::Receiver<ProgressState>,
    expected_lines: u64,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut printed = 0;
        while samples.changed().await.is_ok() {
            let fresh: Vec<Sample> = samples.borrow_and_update()[printed..].to_vec();
            let progress = progress.borrow().clone();
            for sample in &fresh {
                println!("{}", format_sample(sample, &progress, expected_lines));
            }
            printed += fresh.len();
        }
        printed
    })
}

/// 실행 중인 벤치마크 이름을 출력하는 태스크
pub fn spawn_benchmark_reporter(mut current: watch::Receiver<Option<String>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while current.changed().await.is_ok() {
            if let Some(name) = current.borrow_and_update().clone() {
                println!("▶ {name}");
            }
        }
    })
}
