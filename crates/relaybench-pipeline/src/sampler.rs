//! 메트릭 샘플러 (모니터).
//!
//! 틱마다 저장소 크기를 측정하고 구간 카운터를 비워 샘플 하나를 추가한 뒤
//! 누적 카운터로 진행 상태를 다시 발행한다. 첫 틱은 즉시 실행된다.
//!
//! 누적 값은 드레인 뒤에 읽으므로 항상 발행된 샘플 합 이상이다.
//!
//! 취소는 루프 시작 지점에서만 확인한다. 틱 사이 대기는 취소로 깨어나지만
//! 진행 중인 틱은 끝까지 실행된다.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use relaybench_core::error::CoreError;
use relaybench_core::models::metrics::{ProgressState, Sample};
use relaybench_core::ports::store::EventStore;

use crate::counters::{Counter, MetricCounters};

/// 주기적 메트릭 샘플러
pub struct Sampler {
    store: Arc<dyn EventStore>,
    counters: Arc<MetricCounters>,
    tick_interval: Duration,
    samples_tx: watch::Sender<Vec<Sample>>,
    progress_tx: watch::Sender<ProgressState>,
    /// 직전 틱의 저장소 크기 (기준값 0)
    last_size: u64,
}

impl Sampler {
    pub fn new(
        store: Arc<dyn EventStore>,
        counters: Arc<MetricCounters>,
        tick_interval: Duration,
    ) -> Self {
        let (samples_tx, _) = watch::channel(Vec::new());
        let (progress_tx, _) = watch::channel(ProgressState::default());
        Self {
            store,
            counters,
            tick_interval,
            samples_tx,
            progress_tx,
            last_size: 0,
        }
    }

    /// 시계열 샘플 구독 (추가 전용)
    pub fn subscribe_samples(&self) -> watch::Receiver<Vec<Sample>> {
        self.samples_tx.subscribe()
    }

    /// 누적 진행 상태 구독
    pub fn subscribe_progress(&self) -> watch::Receiver<ProgressState> {
        self.progress_tx.subscribe()
    }

    /// 취소될 때까지 틱 반복
    ///
    /// `started`는 샘플 offset의 기준 시각이다.
    /// 크기 측정 실패 시 `StoreIo` 에러로 종료한다.
    pub async fn run(
        mut self,
        started: Instant,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<(), CoreError> {
        info!("샘플러 시작 (주기: {}ms)", self.tick_interval.as_millis());
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *cancel.borrow() {
                break;
            }

            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick(started).await {
                        error!("샘플러 틱 실패: {e}");
                        return Err(e);
                    }
                }
                changed = cancel.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("샘플러 종료 ({} 샘플)", self.samples_tx.borrow().len());
        Ok(())
    }

    /// 틱 한 번: 크기 측정 → 드레인 → 샘플 추가 → 진행 상태 발행
    async fn tick(&mut self, started: Instant) -> Result<(), CoreError> {
        let size = self.store.current_size_bytes().await?;
        let db_size_delta = size.saturating_sub(self.last_size);
        self.last_size = size;

        let sample = Sample {
            timestamp: Utc::now(),
            offset: started.elapsed(),
            follows: self.counters.drain(Counter::Follows),
            mutes: self.counters.drain(Counter::Mutes),
            reports: self.counters.drain(Counter::Reports),
            lines: self.counters.drain(Counter::Lines),
            bytes: self.counters.drain(Counter::Bytes),
            db_size_delta,
        };
        debug!(
            "샘플: +{} 레코드, +{} 바이트, DB +{} 바이트",
            sample.lines, sample.bytes, sample.db_size_delta
        );

        self.samples_tx.send_modify(|samples| samples.push(sample));
        self.progress_tx.send_replace(ProgressState {
            lines_processed: self.counters.lines_total(),
            bytes_imported: self.counters.bytes_total(),
            total_db_size: size,
            rejected: self.counters.rejected_total(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use relaybench_core::models::event::{Event, RawEvent, RecordKind};
    use relaybench_core::models::filter::Filter;
    use std::sync::Mutex;

    const MB: u64 = 1024 * 1024;

    /// 크기 측정 결과를 순서대로 돌려주는 저장소. 목록이 끝나면 마지막 값 유지
    struct ScriptedSizeStore {
        sizes: Mutex<Vec<Result<u64, String>>>,
        last: Mutex<u64>,
    }

    impl ScriptedSizeStore {
        fn new(sizes: Vec<Result<u64, String>>) -> Self {
            let mut sizes = sizes;
            sizes.reverse();
            Self {
                sizes: Mutex::new(sizes),
                last: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl EventStore for ScriptedSizeStore {
        async fn insert(&self, _event: &Event) -> Result<(), CoreError> {
            Ok(())
        }
        async fn count(&self, _filter: &Filter) -> Result<u64, CoreError> {
            Ok(0)
        }
        async fn raw_query(&self, _filter: &Filter) -> Result<Vec<RawEvent>, CoreError> {
            Ok(vec![])
        }
        async fn current_size_bytes(&self) -> Result<u64, CoreError> {
            let next = self.sizes.lock().unwrap().pop();
            match next {
                Some(Ok(size)) => {
                    *self.last.lock().unwrap() = size;
                    Ok(size)
                }
                Some(Err(reason)) => Err(CoreError::StoreIo(reason)),
                None => Ok(*self.last.lock().unwrap()),
            }
        }
        async fn analyse(&self) -> Result<(), CoreError> {
            Ok(())
        }
        async fn vacuum(&self) -> Result<(), CoreError> {
            Ok(())
        }
    }

    fn sampler(store: ScriptedSizeStore, counters: Arc<MetricCounters>) -> Sampler {
        Sampler::new(Arc::new(store), counters, Duration::from_secs(1))
    }

    #[tokio::test(start_paused = true)]
    async fn size_delta_is_relative_to_previous_tick() {
        let store = ScriptedSizeStore::new(vec![Ok(0), Ok(50 * MB), Ok(80 * MB)]);
        let sampler = sampler(store, Arc::new(MetricCounters::new()));
        let mut samples_rx = sampler.subscribe_samples();
        let progress_rx = sampler.subscribe_progress();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let handle = tokio::spawn(sampler.run(Instant::now(), cancel_rx));
        samples_rx.wait_for(|s| s.len() >= 3).await.unwrap();
        cancel_tx.send(true).unwrap();
        handle.await.unwrap().unwrap();

        let deltas: Vec<u64> = samples_rx.borrow().iter().map(|s| s.db_size_delta).collect();
        assert_eq!(&deltas[..3], &[0, 50 * MB, 30 * MB]);
        assert_eq!(progress_rx.borrow().total_db_size, 80 * MB);
    }

    #[tokio::test(start_paused = true)]
    async fn shrinking_store_saturates_at_zero() {
        let store = ScriptedSizeStore::new(vec![Ok(10 * MB), Ok(4 * MB)]);
        let sampler = sampler(store, Arc::new(MetricCounters::new()));
        let mut samples_rx = sampler.subscribe_samples();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let handle = tokio::spawn(sampler.run(Instant::now(), cancel_rx));
        samples_rx.wait_for(|s| s.len() >= 2).await.unwrap();
        cancel_tx.send(true).unwrap();
        handle.await.unwrap().unwrap();

        assert_eq!(samples_rx.borrow()[1].db_size_delta, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_failure_ends_sampler() {
        let store = ScriptedSizeStore::new(vec![Ok(0), Err("권한 없음".to_string())]);
        let sampler = sampler(store, Arc::new(MetricCounters::new()));
        let (_cancel_tx, cancel_rx) = watch::channel(false);

        let result = sampler.run(Instant::now(), cancel_rx).await;
        assert_matches!(result, Err(CoreError::StoreIo(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn progress_tracks_sum_of_sample_lines() {
        let counters = Arc::new(MetricCounters::new());
        let sampler = sampler(ScriptedSizeStore::new(vec![]), counters.clone());
        let mut samples_rx = sampler.subscribe_samples();
        let mut progress_rx = sampler.subscribe_progress();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(sampler.run(Instant::now(), cancel_rx));

        let mut previous = 0;
        for round in 1..=5u64 {
            for _ in 0..round {
                counters.record_line(Some(RecordKind::FollowList), 10);
            }
            let wanted = round as usize;
            samples_rx.wait_for(|s| s.len() > wanted).await.unwrap();
            progress_rx.changed().await.ok();

            let progress = progress_rx.borrow_and_update().clone();
            let sum: u64 = samples_rx.borrow().iter().map(|s| s.lines).sum();
            assert!(progress.lines_processed >= previous);
            assert_eq!(progress.lines_processed, sum);
            previous = progress.lines_processed;
        }

        cancel_tx.send(true).unwrap();
        handle.await.unwrap().unwrap();
        assert_eq!(previous, 15);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_comes_from_cumulative_totals() {
        let counters = Arc::new(MetricCounters::new());
        counters.record_line(Some(RecordKind::MuteList), 40);
        counters.record_rejected(9);
        let sampler = sampler(ScriptedSizeStore::new(vec![Ok(MB)]), counters.clone());
        let mut progress_rx = sampler.subscribe_progress();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(sampler.run(Instant::now(), cancel_rx));

        progress_rx.changed().await.unwrap();
        cancel_tx.send(true).unwrap();
        handle.await.unwrap().unwrap();

        let progress = progress_rx.borrow().clone();
        assert_eq!(progress.lines_processed, counters.lines_total());
        assert_eq!(progress.lines_processed, 2);
        assert_eq!(progress.bytes_imported, 49);
        assert_eq!(progress.rejected, 1);
        assert_eq!(progress.total_db_size, MB);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_before_first_tick_emits_nothing() {
        let sampler = sampler(ScriptedSizeStore::new(vec![]), Arc::new(MetricCounters::new()));
        let samples_rx = sampler.subscribe_samples();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        cancel_tx.send(true).unwrap();

        sampler.run(Instant::now(), cancel_rx).await.unwrap();
        assert!(samples_rx.borrow().is_empty());
    }
}
