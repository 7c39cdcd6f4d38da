//! 수집 컨트롤러 (상태 머신).
//!
//! `NotStarted → Running → Finished` 단방향 전이.
//! 수집기와 샘플러를 독립 태스크로 실행하고 종료 프로토콜을 수행한다:
//!
//! 1. 수집기 완료 대기
//! 2. 유예 시간 대기. 그때까지 완료 이후 샘플이 없으면 첫 샘플이 나올 때까지 대기
//! 3. 샘플러 취소 및 join
//! 4. `Finished(elapsed)` 전이 (elapsed = 시작 → 수집기 완료)
//!
//! 완료 이후 샘플은 정확히 하나다. 유예 시간이 틱보다 길면 그 사이 틱 수만큼 늘어난다.
//!
//! 어느 태스크든 치명적 에러가 나면 다른 태스크를 중단하고 에러를 반환한다.
//! 이 경우 상태는 `Finished`에 도달하지 않는다. [`IngestionController::abort`]도 마찬가지다.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tracing::{error, info};

use relaybench_core::config::IngestConfig;
use relaybench_core::error::CoreError;
use relaybench_core::models::metrics::{ProgressState, Sample};
use relaybench_core::models::state::IngestionState;
use relaybench_core::ports::source::RecordSource;
use relaybench_core::ports::store::EventStore;
use relaybench_core::ports::verifier::Verifier;

use crate::counters::MetricCounters;
use crate::ingestor::{IngestSummary, Ingestor};
use crate::sampler::Sampler;

/// 실행 중인 태스크 묶음
struct RunningTasks {
    started: Instant,
    ingest: JoinHandle<Result<IngestSummary, CoreError>>,
    sample: JoinHandle<Result<(), CoreError>>,
    cancel_tx: watch::Sender<bool>,
}

/// 수집 상태 머신
pub struct IngestionController {
    ingestor: Arc<Ingestor>,
    sampler: Option<Sampler>,
    grace_period: Duration,
    state_tx: watch::Sender<IngestionState>,
    samples_rx: watch::Receiver<Vec<Sample>>,
    progress_rx: watch::Receiver<ProgressState>,
    running: Option<RunningTasks>,
}

impl IngestionController {
    pub fn new(
        store: Arc<dyn EventStore>,
        verifier: Arc<dyn Verifier>,
        config: &IngestConfig,
    ) -> Self {
        let counters = Arc::new(MetricCounters::new());
        let ingestor = Ingestor::new(store.clone(), verifier, counters.clone())
            .with_policy(config.invalid_record_policy);
        let sampler = Sampler::new(store, counters, config.tick_interval());
        let samples_rx = sampler.subscribe_samples();
        let progress_rx = sampler.subscribe_progress();
        let (state_tx, _) = watch::channel(IngestionState::NotStarted);

        Self {
            ingestor: Arc::new(ingestor),
            sampler: Some(sampler),
            grace_period: config.grace_period(),
            state_tx,
            samples_rx,
            progress_rx,
            running: None,
        }
    }

    /// 상태 구독
    pub fn state(&self) -> watch::Receiver<IngestionState> {
        self.state_tx.subscribe()
    }

    /// 시계열 샘플 구독
    pub fn samples(&self) -> watch::Receiver<Vec<Sample>> {
        self.samples_rx.clone()
    }

    /// 누적 진행 상태 구독
    pub fn progress(&self) -> watch::Receiver<ProgressState> {
        self.progress_rx.clone()
    }

    /// 수집 시작. `NotStarted` 상태에서만 허용
    pub fn start(&mut self, source: Box<dyn RecordSource>) -> Result<(), CoreError> {
        let started_at = Utc::now();
        let transitioned = self.state_tx.send_if_modified(|state| {
            if matches!(state, IngestionState::NotStarted) {
                *state = IngestionState::Running { started_at };
                true
            } else {
                false
            }
        });
        if !transitioned {
            return Err(CoreError::InvalidState(format!(
                "수집은 NotStarted 상태에서만 시작할 수 있습니다 (현재: {})",
                self.state_tx.borrow().name()
            )));
        }

        let sampler = self
            .sampler
            .take()
            .ok_or_else(|| CoreError::Internal("샘플러가 이미 사용됨".to_string()))?;
        let started = Instant::now();
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let sample = tokio::spawn(sampler.run(started, cancel_rx));
        let ingestor = self.ingestor.clone();
        let mut source = source;
        let ingest = tokio::spawn(async move { ingestor.run(source.as_mut()).await });

        info!("수집 상태: Running");
        self.running = Some(RunningTasks {
            started,
            ingest,
            sample,
            cancel_tx,
        });
        Ok(())
    }

    /// 종료 프로토콜 수행 후 수집 결과 반환
    ///
    /// 에러로 끝나면 남은 태스크를 중단하고 join한 뒤 반환한다.
    pub async fn wait(&mut self) -> Result<IngestSummary, CoreError> {
        if self.running.is_none() {
            return Err(CoreError::InvalidState("수집이 실행 중이 아닙니다".to_string()));
        }
        let outcome = self.shutdown().await;
        if outcome.is_ok() {
            self.running = None;
        } else {
            self.abort().await;
        }
        outcome
    }

    /// 실행 중인 수집을 중단하고 두 태스크가 멈출 때까지 대기
    ///
    /// 상태는 `Running`에 남는다. 실행 중이 아니면 아무것도 하지 않는다.
    pub async fn abort(&mut self) {
        let Some(tasks) = self.running.take() else {
            return;
        };
        let _ = tasks.cancel_tx.send(true);
        stop(tasks.ingest).await;
        stop(tasks.sample).await;
        info!("수집 중단됨");
    }

    async fn shutdown(&mut self) -> Result<IngestSummary, CoreError> {
        let tasks = self
            .running
            .as_mut()
            .ok_or_else(|| CoreError::InvalidState("수집이 실행 중이 아닙니다".to_string()))?;

        // 1. 수집기 완료 대기 (샘플러가 먼저 죽으면 중단)
        let summary = tokio::select! {
            joined = &mut tasks.ingest => flatten(joined, "수집기")?,
            joined = &mut tasks.sample => return Err(sampler_stopped(joined)),
        };
        let elapsed = tasks.started.elapsed();
        info!("수집기 완료: {:.1}초", elapsed.as_secs_f64());

        // 2. 유예 후 완료 이후 샘플 대기
        tokio::time::sleep(self.grace_period).await;
        let mut samples_rx = self.samples_rx.clone();
        tokio::select! {
            waited = async {
                samples_rx
                    .wait_for(|samples| samples.last().is_some_and(|s| s.offset > elapsed))
                    .await
                    .map(|_| ())
            } => {
                if waited.is_err() {
                    return Err(CoreError::Internal("샘플 채널이 닫혔습니다".to_string()));
                }
            }
            joined = &mut tasks.sample => return Err(sampler_stopped(joined)),
        }

        // 3. 샘플러 취소 및 join
        let _ = tasks.cancel_tx.send(true);
        flatten((&mut tasks.sample).await, "샘플러")?;

        // 4. 종료 상태 전이
        self.state_tx.send_replace(IngestionState::Finished { elapsed });
        info!(
            "수집 상태: Finished ({:.1}분, {} 레코드)",
            elapsed.as_secs_f64() / 60.0,
            summary.lines
        );
        Ok(summary)
    }

    /// `start` + `wait`
    pub async fn run(&mut self, source: Box<dyn RecordSource>) -> Result<IngestSummary, CoreError> {
        self.start(source)?;
        self.wait().await
    }
}

/// join 결과와 태스크 결과를 하나로 합침
fn flatten<T>(
    joined: Result<Result<T, CoreError>, JoinError>,
    task: &str,
) -> Result<T, CoreError> {
    match joined {
        Ok(result) => result,
        Err(e) => {
            error!("{task} 태스크 실패: {e}");
            Err(CoreError::Internal(format!("{task} 태스크 실패: {e}")))
        }
    }
}

/// 태스크 중단 후 종료 대기. 이미 끝난 태스크는 건너뜀
async fn stop<T>(handle: JoinHandle<T>) {
    handle.abort();
    if !handle.is_finished() {
        let _ = handle.await;
    }
}

/// 수집기보다 먼저 끝난 샘플러 결과를 에러로 변환
fn sampler_stopped(joined: Result<Result<(), CoreError>, JoinError>) -> CoreError {
    match flatten(joined, "샘플러") {
        Err(e) => e,
        Ok(()) => CoreError::Internal("샘플러가 수집 완료 전에 종료되었습니다".to_string()),
    }
}
