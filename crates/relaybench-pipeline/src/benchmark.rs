//! 읽기 벤치마크 실행기.
//!
//! 벤치마크 목록을 순서대로 실행한다. 각 벤치마크는 같은 필터로
//! `count`와 `raw_query`를 측정하고 두 결과의 카디널리티를 비교한다.
//! 실행 중 현재 벤치마크 이름과 누적 결과를 발행한다.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{error, info};

use relaybench_core::config::BenchmarkConfig;
use relaybench_core::error::CoreError;
use relaybench_core::models::benchmark::{
    Benchmark, BenchmarkResult, BenchmarkRunResults, Measurement,
};
use relaybench_core::models::event::RecordKind;
use relaybench_core::models::filter::Filter;
use relaybench_core::ports::store::EventStore;

/// 기본 벤치마크 목록 (실행 순서대로)
pub fn standard_suite(config: &BenchmarkConfig) -> Vec<Benchmark> {
    let pubkey = config.pubkey.as_str();
    let follow_list = RecordKind::FOLLOW_LIST_KIND;
    let report = RecordKind::REPORT_KIND;

    vec![
        Benchmark::new(
            "Follows",
            Filter::new().kinds([follow_list]).authors([pubkey]),
        ),
        Benchmark::new(
            "Followers",
            Filter::new()
                .kinds([follow_list])
                .tag("p", [pubkey])
                .limit(config.limit),
        ),
        Benchmark::new(
            "Notifications",
            Filter::new().tag("p", [pubkey]).limit(config.limit),
        ),
        Benchmark::new(
            "Reports",
            Filter::new()
                .kinds([report])
                .authors([pubkey])
                .tag("p", [pubkey])
                .limit(config.limit),
        ),
        Benchmark::new(
            "Reports By Anyone",
            Filter::new()
                .kinds([report])
                .tag("p", [pubkey])
                .limit(config.limit),
        ),
        Benchmark::new("Ids", Filter::new().ids(config.ids.iter().cloned())),
        Benchmark::new(
            "Followers By Date",
            Filter::new()
                .kinds([follow_list])
                .tag("p", [pubkey])
                .since(config.since),
        ),
    ]
}

/// 소요 시간 측정
async fn timed<T, F>(operation: F) -> Result<Measurement<T>, CoreError>
where
    F: Future<Output = Result<T, CoreError>>,
{
    let start = Instant::now();
    let value = operation.await?;
    Ok(Measurement {
        duration: start.elapsed(),
        value,
    })
}

/// 순차 벤치마크 실행기
pub struct BenchmarkRunner {
    store: Arc<dyn EventStore>,
    current_tx: watch::Sender<Option<String>>,
    results_tx: watch::Sender<BenchmarkRunResults>,
}

impl BenchmarkRunner {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        let (current_tx, _) = watch::channel(None);
        let (results_tx, _) = watch::channel(BenchmarkRunResults::new());
        Self {
            store,
            current_tx,
            results_tx,
        }
    }

    /// 현재 실행 중인 벤치마크 이름 구독 (실행 중이 아니면 `None`)
    pub fn current(&self) -> watch::Receiver<Option<String>> {
        self.current_tx.subscribe()
    }

    /// 누적 결과 구독
    pub fn results(&self) -> watch::Receiver<BenchmarkRunResults> {
        self.results_tx.subscribe()
    }

    /// 벤치마크 목록 실행. 일관성 위반이나 저장소 에러에서 즉시 중단
    pub async fn run(&self, benchmarks: &[Benchmark]) -> Result<BenchmarkRunResults, CoreError> {
        info!("읽기 벤치마크 시작: {}개", benchmarks.len());
        self.results_tx.send_replace(BenchmarkRunResults::new());

        let outcome = self.run_all(benchmarks).await;
        self.current_tx.send_replace(None);

        match &outcome {
            Ok(results) => info!("읽기 벤치마크 완료: {}개", results.len()),
            Err(e) => error!("읽기 벤치마크 중단: {e}"),
        }
        outcome
    }

    async fn run_all(&self, benchmarks: &[Benchmark]) -> Result<BenchmarkRunResults, CoreError> {
        let mut results = BenchmarkRunResults::new();
        for benchmark in benchmarks {
            self.current_tx.send_replace(Some(benchmark.name.clone()));
            let result = self.measure(benchmark).await?;
            info!(
                "{}: {}건 (count {:?}, fetch {:?})",
                benchmark.name,
                result.cardinality(),
                result.count.duration,
                result.fetch.duration
            );
            results.insert(benchmark.name.clone(), result);
            self.results_tx.send_replace(results.clone());
        }
        Ok(results)
    }

    /// 벤치마크 하나 측정 (count → fetch)
    pub async fn measure(&self, benchmark: &Benchmark) -> Result<BenchmarkResult, CoreError> {
        let count = timed(self.store.count(&benchmark.filter)).await?;
        let fetch = timed(self.store.raw_query(&benchmark.filter)).await?;
        BenchmarkResult::new(&benchmark.name, count, fetch)
    }
}
