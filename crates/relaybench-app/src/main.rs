//! # relaybench-app
//!
//! relaybench 바이너리 진입점.
//! 설정 로드, 저장소 와이어링, 수집/벤치마크 실행, 콘솔 출력.

mod context;
mod report;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::future::Future;
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use relaybench_core::config::{AppConfig, InvalidRecordPolicy};
use relaybench_core::config_manager::ConfigManager;
use relaybench_core::ports::source::RecordSource;
use relaybench_pipeline::benchmark::standard_suite;
use relaybench_pipeline::controller::IngestionController;
use relaybench_pipeline::source::FileRecordSource;

use crate::context::BenchContext;

const INTERRUPTED: &str = "사용자에 의해 중단됨";

/// Nostr 이벤트 저장소 수집/조회 벤치마크
#[derive(Parser, Debug)]
#[command(name = "relaybench")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// 설정 파일 경로 (JSON/TOML)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info", global = true)]
    log_level: String,

    /// SQLite DB 파일 경로 (기본: 플랫폼 데이터 디렉토리)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// 입력 JSONL 파일 경로
    #[arg(long, short = 's', global = true)]
    source: Option<PathBuf>,

    /// 기존 DB를 지우지 않고 이어서 수집
    #[arg(long, global = true)]
    keep_db: bool,

    /// 잘못된 레코드를 건너뛰고 계속 수집
    #[arg(long, global = true)]
    skip_invalid: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// JSONL 파일을 DB로 수집하며 처리량 샘플 출력
    Import,
    /// 읽기 벤치마크 실행
    Query,
    /// 통계 갱신 (ANALYZE)
    Analyse,
    /// 공간 회수 (VACUUM)
    Vacuum,
    /// 수집 → 통계 갱신 → 읽기 벤치마크
    All,
    /// 기본 설정 파일 생성
    ConfigInit {
        /// 저장할 경로
        #[arg(default_value = "relaybench.json")]
        path: PathBuf,
    },
}

impl Command {
    fn imports(&self) -> bool {
        matches!(self, Command::Import | Command::All)
    }
}

/// CLI 인자를 설정 위에 덮어쓰기
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(db) = &args.db {
        config.storage.db_path = Some(db.clone());
    }
    if let Some(source) = &args.source {
        config.ingest.source_path = source.clone();
    }
    if args.keep_db {
        config.storage.reset_on_start = false;
    }
    if args.skip_invalid {
        config.ingest.invalid_record_policy = InvalidRecordPolicy::Skip;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "relaybench={level},relaybench_core={level},relaybench_storage={level},relaybench_pipeline={level}",
        level = args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    if let Command::ConfigInit { path } = &args.command {
        ConfigManager::write_default(path)?;
        println!("기본 설정 저장: {}", path.display());
        return Ok(());
    }

    let mut config = ConfigManager::load(args.config.as_deref())?.get();
    apply_overrides(&mut config, &args);
    config.validate()?;

    let interrupt = spawn_interrupt_listener();
    let reset = args.command.imports() && config.storage.reset_on_start;
    let context = BenchContext::open(config, reset)?;

    let outcome = run_command(&args.command, &context, &interrupt).await;
    if let Err(e) = &outcome {
        error!("실행 실패: {e:#}");
    }
    context.close()?;
    outcome
}

/// OS 시그널 대기 (SIGINT, SIGTERM)
async fn wait_for_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => info!("SIGINT 수신"),
            _ = sigterm.recv() => info!("SIGTERM 수신"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Ctrl+C 수신");
    }

    Ok(())
}

/// 시그널을 받으면 `true`가 되는 중단 플래그
fn spawn_interrupt_listener() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(()) => {
                warn!("사용자 중단");
                let _ = tx.send(true);
            }
            Err(e) => {
                // 송신측이 먼저 닫히면 중단으로 읽히지 않도록 수신측이 모두 사라질 때까지 유지
                warn!("시그널 핸들러 등록 실패: {e}");
                tx.closed().await;
            }
        }
    });
    rx
}

/// 중단 플래그가 설 때까지 대기. 채널이 닫히면 영원히 대기
async fn interrupted(mut interrupt: watch::Receiver<bool>) {
    if interrupt.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// 중단되면 작업을 버리고 에러 반환
async fn until_interrupted<F>(work: F, interrupt: &watch::Receiver<bool>) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    tokio::select! {
        outcome = work => outcome,
        _ = interrupted(interrupt.clone()) => Err(anyhow!(INTERRUPTED)),
    }
}

async fn run_command(
    command: &Command,
    context: &BenchContext,
    interrupt: &watch::Receiver<bool>,
) -> Result<()> {
    match command {
        Command::Import => import(context, interrupt).await,
        Command::Query => until_interrupted(query(context), interrupt).await,
        Command::Analyse => until_interrupted(analyse(context), interrupt).await,
        Command::Vacuum => until_interrupted(vacuum(context), interrupt).await,
        Command::All => {
            import(context, interrupt).await?;
            until_interrupted(analyse(context), interrupt).await?;
            until_interrupted(query(context), interrupt).await
        }
        Command::ConfigInit { .. } => Ok(()),
    }
}

async fn import(context: &BenchContext, interrupt: &watch::Receiver<bool>) -> Result<()> {
    let ingest = &context.config().ingest;
    info!("수집 시작: {}", ingest.source_path.display());
    let source = FileRecordSource::open(&ingest.source_path).await?;

    let controller = context.ingestion_controller();
    let state = controller.state();
    let progress = controller.progress();
    let reporter = report::spawn_ingest_reporter(
        controller.samples(),
        controller.progress(),
        ingest.expected_lines,
    );

    let result = ingest_until_interrupted(controller, Box::new(source), interrupt).await;
    // 컨트롤러가 내려가면 샘플 채널이 닫히고 리포터는 남은 샘플을 출력한 뒤 끝난다
    let _ = reporter.await;
    result?;

    let state = state.borrow().clone();
    let progress = progress.borrow().clone();
    println!("{}", report::format_finished(&state, &progress));
    Ok(())
}

/// 수집 실행. 중단되면 두 태스크를 멈추고 join한 뒤 에러 반환
async fn ingest_until_interrupted(
    mut controller: IngestionController,
    source: Box<dyn RecordSource>,
    interrupt: &watch::Receiver<bool>,
) -> Result<()> {
    controller.start(source)?;
    let finished = tokio::select! {
        result = controller.wait() => Some(result),
        _ = interrupted(interrupt.clone()) => None,
    };
    match finished {
        Some(result) => {
            result?;
            Ok(())
        }
        None => {
            controller.abort().await;
            Err(anyhow!(INTERRUPTED))
        }
    }
}

async fn query(context: &BenchContext) -> Result<()> {
    let runner = context.benchmark_runner();
    let reporter = report::spawn_benchmark_reporter(runner.current());

    let result = runner.run(&standard_suite(&context.config().benchmark)).await;
    reporter.abort();
    let results = result?;

    print!("{}", report::format_results(&results));
    Ok(())
}

async fn analyse(context: &BenchContext) -> Result<()> {
    let start = Instant::now();
    context.store().analyse().await?;
    info!("ANALYZE 완료: {:?}", start.elapsed());
    Ok(())
}

async fn vacuum(context: &BenchContext) -> Result<()> {
    let start = Instant::now();
    context.store().vacuum().await?;
    info!("VACUUM 완료: {:?}", start.elapsed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaybench_core::config::IngestConfig;
    use relaybench_core::models::event::Event;
    use relaybench_core::models::filter::Filter;
    use relaybench_core::ports::store::EventStore;
    use relaybench_pipeline::source::LinesSource;
    use relaybench_pipeline::verify::EventIdVerifier;
    use relaybench_storage::sqlite::SqliteEventStore;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_test::assert_err;

    #[test]
    fn cli_flags_override_config() {
        let args = Args::parse_from([
            "relaybench",
            "import",
            "--db",
            "/tmp/x.db",
            "--source",
            "data.jsonl",
            "--keep-db",
            "--skip-invalid",
        ]);
        let mut config = AppConfig::default_config();
        apply_overrides(&mut config, &args);

        assert_eq!(config.storage.db_path, Some(PathBuf::from("/tmp/x.db")));
        assert_eq!(config.ingest.source_path, PathBuf::from("data.jsonl"));
        assert!(!config.storage.reset_on_start);
        assert_eq!(config.ingest.invalid_record_policy, InvalidRecordPolicy::Skip);
    }

    #[test]
    fn only_import_commands_reset() {
        assert!(Args::parse_from(["relaybench", "all"]).command.imports());
        assert!(!Args::parse_from(["relaybench", "query"]).command.imports());
        assert!(!Args::parse_from(["relaybench", "vacuum"]).command.imports());
    }

    #[test]
    fn config_init_takes_path() {
        let args = Args::parse_from(["relaybench", "config-init", "out.json"]);
        assert_eq!(
            args.command,
            Command::ConfigInit {
                path: PathBuf::from("out.json")
            }
        );
    }

    #[tokio::test]
    async fn interrupt_flag_cuts_work_short() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let outcome = until_interrupted(std::future::pending::<Result<()>>(), &rx).await;
        let err = assert_err!(outcome);
        assert_eq!(err.to_string(), INTERRUPTED);
    }

    #[tokio::test]
    async fn closed_interrupt_channel_never_fires() {
        let (tx, rx) = watch::channel(false);
        drop(tx);

        let waited = tokio::time::timeout(Duration::from_millis(20), interrupted(rx)).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn interrupt_stops_ingest_before_finish() {
        let store = Arc::new(SqliteEventStore::open_in_memory().unwrap());
        let controller = IngestionController::new(
            store.clone(),
            Arc::new(EventIdVerifier::new()),
            &IngestConfig::default(),
        );
        let state = controller.state();
        let samples = controller.samples();
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let lines = (0..1_000u32).map(|i| {
            Event::build(format!("{i:064x}"), 1, 3, vec![], "", "d".repeat(128))
                .unwrap()
                .to_json()
                .unwrap()
        });
        let source = LinesSource::new(lines);
        let outcome = ingest_until_interrupted(controller, Box::new(source), &rx).await;

        let err = assert_err!(outcome);
        assert_eq!(err.to_string(), INTERRUPTED);
        assert!(state.borrow().is_running());
        assert!(samples.has_changed().is_err());
        assert!(store.count(&Filter::new()).await.unwrap() < 1_000);
    }
}
