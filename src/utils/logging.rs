use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{EnvFilter, LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer, Registry};

use crate::utils::timing::TIMING_TARGET;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the non-blocking file writers flushing until dropped.
pub struct LoggingGuards {
    _writers: Vec<WorkerGuard>,
}

fn parse_log_level(value: &str) -> LevelFilter {
    match value.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" | "warning" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

/// Application events; timing records and chatty HTTP internals are left out.
fn service_targets(level: LevelFilter) -> Targets {
    Targets::new()
        .with_default(level)
        .with_target(TIMING_TARGET, LevelFilter::OFF)
        .with_target("hyper", LevelFilter::WARN)
        .with_target("hyper_util", LevelFilter::WARN)
        .with_target("reqwest", LevelFilter::WARN)
        .with_target("tower_http", level.min(LevelFilter::INFO))
}

fn timing_targets() -> Targets {
    Targets::new()
        .with_default(LevelFilter::OFF)
        .with_target(TIMING_TARGET, LevelFilter::INFO)
}

fn daily_writer(dir: &Path, file_name: &str, guards: &mut Vec<WorkerGuard>) -> NonBlocking {
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file_name));
    guards.push(guard);
    writer
}

/// Console plus daily-rolling `autofit.log`/`autofit.jsonl` and `timing.log`/`timing.jsonl`.
///
/// `RUST_LOG`, when set, overrides the console filter only.
pub fn init_logging(log_level: &str, log_dir: &str) -> LoggingGuards {
    let dir = Path::new(log_dir);
    if let Err(err) = fs::create_dir_all(dir) {
        eprintln!("Failed to create log directory {}: {err}", dir.display());
    }

    let level = parse_log_level(log_level);
    let mut guards = Vec::with_capacity(4);

    let console: BoxedLayer = match EnvFilter::try_from_default_env() {
        Ok(filter) => fmt::layer().with_filter(filter).boxed(),
        Err(_) => fmt::layer().with_filter(service_targets(level)).boxed(),
    };

    let layers: Vec<BoxedLayer> = vec![
        console,
        fmt::layer()
            .with_ansi(false)
            .with_writer(daily_writer(dir, "autofit.log", &mut guards))
            .with_filter(service_targets(level))
            .boxed(),
        fmt::layer()
            .json()
            .with_writer(daily_writer(dir, "autofit.jsonl", &mut guards))
            .with_filter(service_targets(level))
            .boxed(),
        fmt::layer()
            .with_ansi(false)
            .with_writer(daily_writer(dir, "timing.log", &mut guards))
            .with_filter(timing_targets())
            .boxed(),
        fmt::layer()
            .json()
            .with_writer(daily_writer(dir, "timing.jsonl", &mut guards))
            .with_filter(timing_targets())
            .boxed(),
    ];

    tracing_subscriber::registry().with(layers).init();

    LoggingGuards { _writers: guards }
}
