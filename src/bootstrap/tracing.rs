//! Tracing configuration for tokenview
//!
//! Installs the global `tracing-subscriber` registry: an env-filter, a
//! console layer on stderr (stdout carries the JSON render output), and an
//! optional non-blocking file layer when `[logging].log_dir` is set.
//!
//! `log` records emitted by dependencies such as `reqwest` are bridged into
//! tracing by the subscriber's `tracing-log` integration.
//! 依赖库通过 `log` 输出的记录会被桥接到 tracing。

use std::{fs, io, path::Path, sync::OnceLock};

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, prelude::*, registry, EnvFilter};
use tv_core::settings::LoggingSettings;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOG_FILE_NAME: &str = "tokenview.log";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

fn is_development() -> bool {
    cfg!(debug_assertions)
}

/// Build the default filter directives for tracing
///
/// ## Behavior / 行为
/// - **Development**: debug for the workspace crates
/// - **Production**: info for the workspace crates
/// - **Override**: `[logging].level` replaces the base level
/// - HTTP client internals stay at warn either way
fn build_filter_directives(is_dev: bool, level: Option<&str>) -> Vec<String> {
    let base = level.unwrap_or(if is_dev { "debug" } else { "info" });
    let crate_level = if is_dev { "debug" } else { "info" };
    vec![
        base.to_string(),
        "hyper=warn".to_string(),
        "hyper_util=warn".to_string(),
        "rustls=warn".to_string(),
        "reqwest=info".to_string(),
        format!("tv_app={}", level.unwrap_or(crate_level)),
        format!("tv_infra={}", level.unwrap_or(crate_level)),
    ]
}

/// Initialize the tracing subscriber
///
/// `RUST_LOG` takes precedence over the built-in directives. Call once,
/// before any work is spawned.
///
/// ## Errors / 错误
///
/// Returns `Err` if a subscriber is already registered or the filter
/// directives do not parse.
pub fn init_tracing_subscriber(settings: &LoggingSettings) -> anyhow::Result<()> {
    let directives = build_filter_directives(is_development(), settings.level.as_deref());
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(directives.join(","))?,
    };

    let console_layer = fmt::layer()
        .with_timer(fmt::time::ChronoUtc::new(TIME_FORMAT.to_string()))
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_ansi(cfg!(not(test)))
        .with_writer(BoxMakeWriter::new(io::stderr));

    let file_writer = match settings.log_dir.as_deref().map(build_file_writer) {
        Some(Ok(writer)) => Some(writer),
        Some(Err(err)) => {
            eprintln!("Failed to initialize file logging, using stderr only: {err}");
            None
        }
        None => None,
    };
    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_timer(fmt::time::ChronoUtc::new(TIME_FORMAT.to_string()))
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
    });

    registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}

fn build_file_writer(log_dir: &Path) -> anyhow::Result<NonBlocking> {
    fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    LOG_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Tracing log guard already initialized"))?;

    Ok(non_blocking)
}
