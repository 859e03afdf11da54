use crate::config::project_dirs;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Routes tracing output to `<data dir>/logs/dayplan.log`, rolled daily.
///
/// The terminal belongs to the UI, so nothing is logged to stdout/stderr.
/// Level comes from `RUST_LOG` (default `info`). Returns `None` when the log
/// directory is unavailable; the app then runs without logs.
pub fn init_file_logging() -> Option<WorkerGuard> {
    let logs_dir = project_dirs().ok()?.data_dir().join("logs");
    if let Err(e) = fs::create_dir_all(&logs_dir) {
        eprintln!("Warning: could not create logs directory: {}", e);
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&logs_dir, "dayplan.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .is_ok();
    installed.then_some(guard)
}
