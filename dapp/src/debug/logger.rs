//! Logging initialization

use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use super::config::LogConfig;

/// Initialize the logging system
///
/// Sets up:
/// - An env-filtered, human-readable stderr layer
/// - Optional daily-rotated `dapp.log` under `config.log_dir`, written non-blocking
/// - A panic hook that routes panics through `tracing`
///
/// The returned guard flushes the file writer on drop and must be kept alive for as long as
/// logging is needed. Calling this twice leaves the first subscriber in place.
pub fn init(config: &LogConfig) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new("dapp=info,warn"));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .boxed();

    let mut guard = None;
    let file_layer = if config.enable_file_log {
        match fs::create_dir_all(&config.log_dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(&config.log_dir, "dapp.log");
                let (writer, worker_guard) = tracing_appender::non_blocking(appender);
                guard = Some(worker_guard);
                Some(
                    fmt::layer()
                        .with_writer(writer)
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true)
                        .with_ansi(false)
                        .boxed(),
                )
            }
            Err(e) => {
                eprintln!("Warning: Failed to create log directory: {}", e);
                None
            }
        }
    } else {
        None
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("Warning: Logging already initialized: {}", e);
        return guard;
    }

    tracing::info!(
        log_level = %config.log_level,
        file_log = config.enable_file_log,
        log_dir = %config.log_dir.display(),
        "Logging initialized"
    );

    setup_panic_hook();
    guard
}

/// Log panics with location and message before the default hook runs
fn setup_panic_hook() {
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown location".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic message".to_string()
        };

        tracing::error!(location = %location, message = %message, "Application panic");

        default_panic(panic_info);
    }));
}
