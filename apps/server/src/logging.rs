//! Tracing subscriber setup.
//!
//! Console output is always enabled. File output is optional and uses a
//! non-blocking rolling appender whose worker guard must be held for as long
//! as the process logs.

use crate::config::LoggingConfig;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Keeps background log writers alive. Dropping it flushes pending file output.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

fn rotation_from_str(value: &str) -> Rotation {
    match value.to_ascii_lowercase().as_str() {
        "hourly" => Rotation::HOURLY,
        "minutely" => Rotation::MINUTELY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{level},participant_manager={level},tower_http=info,sqlx=warn"
        ))
    })
}

/// Install the global subscriber described by `config`.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<LoggingGuard> {
    let console_layer = if config.json {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    };

    let (file_layer, file_guard) = if config.file_enabled {
        std::fs::create_dir_all(&config.file_directory)?;
        let appender = RollingFileAppender::new(
            rotation_from_str(&config.file_rotation),
            &config.file_directory,
            &config.file_prefix,
        );
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(writer)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
