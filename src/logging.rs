//! Log setup: console plus an append-only log file.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;

use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub fn default_directive(verbose: bool, configured: Option<&str>) -> String {
    match configured {
        Some(level) if !verbose => level.to_string(),
        _ if verbose => "carlot=debug".to_string(),
        _ => "carlot=info".to_string(),
    }
}

/// Subscriber writing to stderr and, when given, to `log_file` without
/// ANSI colors.
pub fn build_subscriber(
    filter: EnvFilter,
    log_file: Option<File>,
) -> impl Subscriber + Send + Sync + 'static {
    let file_layer = log_file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(Arc::new(file))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
}

/// Open (creating parent directories) a log file for appending.
pub fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber. `RUST_LOG` wins over `level`.
pub fn init(log_file: Option<&Path>, verbose: bool, level: Option<&str>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, level)));

    let file = match log_file {
        Some(path) => Some(open_log_file(path).map_err(|e| {
            anyhow::anyhow!("Failed to open log file {}: {}", path.display(), e)
        })?),
        None => None,
    };

    build_subscriber(filter, file).try_init()?;
    Ok(())
}
