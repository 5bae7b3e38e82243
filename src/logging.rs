//! Log setup. The terminal belongs to the UI, so logs only go to a file.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::domain::AppError;

/// Expand `~` and environment variables in a user supplied path.
pub fn expand_path(path: &str) -> Result<PathBuf, AppError> {
    let expanded = shellexpand::full(path).map_err(|e| AppError::LogPath(e.to_string()))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Install the global subscriber. Without a log file nothing is installed and
/// all events are dropped. `RUST_LOG` overrides `level`.
pub fn init_logging(log_file: Option<&str>, level: LevelFilter) -> Result<(), AppError> {
    let Some(log_file) = log_file else {
        return Ok(());
    };
    let path = expand_path(log_file)?;
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    tracing::info!("Logging to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_home_and_variables() {
        let home = std::env::var("HOME").unwrap();
        let path = expand_path("~/dyntable.log").unwrap();
        assert_eq!(path, PathBuf::from(format!("{home}/dyntable.log")));
        assert!(expand_path("$DYNTABLE_SURELY_UNSET_VARIABLE/x.log").is_err());
    }

    #[test]
    fn no_log_file_installs_nothing() {
        assert!(init_logging(None, LevelFilter::INFO).is_ok());
    }
}
