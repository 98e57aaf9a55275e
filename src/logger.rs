use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::Config;

/// Set up application logging based on configuration.
///
/// `RUST_LOG` wins over the configured level. The returned guard must be
/// held until exit so buffered file output is flushed.
pub fn setup_logging(config: &Config) -> Option<WorkerGuard> {
    // Initialize tracing filter with level from config
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level()));

    match config.log_file_path() {
        // No file configured, log to stderr
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .finish();
            if tracing::subscriber::set_global_default(subscriber).is_err() {
                eprintln!("Global tracing subscriber already set");
            }
            None
        }
        Some(path) => match create_file_logger(path) {
            Ok((file_writer, guard)) => {
                let subscriber = FmtSubscriber::builder()
                    .with_env_filter(env_filter)
                    .with_ansi(false)
                    .with_writer(file_writer)
                    .finish();
                if tracing::subscriber::set_global_default(subscriber).is_err() {
                    eprintln!("Global tracing subscriber already set");
                }
                Some(guard)
            }
            // Fall back to stderr rather than running without logs
            Err(e) => {
                eprintln!("Failed to open log file {}: {}, logging to stderr", path, e);
                let subscriber = FmtSubscriber::builder()
                    .with_env_filter(env_filter)
                    .with_writer(std::io::stderr)
                    .finish();
                let _ = tracing::subscriber::set_global_default(subscriber);
                None
            }
        },
    }
}

// Create file logger
fn create_file_logger(path: &str) -> std::io::Result<(NonBlocking, WorkerGuard)> {
    let log_path = std::path::PathBuf::from(path);
    // A bare file name goes into the default data directory
    let log_dir = log_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .or_else(|| dirs::data_local_dir().map(|d| d.join("reddit-wallpaper").join("logs")))
        .unwrap_or_else(|| std::path::PathBuf::from("."));

    // Create the directory if it doesn't exist
    std::fs::create_dir_all(&log_dir)?;

    let log_file_name = log_path
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("reddit-wallpaper.log"));

    // Custom paths use a simple non-rotating appender
    let file_appender = tracing_appender::rolling::never(&log_dir, log_file_name);
    Ok(tracing_appender::non_blocking(file_appender))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_file_logger_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("run.log");

        let (_writer, guard) = create_file_logger(path.to_str().unwrap()).unwrap();
        drop(guard);

        assert!(dir.path().join("logs").is_dir());
    }
}
