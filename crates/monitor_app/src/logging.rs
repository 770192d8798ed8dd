//! Logger setup for the monitor binary.
//!
//! File output is appended to `./monitor.log` in the current working directory.

use std::fs::{File, OpenOptions};
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

const LOG_FILE: &str = "./monitor.log";

/// Destination for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDestination {
    File,
    Terminal,
    Both,
}

/// Install the global logger. A file that cannot be created is reported on
/// stderr and skipped.
pub fn initialize(destination: LogDestination, level: LevelFilter) {
    let config = build_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if matches!(destination, LogDestination::Terminal | LogDestination::Both) {
        loggers.push(TermLogger::new(
            level,
            config.clone(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ));
    }
    if matches!(destination, LogDestination::File | LogDestination::Both) {
        if let Some(file_logger) = create_file_logger(level, config) {
            loggers.push(file_logger);
        }
    }
    if loggers.is_empty() {
        return;
    }

    let _ = CombinedLogger::init(loggers);
}

/// RFC 3339 timestamps; module targets only on error lines.
fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .set_thread_level(LevelFilter::Off)
        .build()
}

fn create_file_logger(level: LevelFilter, config: Config) -> Option<Box<WriteLogger<File>>> {
    match open_log_file(Path::new(LOG_FILE)) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!("bat-chat-monitor: logging to terminal only, {LOG_FILE} unavailable: {err}");
            None
        }
    }
}

/// Appends across runs so a restarted monitor keeps the earlier session.
fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn log_file_is_appended_not_truncated() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("monitor.log");

        writeln!(open_log_file(&path).unwrap(), "first session").unwrap();
        writeln!(open_log_file(&path).unwrap(), "second session").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first session\nsecond session\n");
    }

    #[test]
    fn missing_directory_is_an_error() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(open_log_file(&temp.path().join("absent").join("monitor.log")).is_err());
    }
}
