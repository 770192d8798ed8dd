#![deny(missing_docs)]
//! Shared logging utilities for the monitor workspace.
//!
//! This crate provides the `monitor_*` logging macros used by the pipeline
//! crates, a helper for clipping long values in log lines, and a test
//! initializer for the global logger.

/// Longest value written verbatim into a single log field.
pub const MAX_LOGGED_VALUE: usize = 512;

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! monitor_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! monitor_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! monitor_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! monitor_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! monitor_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Logs at info level, or at debug level when `quiet` is true.
///
/// Used where an operator preference demotes routine per-message lines.
#[macro_export]
macro_rules! monitor_info_unless {
    ($quiet:expr, $($arg:tt)*) => {{
        if $quiet {
            log::debug!($($arg)*);
        } else {
            log::info!($($arg)*);
        }
    }};
}

/// Clips `value` to [`MAX_LOGGED_VALUE`] characters for logging.
pub fn clip_for_log(value: &str) -> std::borrow::Cow<'_, str> {
    match value.char_indices().nth(MAX_LOGGED_VALUE) {
        Some((end, _)) => std::borrow::Cow::Owned(format!(
            "{}... ({} bytes total)",
            &value[..end],
            value.len()
        )),
        None => std::borrow::Cow::Borrowed(value),
    }
}

/// Installs a terminal logger for tests.
///
/// `MONITOR_TEST_LOG` (e.g. `trace`, `off`) overrides the default of `debug`.
/// Later calls keep whichever logger won the first install.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

    let level = test_level(std::env::var("MONITOR_TEST_LOG").ok().as_deref());
    let _ = TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Never);
}

fn test_level(requested: Option<&str>) -> log::LevelFilter {
    requested
        .and_then(|name| name.trim().parse().ok())
        .unwrap_or(log::LevelFilter::Debug)
}

#[cfg(test)]
mod tests {
    use super::{clip_for_log, test_level, MAX_LOGGED_VALUE};

    #[test]
    fn short_values_are_borrowed() {
        assert_eq!(clip_for_log("abc"), "abc");
    }

    #[test]
    fn long_values_are_clipped_on_char_boundary() {
        let value = "行".repeat(MAX_LOGGED_VALUE + 10);
        let clipped = clip_for_log(&value);
        assert!(clipped.starts_with(&"行".repeat(MAX_LOGGED_VALUE)));
        assert!(clipped.ends_with(&format!("({} bytes total)", value.len())));
    }

    #[test]
    fn test_level_follows_the_environment_name() {
        assert_eq!(test_level(None), log::LevelFilter::Debug);
        assert_eq!(test_level(Some(" trace ")), log::LevelFilter::Trace);
        assert_eq!(test_level(Some("off")), log::LevelFilter::Off);
        assert_eq!(test_level(Some("chatty")), log::LevelFilter::Debug);
    }
}
