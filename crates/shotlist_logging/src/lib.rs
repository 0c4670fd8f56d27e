#![deny(missing_docs)]
//! Logging helpers shared by the shotlist crates.
//!
//! Every crate logs through the `scan_*` macros so the facade can be swapped
//! in one place. Binaries install a `simplelog` backend; tests use
//! [`initialize_for_tests`].

/// Logs a trace-level message.
#[macro_export]
macro_rules! scan_trace {
    ($($arg:tt)*) => {{
        log::trace!(target: "shotlist", $($arg)*);
    }};
}

/// Logs a debug-level message.
#[macro_export]
macro_rules! scan_debug {
    ($($arg:tt)*) => {{
        log::debug!(target: "shotlist", $($arg)*);
    }};
}

/// Logs an info-level message.
#[macro_export]
macro_rules! scan_info {
    ($($arg:tt)*) => {{
        log::info!(target: "shotlist", $($arg)*);
    }};
}

/// Logs a warn-level message.
#[macro_export]
macro_rules! scan_warn {
    ($($arg:tt)*) => {{
        log::warn!(target: "shotlist", $($arg)*);
    }};
}

/// Logs an error-level message.
#[macro_export]
macro_rules! scan_error {
    ($($arg:tt)*) => {{
        log::error!(target: "shotlist", $($arg)*);
    }};
}

/// Level used by [`initialize_for_tests`]: debug in debug builds, info otherwise.
pub fn default_test_level() -> log::LevelFilter {
    if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
}

/// Installs a terminal logger for tests.
///
/// Safe to call from every test: a second installation is silently ignored.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

    let _ = TermLogger::init(
        default_test_level(),
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Never,
    );
}
