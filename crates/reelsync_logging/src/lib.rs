#![deny(missing_docs)]
//! Shared logging utilities for the reelsync workspace.
//!
//! Every component logs through the `sync_*` macros below. The first
//! argument is a component name literal which becomes the log target
//! (`reelsync::<component>`), so a single subsystem can be filtered out of a
//! busy log without touching call sites.

/// Log target prefix shared by every component.
pub const TARGET_PREFIX: &str = "reelsync";

/// Logs a trace-level message for a component.
#[macro_export]
macro_rules! sync_trace {
    ($component:literal, $($arg:tt)+) => {{
        log::trace!(target: concat!("reelsync::", $component), $($arg)+);
    }};
}

/// Logs a debug-level message for a component.
#[macro_export]
macro_rules! sync_debug {
    ($component:literal, $($arg:tt)+) => {{
        log::debug!(target: concat!("reelsync::", $component), $($arg)+);
    }};
}

/// Logs an info-level message for a component.
#[macro_export]
macro_rules! sync_info {
    ($component:literal, $($arg:tt)+) => {{
        log::info!(target: concat!("reelsync::", $component), $($arg)+);
    }};
}

/// Logs a warn-level message for a component.
#[macro_export]
macro_rules! sync_warn {
    ($component:literal, $($arg:tt)+) => {{
        log::warn!(target: concat!("reelsync::", $component), $($arg)+);
    }};
}

/// Logs an error-level message for a component.
#[macro_export]
macro_rules! sync_error {
    ($component:literal, $($arg:tt)+) => {{
        log::error!(target: concat!("reelsync::", $component), $($arg)+);
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
