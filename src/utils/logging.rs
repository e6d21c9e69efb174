//! Logging setup plus conditional macros gated by a module-level `ENABLE_LOGS` flag.
//!
//! Loop workers that run for the whole process lifetime define the flag so
//! their per-tick chatter can be silenced without touching `RUST_LOG`:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//!
//! use crate::{log_info, log_warn, log_error};
//!
//! log_info!("summary sent for {}", key);
//! ```

/// Initialize `env_logger` from `RUST_LOG`, defaulting to Info.
pub fn init() {
    // try_init so tests and embedders that already installed a logger keep it
    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_secs()
        .try_init();
}

/// Info-level log when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Warn-level log when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Error-level log when the calling module's `ENABLE_LOGS` is true.
///
/// Transport failures go through here; they never abort a loop.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
