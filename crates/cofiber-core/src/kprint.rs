//! Kernel-style print macros
//!
//! Leveled stderr output for scheduler debugging, configured once from the
//! environment.
//!
//! # Environment Variables
//!
//! - `COFIBER_LOG_LEVEL=<level>` - off, error, warn, info or debug
//!   (default: warn)
//! - `COFIBER_FLUSH_LOG=1` - flush stderr after each line
//!
//! # Usage
//!
//! ```ignore
//! use cofiber_core::{kdebug, kinfo, kwarn, kerror};
//!
//! kinfo!("scheduler up, tick period {}ms", period);
//! kwarn!("fiber allocation failed, running inline");
//! ```

use core::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Log severity, most severe first.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
}

impl LogLevel {
    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "[ERROR]",
            LogLevel::Warn => "[WARN ]",
            LogLevel::Info => "[INFO ]",
            LogLevel::Debug => "[DEBUG]",
        }
    }

    fn parse(s: &str) -> LogLevel {
        match s.to_lowercase().as_str() {
            "off" | "0" => LogLevel::Off,
            "error" | "1" => LogLevel::Error,
            "warn" | "2" => LogLevel::Warn,
            "info" | "3" => LogLevel::Info,
            "debug" | "4" => LogLevel::Debug,
            _ => LogLevel::Warn,
        }
    }
}

static LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Warn as u8);
static FLUSH: AtomicBool = AtomicBool::new(false);
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Read the environment once. Called implicitly on the first print; call
/// explicitly for deterministic startup.
pub fn init() {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }
    if let Ok(val) = std::env::var("COFIBER_LOG_LEVEL") {
        LEVEL.store(LogLevel::parse(&val) as u8, Ordering::Relaxed);
    }
    FLUSH.store(
        crate::env::env_get_bool("COFIBER_FLUSH_LOG", false),
        Ordering::Relaxed,
    );
}

/// Current log level.
pub fn log_level() -> LogLevel {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
    match LEVEL.load(Ordering::Relaxed) {
        0 => LogLevel::Off,
        1 => LogLevel::Error,
        2 => LogLevel::Warn,
        3 => LogLevel::Info,
        _ => LogLevel::Debug,
    }
}

/// Override the log level programmatically.
pub fn set_log_level(level: LogLevel) {
    INITIALIZED.store(true, Ordering::Relaxed);
    LEVEL.store(level as u8, Ordering::Relaxed);
}

#[doc(hidden)]
pub fn emit(level: LogLevel, args: fmt::Arguments<'_>) {
    if level > log_level() || level == LogLevel::Off {
        return;
    }
    let mut err = std::io::stderr().lock();
    let _ = writeln!(err, "{} {}", level.prefix(), args);
    if FLUSH.load(Ordering::Relaxed) {
        let _ = err.flush();
    }
}

#[macro_export]
macro_rules! kerror {
    ($($arg:tt)*) => {
        $crate::kprint::emit($crate::kprint::LogLevel::Error, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! kwarn {
    ($($arg:tt)*) => {
        $crate::kprint::emit($crate::kprint::LogLevel::Warn, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! kinfo {
    ($($arg:tt)*) => {
        $crate::kprint::emit($crate::kprint::LogLevel::Info, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! kdebug {
    ($($arg:tt)*) => {
        $crate::kprint::emit($crate::kprint::LogLevel::Debug, format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing() {
        assert_eq!(LogLevel::parse("off"), LogLevel::Off);
        assert_eq!(LogLevel::parse("ERROR"), LogLevel::Error);
        assert_eq!(LogLevel::parse("3"), LogLevel::Info);
        assert_eq!(LogLevel::parse("garbage"), LogLevel::Warn);
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Error < LogLevel::Debug);
        assert!(LogLevel::Off < LogLevel::Error);
    }

    #[test]
    fn test_set_level() {
        set_log_level(LogLevel::Debug);
        assert_eq!(log_level(), LogLevel::Debug);
        set_log_level(LogLevel::Warn);
        assert_eq!(log_level(), LogLevel::Warn);
    }
}
