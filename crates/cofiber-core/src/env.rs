//! Environment variable utilities
//!
//! Small parsing helpers used by configuration and logging.

use std::str::FromStr;

/// Get an environment variable parsed as `T`, falling back to `default`
/// when unset or unparseable.
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Get an environment variable as a boolean.
///
/// "1", "true", "yes" and "on" (case-insensitive) read as true; any other
/// set value reads as false; unset returns the default.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => matches!(val.to_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}
