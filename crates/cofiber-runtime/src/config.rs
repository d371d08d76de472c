//! Scheduler configuration
//!
//! Compile-time defaults with runtime environment overrides.
//!
//! # Environment Variables
//!
//! - `COFIBER_STACK_SIZE` - Initial fiber stack size in bytes
//! - `COFIBER_TICK_MS` - Tick period in milliseconds
//! - `COFIBER_STACK_SLACK` - Headroom added above the captured stack base
//!
//! The idle-fiber hooks have no environment form; set them
//! programmatically with the builder methods.

use crate::idle::{default_low_power_wait, default_system_tasks};
use cofiber_core::env::env_get;
use cofiber_core::error::{SchedError, SchedResult};

/// Initial stack buffer size for a new fiber.
pub const DEFAULT_STACK_SIZE: usize = 2048;

/// Period of the timer tick callback, in milliseconds.
pub const DEFAULT_TICK_PERIOD_MS: u32 = 6;

/// Headroom added above the stack pointer captured at initialization when
/// no explicit stack base is configured.
pub const DEFAULT_STACK_BASE_SLACK: usize = 512;

/// Scheduler configuration with builder methods.
///
/// Use `from_env()` for defaults plus environment overrides, or `new()`
/// for the plain defaults.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Initial stack buffer size per fiber; grown on demand.
    pub stack_size: usize,
    /// Milliseconds added to the tick counter per timer callback.
    pub tick_period_ms: u32,
    /// Fixed top of the system stack. None captures the caller's stack
    /// pointer at initialization plus `stack_base_slack`.
    pub stack_base: Option<usize>,
    /// Headroom for the captured stack base.
    pub stack_base_slack: usize,
    /// Low-power wait primitive called by the idle fiber.
    pub low_power_wait: fn(),
    /// Housekeeping hook called by the idle fiber after the wait.
    pub system_tasks: fn(),
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl SchedulerConfig {
    /// Plain compile-time defaults, no environment lookups.
    pub fn new() -> Self {
        SchedulerConfig {
            stack_size: DEFAULT_STACK_SIZE,
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            stack_base: None,
            stack_base_slack: DEFAULT_STACK_BASE_SLACK,
            low_power_wait: default_low_power_wait,
            system_tasks: default_system_tasks,
        }
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        SchedulerConfig {
            stack_size: env_get("COFIBER_STACK_SIZE", DEFAULT_STACK_SIZE),
            tick_period_ms: env_get("COFIBER_TICK_MS", DEFAULT_TICK_PERIOD_MS),
            stack_base: None,
            stack_base_slack: env_get("COFIBER_STACK_SLACK", DEFAULT_STACK_BASE_SLACK),
            low_power_wait: default_low_power_wait,
            system_tasks: default_system_tasks,
        }
    }

    // Builder methods

    pub fn stack_size(mut self, size: usize) -> Self {
        self.stack_size = size;
        self
    }

    pub fn tick_period_ms(mut self, ms: u32) -> Self {
        self.tick_period_ms = ms;
        self
    }

    pub fn stack_base(mut self, base: usize) -> Self {
        self.stack_base = Some(base);
        self
    }

    pub fn stack_base_slack(mut self, slack: usize) -> Self {
        self.stack_base_slack = slack;
        self
    }

    pub fn low_power_wait(mut self, hook: fn()) -> Self {
        self.low_power_wait = hook;
        self
    }

    pub fn system_tasks(mut self, hook: fn()) -> Self {
        self.system_tasks = hook;
        self
    }

    /// Reject configurations the scheduler cannot run with.
    pub fn validate(&self) -> SchedResult<()> {
        if self.stack_size < 64 {
            return Err(SchedError::InvalidConfig("stack_size must be >= 64"));
        }
        if self.tick_period_ms == 0 {
            return Err(SchedError::InvalidConfig("tick_period_ms must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = SchedulerConfig::new();
        assert_eq!(config.stack_size, DEFAULT_STACK_SIZE);
        assert_eq!(config.tick_period_ms, DEFAULT_TICK_PERIOD_MS);
        assert!(config.stack_base.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = SchedulerConfig::new()
            .stack_size(4096)
            .tick_period_ms(1)
            .stack_base(0x2000_0000);
        assert_eq!(config.stack_size, 4096);
        assert_eq!(config.tick_period_ms, 1);
        assert_eq!(config.stack_base, Some(0x2000_0000));
    }

    #[test]
    fn test_validation_rejects() {
        assert!(SchedulerConfig::new().stack_size(0).validate().is_err());
        assert!(SchedulerConfig::new().tick_period_ms(0).validate().is_err());
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("COFIBER_STACK_SIZE", "8192");
        let config = SchedulerConfig::from_env();
        assert_eq!(config.stack_size, 8192);
        std::env::remove_var("COFIBER_STACK_SIZE");
    }
}
