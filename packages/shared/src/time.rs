//! Time-related utilities with clock abstraction for testability.

use chrono::{Local, NaiveDateTime};

/// Format used for the timestamp embedded in every chat line (`2024-01-02 15:04:05`).
pub const CHAT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get the current wall-clock time in the server's local timezone
    fn now(&self) -> NaiveDateTime;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: NaiveDateTime,
}

impl FixedClock {
    /// Create a new fixed clock with the given local time
    pub fn new(fixed_time: NaiveDateTime) -> Self {
        Self { fixed_time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.fixed_time
    }
}

/// Render a local time as `YYYY-MM-DD HH:MM:SS`
pub fn format_chat_timestamp(time: NaiveDateTime) -> String {
    time.format(CHAT_TIMESTAMP_FORMAT).to_string()
}
