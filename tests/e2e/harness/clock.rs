use chrono::{NaiveDate, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Controllable time for date-dependent paths and asset names.
///
/// This clock can be passed to repositories and asset stores via
/// `with_time_provider()`. Time is in epoch milliseconds.
#[derive(Clone)]
pub struct MockClock {
    current: Arc<AtomicI64>,
}

impl MockClock {
    /// Creates a time provider function suitable for `with_time_provider()`.
    pub fn as_provider(&self) -> impl Fn() -> i64 + Send + Sync + 'static {
        let current = self.current.clone();
        move || current.load(Ordering::SeqCst)
    }
}

impl MockClock {
    /// Create a clock at 2024-06-01T09:00:00Z
    pub fn new() -> Self {
        Self::at_millis(1_717_232_400_000)
    }

    /// Create a clock at the given epoch milliseconds
    pub fn at_millis(millis: i64) -> Self {
        Self {
            current: Arc::new(AtomicI64::new(millis)),
        }
    }

    /// Get current timestamp
    pub fn now(&self) -> i64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Current UTC date
    pub fn today(&self) -> NaiveDate {
        Utc.timestamp_millis_opt(self.now())
            .single()
            .map(|t| t.date_naive())
            .expect("clock holds a valid timestamp")
    }

    /// Advance time by duration
    pub fn advance(&self, duration: Duration) {
        self.current
            .fetch_add(duration.as_millis() as i64, Ordering::SeqCst);
    }

    /// Advance time by days
    pub fn advance_days(&self, days: u64) {
        self.advance(Duration::from_secs(days * 86400));
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}
