use chrono::{DateTime, Utc};

/// Source of the current time for expiry computation and purge selection.
pub trait TimeProvider: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<F> TimeProvider for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
