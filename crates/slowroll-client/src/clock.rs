//! Time source for decisions.

use chrono::{DateTime, Utc};

/// Supplies the current UTC time.
///
/// Any `Fn() -> DateTime<Utc>` closure is a `Clock`, which is how tests
/// freeze or step time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<F> Clock for F
where
    F: Fn() -> DateTime<Utc> + Send + Sync,
{
    fn now(&self) -> DateTime<Utc> {
        self()
    }
}
