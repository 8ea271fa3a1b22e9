//! Wall-clock source and timestamp rendering.
//!
//! Every component that reads the time takes an `Arc<dyn Clock>` so tests
//! can pin "now".

use chrono::{DateTime, Local, NaiveDate, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Render a timestamp the way it is prepended to textual content:
/// local wall-clock time with microseconds, e.g. `2025-03-01 09:15:02.123456`.
pub fn render_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string()
}

/// Local calendar date of a timestamp.
pub fn local_date(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Local).date_naive()
}
