use std::time::Instant;

use chrono::Local;

use crate::date::CalendarDate;

/// Source of "today" for grid flags and of wall time for notice expiry.
pub trait Clock {
    fn today(&self) -> CalendarDate;
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> CalendarDate {
        CalendarDate::from(Local::now().date_naive())
    }

    fn now(&self) -> Instant {
        Instant::now()
    }
}
