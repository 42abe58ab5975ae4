use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Tracks the end of the last successful collection.
///
/// Each cycle asks for the window `[last, now]` and commits its end once the
/// records were handed off, so a failed cycle is retried over the same range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionCursor {
    last: DateTime<Utc>,
}

impl CollectionCursor {
    /// A cursor whose first window covers one interval before `now`.
    pub fn new(interval: Duration, now: DateTime<Utc>) -> Self {
        let interval = TimeDelta::from_std(interval).unwrap_or(TimeDelta::zero());
        Self {
            last: now.checked_sub_signed(interval).unwrap_or(now),
        }
    }

    /// A cursor resuming after a previously committed collection.
    pub fn resume(last: DateTime<Utc>) -> Self {
        Self { last }
    }

    pub fn last(&self) -> DateTime<Utc> {
        self.last
    }

    /// The `(start, end)` window for a collection at `now`. The end never
    /// precedes the start, even if the clock went backwards.
    pub fn window(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.last, now.max(self.last))
    }

    /// Records that everything up to `end` was collected. The cursor never
    /// moves backwards.
    pub fn commit(&mut self, end: DateTime<Utc>) {
        if end > self.last {
            self.last = end;
        }
    }
}
