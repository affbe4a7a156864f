use std::time::{Duration, Instant};

/// Holds back the latest request until input has been quiet for a while.
///
/// Every [`request`](Self::request) replaces the pending value and restarts
/// the quiet period, so a burst of slider ticks collapses into one release.
#[derive(Debug, Clone)]
pub struct ResizeDebouncer<T> {
    quiet_period: Duration,
    pending: Option<(T, Instant)>,
    coalesced: u64,
}

impl<T> ResizeDebouncer<T> {
    pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(120);

    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            pending: None,
            coalesced: 0,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    pub fn request(&mut self, value: T, now: Instant) {
        if self.pending.is_some() {
            self.coalesced += 1;
        }
        self.pending = Some((value, now));
    }

    /// The pending value, once nothing new has arrived for the quiet period.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let (_, at) = self.pending.as_ref()?;
        if now.duration_since(*at) < self.quiet_period {
            return None;
        }
        self.pending.take().map(|(value, _)| value)
    }

    /// Release the pending value immediately.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Requests superseded before they were released.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}

impl<T> Default for ResizeDebouncer<T> {
    fn default() -> Self {
        Self::new(Self::DEFAULT_QUIET_PERIOD)
    }
}
