use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Rolling frame-time statistics over the last `capacity` frames.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    samples: VecDeque<Duration>,
    capacity: usize,
    last_tick: Option<Instant>,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
            last_tick: None,
        }
    }

    /// Record the time since the previous tick. The first tick only arms the timer.
    pub fn tick(&mut self, now: Instant) {
        if let Some(last) = self.last_tick.replace(now) {
            self.record(now.duration_since(last));
        }
    }

    pub fn record(&mut self, dt: Duration) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(dt);
    }

    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        self.samples.iter().sum::<Duration>() / self.samples.len() as u32
    }

    pub fn min(&self) -> Duration {
        self.samples.iter().copied().min().unwrap_or_default()
    }

    pub fn max(&self) -> Duration {
        self.samples.iter().copied().max().unwrap_or_default()
    }

    /// Frames per second from the average frame time.
    pub fn fps(&self) -> f32 {
        let avg = self.average().as_secs_f32();
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new(120)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_statistics() {
        let mut timer = FrameTimer::new(3);
        for ms in [10, 20, 30] {
            timer.record(Duration::from_millis(ms));
        }
        assert_eq!(timer.count(), 3);
        assert_eq!(timer.average(), Duration::from_millis(20));
        assert_eq!(timer.min(), Duration::from_millis(10));
        assert_eq!(timer.max(), Duration::from_millis(30));
        assert!((timer.fps() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn oldest_sample_drops_out() {
        let mut timer = FrameTimer::new(2);
        for ms in [10, 20, 30] {
            timer.record(Duration::from_millis(ms));
        }
        assert_eq!(timer.count(), 2);
        assert_eq!(timer.average(), Duration::from_millis(25));
    }

    #[test]
    fn tick_measures_between_frames() {
        let t0 = Instant::now();
        let mut timer = FrameTimer::new(8);
        timer.tick(t0);
        assert_eq!(timer.count(), 0);
        timer.tick(t0 + Duration::from_millis(16));
        assert_eq!(timer.average(), Duration::from_millis(16));
    }

    #[test]
    fn empty_timer_reads_zero() {
        let timer = FrameTimer::default();
        assert_eq!(timer.average(), Duration::ZERO);
        assert_eq!(timer.fps(), 0.0);
    }
}
