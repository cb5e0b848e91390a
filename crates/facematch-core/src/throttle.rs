//! Client-side request pacing for the remote service.

use std::time::Duration;

/// Default pause after each remote call.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Paces remote calls. The pipelines call [`Throttle::pause`] once after each
/// unit of remote work and nowhere else.
pub trait Throttle {
    fn pause(&mut self);
}

/// Sleeps a fixed interval on every pause.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    interval: Duration,
}

impl FixedDelay {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl Throttle for FixedDelay {
    fn pause(&mut self) {
        if !self.interval.is_zero() {
            tracing::trace!(interval_ms = self.interval.as_millis() as u64, "throttle");
            std::thread::sleep(self.interval);
        }
    }
}

impl<T: Throttle + ?Sized> Throttle for &mut T {
    fn pause(&mut self) {
        (**self).pause()
    }
}
