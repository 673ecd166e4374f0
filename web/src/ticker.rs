use gloo::timers::callback::{Interval, Timeout};

enum Handle {
    Repeat(Interval),
    Once(Timeout),
}

/// Owns at most one pending timer. Dropping the ticker cancels it.
#[derive(Default)]
pub(crate) struct Ticker {
    handle: Option<Handle>,
    period_ms: Option<u32>,
}

impl Ticker {
    /// Calls `callback` every `period_ms`, replacing any running timer.
    pub(crate) fn start(&mut self, period_ms: u32, callback: impl FnMut() + 'static) {
        self.stop();
        self.handle = Some(Handle::Repeat(Interval::new(period_ms, callback)));
        self.period_ms = Some(period_ms);
    }

    /// Calls `callback` once after `delay_ms`, replacing any running timer.
    pub(crate) fn once(&mut self, delay_ms: u32, callback: impl FnOnce() + 'static) {
        self.stop();
        self.handle = Some(Handle::Once(Timeout::new(delay_ms, callback)));
    }

    pub(crate) fn stop(&mut self) {
        match self.handle.take() {
            Some(Handle::Repeat(interval)) => {
                interval.cancel();
            }
            Some(Handle::Once(timeout)) => {
                timeout.cancel();
            }
            None => {}
        }
        self.period_ms = None;
    }

    /// A fired one-shot timer counts as active until the next `stop` or start.
    pub(crate) fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    /// Period of the running repeating timer.
    pub(crate) fn period_ms(&self) -> Option<u32> {
        self.period_ms
    }
}
