//! Game and round countdown timers
//!
//! Timers are computed on demand from a captured start instant; nothing ticks
//! in the background.

use std::time::Instant;

/// A countdown with an optional length in seconds.
///
/// A setting of `None` is the NOT_SET state: the timer is not configured and
/// reports no remaining time at all, which is not the same as zero.
#[derive(Clone, Copy, Debug)]
pub struct Timer {
    setting: Option<u32>,
    started: Instant,
}

impl Default for Timer {
    fn default() -> Self {
        Self::unset()
    }
}

impl Timer {
    pub fn unset() -> Self {
        Self {
            setting: None,
            started: Instant::now(),
        }
    }

    /// Configure the timer length. Values below 1 collapse to NOT_SET.
    pub fn configure(&mut self, seconds: i32) {
        self.setting = u32::try_from(seconds).ok().filter(|&s| s >= 1);
        self.restart();
    }

    /// Install a remaining-time value received from the host
    pub fn set_remaining(&mut self, remaining: Option<u32>) {
        self.setting = remaining;
        self.restart();
    }

    pub fn restart(&mut self) {
        self.started = Instant::now();
    }

    pub fn setting(&self) -> Option<u32> {
        self.setting
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    /// Whole seconds since the last restart
    pub fn elapsed_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Seconds left, clamped at zero; `None` when not configured
    pub fn remaining(&self) -> Option<u32> {
        let setting = self.setting?;
        let elapsed = u32::try_from(self.elapsed_secs()).unwrap_or(u32::MAX);
        Some(setting.saturating_sub(elapsed))
    }
}
