//! Bounded register polling with deadline and cancellation.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::acquisition::common::error::{CameraError, Result};

/// What a polling loop is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerCondition {
    /// The software trigger busy bit to clear.
    SoftwareTriggerReady,
    /// The camera to report it is armed for an external trigger.
    HardwareArmed,
}

impl fmt::Display for TriggerCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerCondition::SoftwareTriggerReady => f.write_str("software trigger ready"),
            TriggerCondition::HardwareArmed => f.write_str("hardware trigger armed"),
        }
    }
}

/// Shared flag that aborts any polling loop observing it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Limits for one polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub timeout: Duration,
    /// Pause between register reads. Zero spins.
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(2),
            interval: Duration::ZERO,
        }
    }
}

impl PollPolicy {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Calls `ready` until it returns `true`, the deadline passes, or `cancel` trips.
    /// `ready` runs at least once even with a zero timeout.
    pub fn wait_until<F>(
        &self,
        condition: TriggerCondition,
        cancel: Option<&CancellationToken>,
        mut ready: F,
    ) -> Result<u32>
    where
        F: FnMut() -> Result<bool>,
    {
        let started = Instant::now();
        let mut polls = 0u32;

        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(CameraError::Cancelled { condition });
            }

            polls = polls.saturating_add(1);
            if ready()? {
                return Ok(polls);
            }

            let elapsed = started.elapsed();
            if elapsed >= self.timeout {
                return Err(CameraError::TriggerTimeout { condition, elapsed });
            }

            if self.interval.is_zero() {
                std::hint::spin_loop();
            } else {
                std::thread::sleep(self.interval.min(self.timeout - elapsed));
            }
        }
    }
}
