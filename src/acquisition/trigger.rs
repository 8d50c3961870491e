//! Trigger synchronization module
//!
//! This module sets the camera's trigger mode and implements the readiness handshakes
//! around software and hardware triggers.

mod poll;
mod synchronizer;

pub use poll::{CancellationToken, PollPolicy, TriggerCondition};
pub use synchronizer::{TriggerKind, TriggerSynchronizer};
