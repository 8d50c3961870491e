//! Frame timestamp module
//!
//! This module decodes the timestamp the camera embeds in every frame and rebases a
//! batch of them on the first trigger.

mod batch;
mod decoder;

pub use batch::{TimestampBatch, normalize_batch};
pub use decoder::{CYCLES_PER_SECOND, OFFSETS_PER_CYCLE, SECOND_COUNT_PERIOD, Timestamp};
