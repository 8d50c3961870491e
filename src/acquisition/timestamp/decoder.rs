//! Embedded frame timestamp decoding.
//!
//! The camera writes a 32-bit big-endian word into the first four bytes of each image:
//!
//! ```text
//!  31        25 24                  12 11            0
//! +------------+----------------------+---------------+
//! | second (7) |    cycle count (13)  | cycle off (12)|
//! +------------+----------------------+---------------+
//! ```
//!
//! Cycle counts run at 8 kHz and each cycle is split into 3072 offset ticks.

use serde::Serialize;

pub const CYCLES_PER_SECOND: f64 = 8000.0;
pub const OFFSETS_PER_CYCLE: f64 = 3072.0;
/// The 7-bit second counter wraps after this many seconds.
pub const SECOND_COUNT_PERIOD: f64 = 128.0;

const SECOND_BITS: u32 = 7;
const CYCLE_COUNT_BITS: u32 = 13;
const CYCLE_OFFSET_BITS: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Timestamp {
    pub second_count: u32,
    pub cycle_count: u32,
    pub cycle_offset: u32,
}

impl Timestamp {
    pub fn decode(header: [u8; 4]) -> Self {
        let word = u32::from_be_bytes(header);
        let offset_mask = (1 << CYCLE_OFFSET_BITS) - 1;
        let count_mask = (1 << CYCLE_COUNT_BITS) - 1;
        let second_mask = (1 << SECOND_BITS) - 1;

        Self {
            second_count: (word >> (CYCLE_COUNT_BITS + CYCLE_OFFSET_BITS)) & second_mask,
            cycle_count: (word >> CYCLE_OFFSET_BITS) & count_mask,
            cycle_offset: word & offset_mask,
        }
    }

    pub fn encode(&self) -> [u8; 4] {
        let word = (self.second_count << (CYCLE_COUNT_BITS + CYCLE_OFFSET_BITS))
            | (self.cycle_count << CYCLE_OFFSET_BITS)
            | self.cycle_offset;
        word.to_be_bytes()
    }

    /// Capture time in seconds within the 128 s counter period.
    pub fn seconds(&self) -> f64 {
        f64::from(self.second_count)
            + (f64::from(self.cycle_count) + f64::from(self.cycle_offset) / OFFSETS_PER_CYCLE)
                / CYCLES_PER_SECOND
    }

    /// Nearest representable timestamp for `seconds`, taken modulo the counter period.
    pub fn from_seconds(seconds: f64) -> Self {
        let wrapped = seconds.rem_euclid(SECOND_COUNT_PERIOD);
        let total_ticks =
            (wrapped * CYCLES_PER_SECOND * OFFSETS_PER_CYCLE).round() as u64;
        let ticks_per_second = (CYCLES_PER_SECOND * OFFSETS_PER_CYCLE) as u64;
        let ticks_per_cycle = OFFSETS_PER_CYCLE as u64;

        let second_count = (total_ticks / ticks_per_second) % SECOND_COUNT_PERIOD as u64;
        let within_second = total_ticks % ticks_per_second;

        Self {
            second_count: second_count as u32,
            cycle_count: (within_second / ticks_per_cycle) as u32,
            cycle_offset: (within_second % ticks_per_cycle) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowest_bit_is_cycle_offset() {
        let ts = Timestamp::decode([0x00, 0x00, 0x00, 0x01]);
        assert_eq!(ts.second_count, 0);
        assert_eq!(ts.cycle_count, 0);
        assert_eq!(ts.cycle_offset, 1);
        assert_eq!(ts.seconds(), 1.0 / 3072.0 / 8000.0);
    }

    #[test]
    fn test_field_boundaries() {
        let ts = Timestamp::decode([0xFE, 0x00, 0x00, 0x00]);
        assert_eq!(ts.second_count, 127);
        assert_eq!(ts.cycle_count, 0);

        let ts = Timestamp::decode([0x01, 0xFF, 0xF0, 0x00]);
        assert_eq!(ts.second_count, 0);
        assert_eq!(ts.cycle_count, 0x1FFF);
        assert_eq!(ts.cycle_offset, 0);

        let ts = Timestamp::decode([0x00, 0x00, 0x0F, 0xFF]);
        assert_eq!(ts.cycle_count, 0);
        assert_eq!(ts.cycle_offset, 0xFFF);
    }

    #[test]
    fn test_decode_time() {
        let ts = Timestamp {
            second_count: 3,
            cycle_count: 4000,
            cycle_offset: 1536,
        };
        assert!((ts.seconds() - (3.0 + 4000.5 / 8000.0)).abs() < 1e-12);
    }

    #[test]
    fn test_encode_inverts_decode() {
        let header = [0x5A, 0xC3, 0x1F, 0x07];
        assert_eq!(Timestamp::decode(header).encode(), header);
    }

    #[test]
    fn test_from_seconds() {
        let ts = Timestamp::from_seconds(10.5);
        assert_eq!(ts.second_count, 10);
        assert_eq!(ts.cycle_count, 4000);
        assert_eq!(ts.cycle_offset, 0);

        let wrapped = Timestamp::from_seconds(130.25);
        assert_eq!(wrapped.second_count, 2);
        assert_eq!(wrapped.cycle_count, 2000);
    }
}
