use crate::acquisition::common::error::{CameraError, Result};
use crate::acquisition::timestamp::decoder::{SECOND_COUNT_PERIOD, Timestamp};

/// Rebases capture times (seconds) on the first entry and converts them to milliseconds.
pub fn normalize_batch(seconds: &[f64]) -> Result<Vec<f64>> {
    let first = *seconds.first().ok_or(CameraError::EmptyBatch)?;
    Ok(seconds.iter().map(|t| (t - first) * 1000.0).collect())
}

/// Timestamps of one acquisition, in retrieval order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimestampBatch {
    entries: Vec<Timestamp>,
}

impl TimestampBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, timestamp: Timestamp) {
        self.entries.push(timestamp);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Timestamp] {
        &self.entries
    }

    /// Decoded capture times, each within the 128 s counter period.
    pub fn seconds(&self) -> Vec<f64> {
        self.entries.iter().map(Timestamp::seconds).collect()
    }

    /// Capture times relative to the first frame, in milliseconds. A decrease between
    /// consecutive frames is taken as a wrap of the second counter.
    pub fn relative_millis(&self) -> Result<Vec<f64>> {
        let mut unwrapped = Vec::with_capacity(self.entries.len());
        let mut carry = 0.0;
        let mut previous: Option<f64> = None;

        for time in self.seconds() {
            if previous.is_some_and(|prev| time < prev) {
                carry += SECOND_COUNT_PERIOD;
            }
            previous = Some(time);
            unwrapped.push(time + carry);
        }

        normalize_batch(&unwrapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-6, "{a} != {e}");
        }
    }

    #[test]
    fn test_normalize_batch() {
        let millis = normalize_batch(&[10.0, 10.5, 11.2]).unwrap();
        assert_close(&millis, &[0.0, 500.0, 1200.0]);
        assert_eq!(millis[0], 0.0);
    }

    #[test]
    fn test_empty_batch_fails() {
        assert!(matches!(normalize_batch(&[]), Err(CameraError::EmptyBatch)));
        assert!(matches!(
            TimestampBatch::new().relative_millis(),
            Err(CameraError::EmptyBatch)
        ));
    }

    #[test]
    fn test_relative_millis_from_headers() {
        let mut batch = TimestampBatch::new();
        for t in [10.0, 10.5, 11.2] {
            batch.push(Timestamp::from_seconds(t));
        }
        assert_close(&batch.relative_millis().unwrap(), &[0.0, 500.0, 1200.0]);
    }

    #[test]
    fn test_relative_millis_unwraps_second_counter() {
        let mut batch = TimestampBatch::new();
        for t in [127.5, 127.9, 128.3] {
            batch.push(Timestamp::from_seconds(t));
        }
        assert_eq!(batch.entries()[2].second_count, 0);
        assert_close(&batch.relative_millis().unwrap(), &[0.0, 400.0, 800.0]);
    }
}
