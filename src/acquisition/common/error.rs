use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::acquisition::driver::DriverError;
use crate::acquisition::pipeline::{ConfigStep, PipelineState};
use crate::acquisition::roi::ConstraintError;
use crate::acquisition::trigger::TriggerCondition;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("{property} value {value} {units} outside accepted range ({min}, {max})")]
    PropertyRange {
        property: &'static str,
        value: f32,
        min: f32,
        max: f32,
        units: &'static str,
    },

    #[error("ROI constraint violated: {0}")]
    Constraint(#[from] ConstraintError),

    #[error("Timed out after {elapsed:?} waiting for {condition}")]
    TriggerTimeout {
        condition: TriggerCondition,
        elapsed: Duration,
    },

    #[error("Cancelled while waiting for {condition}")]
    Cancelled { condition: TriggerCondition },

    #[error("Failed to retrieve image for slot {slot_index}: {source}")]
    Retrieval {
        slot_index: usize,
        #[source]
        source: DriverError,
    },

    #[error("Image in slot {slot_index} is too short ({len} bytes) to carry a timestamp header")]
    MissingTimestamp { slot_index: usize, len: usize },

    #[error("Cannot normalize an empty timestamp batch")]
    EmptyBatch,

    #[error("Configuration failed at step '{step}': {source}")]
    Configuration {
        step: ConfigStep,
        #[source]
        source: Box<CameraError>,
    },

    #[error("Operation '{operation}' is not valid in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: PipelineState,
    },

    #[error("Requested {requested} triggers but the session only holds {capacity} images")]
    CapacityExceeded { requested: usize, capacity: usize },

    #[error("Failed to convert image in slot {slot_index}: {source}")]
    Conversion {
        slot_index: usize,
        #[source]
        source: DriverError,
    },

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Failed to persist {}: {reason}", .path.display())]
    Persist { path: PathBuf, reason: String },

    #[error("Invalid camera settings: {0}")]
    InvalidSettings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CameraError {
    pub(crate) fn configuration(step: ConfigStep, source: impl Into<CameraError>) -> Self {
        CameraError::Configuration {
            step,
            source: Box::new(source.into()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CameraError>;
