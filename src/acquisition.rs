//! Camera acquisition module
//!
//! This module controls a register-addressed machine-vision camera through a minimal
//! driver interface, with separate modules for register access, region-of-interest
//! rules, timestamp decoding, trigger handshakes, the capture pipeline and persistence.

pub mod common;
pub mod driver;
pub mod persist;
pub mod pipeline;
pub mod register;
pub mod roi;
pub mod timestamp;
pub mod trigger;

pub use common::{CameraError, Result};

pub use driver::{CameraDriver, DriverError, DriverStatus, SimulatedCamera};

pub use persist::{
    AcquisitionRecord, ImageWriter, NamingScheme, TiffCompression, TiffImageWriter,
    TiffPredictor, WriterConfig,
};

pub use pipeline::{
    AcquisitionPipeline, AcquisitionSession, CameraSettings, ConfigStep, PipelineState,
};

pub use roi::{Roi, RoiRequest};

pub use trigger::{CancellationToken, PollPolicy, TriggerKind};
