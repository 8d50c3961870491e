//! Acquisition pipeline module
//!
//! This module sequences a capture run against a camera driver: configuration, arming,
//! triggering, retrieval with timestamp decoding, conversion and persistence.

mod camera_pipeline;
mod session;
mod settings;
mod slots;
mod state;
mod timing;


pub use camera_pipeline::AcquisitionPipeline;
pub use session::{AcquisitionSession, AcquisitionSessionBuilder};
pub use settings::CameraSettings;
pub use slots::ImageSlot;
pub use state::{ConfigStep, PipelineState};
pub use timing::{PipelineTimings, StepTiming, Timer};
