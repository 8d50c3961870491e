//! Camera driver module
//!
//! This module defines the seam between the acquisition core and a native camera driver:
//! the driver trait, its value types, the status taxonomy and the register map, plus an
//! in-process simulated camera.

mod interface;
pub mod registers;
mod simulated;
mod status;
mod types;

pub use interface::{CameraDriver, DriverResult};
pub use simulated::SimulatedCamera;
pub use status::{DriverError, DriverStatus};
pub use types::{
    BandwidthAllocation, BayerTileFormat, BusSpeed, DriverConfig, FileFormat, Format7Settings,
    GrabMode, Image, PixelFormat, SensorSize, SessionHandle, TriggerMode,
};
