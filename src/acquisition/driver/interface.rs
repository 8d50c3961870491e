use std::path::Path;

use crate::acquisition::driver::status::DriverError;
use crate::acquisition::driver::types::{
    DriverConfig, FileFormat, Format7Settings, Image, PixelFormat, SensorSize, SessionHandle,
    TriggerMode,
};

pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// The capability set the acquisition core needs from a native camera driver.
///
/// Every call that touches a camera is addressed through an explicit `SessionHandle`,
/// so several cameras can be driven from one process.
pub trait CameraDriver {
    fn create_session(&mut self) -> DriverResult<SessionHandle>;
    fn destroy_session(&mut self, session: SessionHandle) -> DriverResult<()>;
    fn connect(&mut self, session: SessionHandle, index: u32) -> DriverResult<()>;

    fn start_capture(&mut self, session: SessionHandle) -> DriverResult<()>;
    fn stop_capture(&mut self, session: SessionHandle) -> DriverResult<()>;

    fn set_configuration(&mut self, session: SessionHandle, config: &DriverConfig)
    -> DriverResult<()>;
    fn configuration(&mut self, session: SessionHandle) -> DriverResult<DriverConfig>;

    /// Full sensor size as reported by the camera's custom-mode info.
    fn sensor_size(&mut self, session: SessionHandle) -> DriverResult<SensorSize>;
    fn set_region_of_interest(
        &mut self,
        session: SessionHandle,
        settings: &Format7Settings,
    ) -> DriverResult<()>;

    fn set_trigger_mode(&mut self, session: SessionHandle, mode: &TriggerMode) -> DriverResult<()>;
    fn fire_software_trigger(&mut self, session: SessionHandle) -> DriverResult<()>;

    fn read_register(&mut self, session: SessionHandle, address: u32) -> DriverResult<u32>;
    fn write_register(&mut self, session: SessionHandle, address: u32, value: u32)
    -> DriverResult<()>;

    /// Blocks for the next buffered frame. A `Timeout` status means no frame arrived
    /// within the configured grab timeout.
    fn retrieve_buffer(&mut self, session: SessionHandle) -> DriverResult<Image>;

    fn convert_image(&mut self, image: &Image, target: PixelFormat) -> DriverResult<Image>;
    fn save_image(&mut self, image: &Image, path: &Path, format: FileFormat) -> DriverResult<()>;
}
