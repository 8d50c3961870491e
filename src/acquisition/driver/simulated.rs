//! In-process camera that implements `CameraDriver` without hardware.
//!
//! The simulation keeps a register file with the same layout as the real camera and queues
//! one frame per trigger with an embedded timestamp. Fault knobs cover the trigger status
//! register, buffer retrieval and register writes.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::time::Duration;

use tracing::{debug, warn};

use crate::acquisition::driver::interface::{CameraDriver, DriverResult};
use crate::acquisition::driver::registers;
use crate::acquisition::driver::status::{DriverError, DriverStatus};
use crate::acquisition::driver::types::{
    BayerTileFormat, DriverConfig, FileFormat, Format7Settings, GrabMode, Image, PixelFormat,
    SensorSize, SessionHandle, TriggerMode,
};
use crate::acquisition::register::codec;
use crate::acquisition::timestamp::Timestamp;

const FEATURE_DEFAULT: u32 = registers::PRESENCE_INQ | registers::ON_OFF | registers::AUTO_MODE;
const SOFTWARE_SOURCE: u32 = 7;

fn default_registers() -> HashMap<u32, u32> {
    HashMap::from([
        (registers::INITIALIZE, 0),
        (registers::POWER, registers::POWER_ON),
        (registers::SOFTWARE_TRIGGER, 0),
        (registers::AUTO_EXPOSURE, FEATURE_DEFAULT),
        (registers::SHARPNESS, FEATURE_DEFAULT),
        (registers::GAMMA, FEATURE_DEFAULT),
        (registers::SHUTTER, FEATURE_DEFAULT),
        (registers::GAIN, FEATURE_DEFAULT),
        (registers::PAN, FEATURE_DEFAULT),
        (registers::TILT, FEATURE_DEFAULT),
        (registers::SHUTTER_ABS_MIN, codec::encode(0.000_01)),
        (registers::SHUTTER_ABS_MAX, codec::encode(1.0)),
        (registers::SHUTTER_ABS_VALUE, codec::encode(0.01)),
        (registers::GAIN_ABS_MIN, codec::encode(-2.0)),
        (registers::GAIN_ABS_MAX, codec::encode(24.0)),
        (registers::GAIN_ABS_VALUE, codec::encode(0.0)),
        (registers::FRAME_INFO, registers::PRESENCE_INQ),
    ])
}

pub struct SimulatedCamera {
    sensor: SensorSize,
    next_session: u64,
    session: Option<SessionHandle>,
    connected: bool,
    capturing: bool,
    config: DriverConfig,
    buffer_limit: Option<u32>,
    roi: Option<Format7Settings>,
    trigger_mode: Option<TriggerMode>,
    registers: HashMap<u32, u32>,
    register_writes: Vec<(u32, u32)>,
    queue: VecDeque<Image>,
    stale_frames: usize,
    clock_seconds: f64,
    frame_interval: Duration,
    busy_reads: u32,
    busy_remaining: u32,
    stuck_busy: bool,
    armed_after_reads: u32,
    trigger_status_reads: u32,
    triggers_fired: usize,
    frames_produced: u32,
    dropped_frames: usize,
    failing_write: Option<u32>,
    retrieve_budget: Option<usize>,
    truncated_frame: Option<u32>,
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCamera {
    /// A 1280x960 camera whose clock starts at 10 s and advances 50 ms per frame.
    pub fn new() -> Self {
        Self {
            sensor: SensorSize::new(1280, 960),
            next_session: 1,
            session: None,
            connected: false,
            capturing: false,
            config: DriverConfig::default(),
            buffer_limit: None,
            roi: None,
            trigger_mode: None,
            registers: default_registers(),
            register_writes: Vec::new(),
            queue: VecDeque::new(),
            stale_frames: 0,
            clock_seconds: 10.0,
            frame_interval: Duration::from_millis(50),
            busy_reads: 0,
            busy_remaining: 0,
            stuck_busy: false,
            armed_after_reads: 0,
            trigger_status_reads: 0,
            triggers_fired: 0,
            frames_produced: 0,
            dropped_frames: 0,
            failing_write: None,
            retrieve_budget: None,
            truncated_frame: None,
        }
    }

    pub fn with_sensor(mut self, sensor: SensorSize) -> Self {
        self.sensor = sensor;
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn with_start_time(mut self, seconds: f64) -> Self {
        self.clock_seconds = seconds;
        self
    }

    /// Frames left over from an earlier run, delivered as soon as capture starts.
    pub fn with_stale_frames(mut self, count: usize) -> Self {
        self.stale_frames = count;
        self
    }

    /// Caps the buffer count the driver accepts, the way some transports do.
    pub fn with_buffer_limit(mut self, limit: u32) -> Self {
        self.buffer_limit = Some(limit);
        self
    }

    /// Number of status reads that report busy after each software trigger.
    pub fn set_busy_reads(&mut self, reads: u32) {
        self.busy_reads = reads;
    }

    pub fn set_trigger_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// Status reads before the armed bit is reported.
    pub fn set_armed_after_reads(&mut self, reads: u32) {
        self.armed_after_reads = reads;
    }

    pub fn fail_register_write(&mut self, address: u32) {
        self.failing_write = Some(address);
    }

    /// Only the next `count` retrievals succeed; later ones fail with a driver error.
    pub fn fail_retrieve_after(&mut self, count: usize) {
        self.retrieve_budget = Some(count);
    }

    /// The `index`-th frame produced (counting from 0) arrives cut short to two bytes.
    pub fn set_truncated_frame(&mut self, index: u32) {
        self.truncated_frame = Some(index);
    }

    pub fn register_writes(&self) -> &[(u32, u32)] {
        &self.register_writes
    }

    pub fn triggers_fired(&self) -> usize {
        self.triggers_fired
    }

    pub fn trigger_status_reads(&self) -> u32 {
        self.trigger_status_reads
    }

    pub fn trigger_mode(&self) -> Option<TriggerMode> {
        self.trigger_mode
    }

    pub fn region_of_interest(&self) -> Option<Format7Settings> {
        self.roi
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn queued_frames(&self) -> usize {
        self.queue.len()
    }

    pub fn dropped_frames(&self) -> usize {
        self.dropped_frames
    }

    /// Delivers an external trigger pulse. Ignored unless a hardware trigger is enabled.
    pub fn simulate_hardware_pulse(&mut self) {
        let hardware = self
            .trigger_mode
            .is_some_and(|mode| mode.on_off && mode.source != SOFTWARE_SOURCE);
        if self.capturing && hardware {
            self.capture_frame();
        }
    }

    fn check_session(&self, session: SessionHandle) -> DriverResult<()> {
        if self.session == Some(session) {
            Ok(())
        } else {
            Err(DriverError::with_context(
                DriverStatus::InvalidParameter,
                format!("unknown session {}", session.0),
            ))
        }
    }

    fn check_connected(&self, session: SessionHandle) -> DriverResult<()> {
        self.check_session(session)?;
        if self.connected {
            Ok(())
        } else {
            Err(DriverError::new(DriverStatus::NotConnected))
        }
    }

    fn frame_geometry(&self) -> (u32, u32, PixelFormat) {
        match self.roi {
            Some(roi) => (roi.width, roi.height, roi.pixel_format),
            None => (self.sensor.width, self.sensor.height, PixelFormat::Raw8),
        }
    }

    fn generate_frame(&mut self) -> Image {
        let (cols, rows, pixel_format) = self.frame_geometry();
        let bpp = pixel_format.bytes_per_pixel().unwrap_or(1);
        let stride = cols as usize * bpp;
        let seed = self.frames_produced as usize;

        let mut data: Vec<u8> = (0..rows as usize * stride)
            .map(|i| ((i % stride + i / stride + seed) % 256) as u8)
            .collect();

        let frame_info = self.registers.get(&registers::FRAME_INFO).copied().unwrap_or(0);
        if frame_info & registers::FRAME_INFO_TIMESTAMP != 0 && data.len() >= 4 {
            let header = Timestamp::from_seconds(self.clock_seconds).encode();
            data[..4].copy_from_slice(&header);
        }
        if self.truncated_frame == Some(self.frames_produced) {
            data.truncate(2);
        }

        self.frames_produced += 1;
        self.clock_seconds += self.frame_interval.as_secs_f64();

        Image {
            rows,
            cols,
            stride: stride as u32,
            pixel_format,
            bayer_format: BayerTileFormat::Rggb,
            data,
        }
    }

    fn capture_frame(&mut self) {
        let frame = self.generate_frame();
        let capacity = self.config.num_buffers.max(1) as usize;

        if self.queue.len() >= capacity {
            self.dropped_frames += 1;
            match self.config.grab_mode {
                GrabMode::DropFrames => {
                    self.queue.pop_front();
                    self.queue.push_back(frame);
                }
                _ => warn!("Simulated buffer full, discarding newest frame"),
            }
        } else {
            self.queue.push_back(frame);
        }
    }
}

impl CameraDriver for SimulatedCamera {
    fn create_session(&mut self) -> DriverResult<SessionHandle> {
        let session = SessionHandle(self.next_session);
        self.next_session += 1;
        self.session = Some(session);
        self.connected = false;
        Ok(session)
    }

    fn destroy_session(&mut self, session: SessionHandle) -> DriverResult<()> {
        self.check_session(session)?;
        self.session = None;
        self.connected = false;
        self.capturing = false;
        self.queue.clear();
        Ok(())
    }

    fn connect(&mut self, session: SessionHandle, index: u32) -> DriverResult<()> {
        self.check_session(session)?;
        if index != 0 {
            return Err(DriverError::with_context(
                DriverStatus::NotFound,
                format!("camera index {index}"),
            ));
        }
        self.connected = true;
        Ok(())
    }

    fn start_capture(&mut self, session: SessionHandle) -> DriverResult<()> {
        self.check_connected(session)?;
        if self.capturing {
            return Err(DriverError::new(DriverStatus::IsochAlreadyStarted));
        }
        self.capturing = true;
        for _ in 0..self.stale_frames {
            self.capture_frame();
        }
        Ok(())
    }

    fn stop_capture(&mut self, session: SessionHandle) -> DriverResult<()> {
        self.check_connected(session)?;
        if !self.capturing {
            return Err(DriverError::new(DriverStatus::IsochNotStarted));
        }
        self.capturing = false;
        Ok(())
    }

    fn set_configuration(
        &mut self,
        session: SessionHandle,
        config: &DriverConfig,
    ) -> DriverResult<()> {
        self.check_connected(session)?;
        if config.num_buffers == 0 {
            return Err(DriverError::with_context(
                DriverStatus::InvalidSettings,
                "num_buffers must be positive",
            ));
        }
        let mut accepted = config.clone();
        if let Some(limit) = self.buffer_limit {
            accepted.num_buffers = accepted.num_buffers.min(limit);
        }
        self.config = accepted;
        Ok(())
    }

    fn configuration(&mut self, session: SessionHandle) -> DriverResult<DriverConfig> {
        self.check_connected(session)?;
        Ok(self.config.clone())
    }

    fn sensor_size(&mut self, session: SessionHandle) -> DriverResult<SensorSize> {
        self.check_connected(session)?;
        Ok(self.sensor)
    }

    fn set_region_of_interest(
        &mut self,
        session: SessionHandle,
        settings: &Format7Settings,
    ) -> DriverResult<()> {
        self.check_connected(session)?;
        let fits = settings.width > 0
            && settings.height > 0
            && settings.offset_x + settings.width <= self.sensor.width
            && settings.offset_y + settings.height <= self.sensor.height;
        if !fits {
            return Err(DriverError::with_context(
                DriverStatus::InvalidSettings,
                "format7 window outside sensor",
            ));
        }
        self.roi = Some(*settings);
        Ok(())
    }

    fn set_trigger_mode(&mut self, session: SessionHandle, mode: &TriggerMode) -> DriverResult<()> {
        self.check_connected(session)?;
        self.trigger_mode = Some(*mode);
        Ok(())
    }

    fn fire_software_trigger(&mut self, session: SessionHandle) -> DriverResult<()> {
        self.check_connected(session)?;
        let software = self
            .trigger_mode
            .is_some_and(|mode| mode.on_off && mode.source == SOFTWARE_SOURCE);
        if !software {
            return Err(DriverError::with_context(
                DriverStatus::TriggerFailed,
                "software trigger not enabled",
            ));
        }
        self.triggers_fired += 1;
        self.busy_remaining = self.busy_reads;
        if self.capturing {
            self.capture_frame();
        }
        Ok(())
    }

    fn read_register(&mut self, session: SessionHandle, address: u32) -> DriverResult<u32> {
        self.check_connected(session)?;
        if address == registers::SOFTWARE_TRIGGER {
            self.trigger_status_reads += 1;
            let mut status = 0;
            if self.stuck_busy || self.busy_remaining > 0 {
                status |= registers::TRIGGER_BUSY;
                self.busy_remaining = self.busy_remaining.saturating_sub(1);
            }
            if self.trigger_status_reads > self.armed_after_reads {
                status |= registers::TRIGGER_ARMED;
            }
            return Ok(status);
        }
        self.registers.get(&address).copied().ok_or_else(|| {
            DriverError::with_context(DriverStatus::ReadRegisterFailed, format!("{address:#06X}"))
        })
    }

    fn write_register(
        &mut self,
        session: SessionHandle,
        address: u32,
        value: u32,
    ) -> DriverResult<()> {
        self.check_connected(session)?;
        if self.failing_write == Some(address) {
            return Err(DriverError::with_context(
                DriverStatus::WriteRegisterFailed,
                format!("{address:#06X}"),
            ));
        }
        debug!(
            address = format_args!("{address:#06X}"),
            value = format_args!("{value:#010X}"),
            "Simulated register write"
        );
        self.register_writes.push((address, value));
        if address == registers::INITIALIZE && value & registers::INITIALIZE_RESET != 0 {
            self.registers = default_registers();
        } else {
            self.registers.insert(address, value);
        }
        Ok(())
    }

    fn retrieve_buffer(&mut self, session: SessionHandle) -> DriverResult<Image> {
        self.check_connected(session)?;
        if !self.capturing {
            return Err(DriverError::new(DriverStatus::IsochNotStarted));
        }
        if self.queue.is_empty() {
            return Err(DriverError::new(DriverStatus::Timeout));
        }
        if let Some(budget) = self.retrieve_budget.as_mut() {
            if *budget == 0 {
                return Err(DriverError::new(DriverStatus::IsochRetrieveBufferFailed));
            }
            *budget -= 1;
        }
        self.queue
            .pop_front()
            .ok_or_else(|| DriverError::new(DriverStatus::Timeout))
    }

    fn convert_image(&mut self, image: &Image, target: PixelFormat) -> DriverResult<Image> {
        if image.pixel_format == target {
            return Ok(image.clone());
        }
        let data = match (image.pixel_format, target) {
            (PixelFormat::Raw8 | PixelFormat::Mono8, PixelFormat::Bgr | PixelFormat::Rgb8) => {
                image.data.iter().flat_map(|&v| [v, v, v]).collect()
            }
            (PixelFormat::Raw8, PixelFormat::Mono8) => image.data.clone(),
            _ => {
                return Err(DriverError::with_context(
                    DriverStatus::ImageConversionFailed,
                    format!("{:?} -> {:?}", image.pixel_format, target),
                ));
            }
        };
        let bpp = target.bytes_per_pixel().unwrap_or(1) as u32;
        Ok(Image {
            rows: image.rows,
            cols: image.cols,
            stride: image.cols * bpp,
            pixel_format: target,
            bayer_format: BayerTileFormat::None,
            data,
        })
    }

    fn save_image(&mut self, image: &Image, path: &Path, format: FileFormat) -> DriverResult<()> {
        let bytes = match (format, image.pixel_format) {
            (FileFormat::Raw, _) => image.data.clone(),
            (FileFormat::Pgm, PixelFormat::Mono8 | PixelFormat::Raw8) => {
                let mut out = format!("P5\n{} {}\n255\n", image.cols, image.rows).into_bytes();
                out.extend_from_slice(&image.data);
                out
            }
            (FileFormat::Ppm, PixelFormat::Bgr) => {
                let mut out = format!("P6\n{} {}\n255\n", image.cols, image.rows).into_bytes();
                out.extend(image.data.chunks_exact(3).flat_map(|px| [px[2], px[1], px[0]]));
                out
            }
            _ => {
                return Err(DriverError::with_context(
                    DriverStatus::NotImplemented,
                    format!("{format:?} for {:?}", image.pixel_format),
                ));
            }
        };
        std::fs::write(path, bytes).map_err(|e| {
            DriverError::with_context(DriverStatus::ImageLibraryFailure, e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capturing_camera() -> (SimulatedCamera, SessionHandle) {
        let mut camera = SimulatedCamera::new();
        let session = camera.create_session().unwrap();
        camera.connect(session, 0).unwrap();
        camera
            .set_trigger_mode(
                session,
                &TriggerMode {
                    on_off: true,
                    source: SOFTWARE_SOURCE,
                    ..TriggerMode::default()
                },
            )
            .unwrap();
        camera.start_capture(session).unwrap();
        (camera, session)
    }

    #[test]
    fn test_rejects_foreign_session() {
        let mut camera = SimulatedCamera::new();
        let session = camera.create_session().unwrap();
        camera.connect(session, 0).unwrap();

        let err = camera.read_register(SessionHandle(99), registers::POWER).unwrap_err();
        assert_eq!(err.status, DriverStatus::InvalidParameter);
    }

    #[test]
    fn test_unknown_camera_index() {
        let mut camera = SimulatedCamera::new();
        let session = camera.create_session().unwrap();
        let err = camera.connect(session, 3).unwrap_err();
        assert_eq!(err.status, DriverStatus::NotFound);
    }

    #[test]
    fn test_trigger_queues_one_frame() {
        let (mut camera, session) = capturing_camera();
        camera.fire_software_trigger(session).unwrap();

        let image = camera.retrieve_buffer(session).unwrap();
        assert_eq!((image.cols, image.rows), (1280, 960));
        assert_eq!(image.data.len(), 1280 * 960);

        let err = camera.retrieve_buffer(session).unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_embedded_timestamp_follows_frame_info_register() {
        let (mut camera, session) = capturing_camera();
        camera
            .write_register(
                session,
                registers::FRAME_INFO,
                registers::PRESENCE_INQ | registers::FRAME_INFO_TIMESTAMP,
            )
            .unwrap();

        camera.fire_software_trigger(session).unwrap();
        camera.fire_software_trigger(session).unwrap();

        let first = camera.retrieve_buffer(session).unwrap();
        let second = camera.retrieve_buffer(session).unwrap();
        let t0 = Timestamp::decode(first.header_bytes().unwrap()).seconds();
        let t1 = Timestamp::decode(second.header_bytes().unwrap()).seconds();
        assert!((t0 - 10.0).abs() < 1e-6);
        assert!((t1 - t0 - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_buffer_frames_mode_discards_newest_when_full() {
        let (mut camera, session) = capturing_camera();
        camera
            .set_configuration(
                session,
                &DriverConfig {
                    num_buffers: 2,
                    grab_mode: GrabMode::BufferFrames,
                    ..DriverConfig::default()
                },
            )
            .unwrap();

        for _ in 0..3 {
            camera.fire_software_trigger(session).unwrap();
        }

        assert_eq!(camera.queued_frames(), 2);
        assert_eq!(camera.dropped_frames(), 1);
    }

    #[test]
    fn test_reset_restores_default_registers() {
        let (mut camera, session) = capturing_camera();
        camera.write_register(session, registers::GAMMA, 0).unwrap();
        camera
            .write_register(session, registers::INITIALIZE, registers::INITIALIZE_RESET)
            .unwrap();
        assert_eq!(
            camera.read_register(session, registers::GAMMA).unwrap(),
            FEATURE_DEFAULT
        );
    }

    #[test]
    fn test_convert_raw_to_bgr() {
        let mut camera = SimulatedCamera::new();
        let raw = Image {
            rows: 1,
            cols: 2,
            stride: 2,
            pixel_format: PixelFormat::Raw8,
            bayer_format: BayerTileFormat::Rggb,
            data: vec![7, 9],
        };
        let bgr = camera.convert_image(&raw, PixelFormat::Bgr).unwrap();
        assert_eq!(bgr.data, vec![7, 7, 7, 9, 9, 9]);
        assert_eq!(bgr.stride, 6);

        let err = camera.convert_image(&bgr, PixelFormat::Mono16).unwrap_err();
        assert_eq!(err.status, DriverStatus::ImageConversionFailed);
    }
}
