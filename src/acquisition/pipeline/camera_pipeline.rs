use std::fs::File;
use std::path::PathBuf;

use chrono::{DateTime, Local};
use tracing::{debug, info, instrument, warn};

use crate::acquisition::common::error::{CameraError, Result};
use crate::acquisition::driver::{
    BandwidthAllocation, BusSpeed, CameraDriver, DriverConfig, FileFormat, Format7Settings,
    GrabMode, SensorSize, SessionHandle, SimulatedCamera, registers,
};
use crate::acquisition::persist::{AcquisitionRecord, ImageWriter, NamingScheme};
use crate::acquisition::pipeline::session::AcquisitionSession;
use crate::acquisition::pipeline::slots::ImageSlot;
use crate::acquisition::pipeline::state::{ConfigStep, PipelineState};
use crate::acquisition::pipeline::timing::{PipelineTimings, Timer};
use crate::acquisition::register::Property;
use crate::acquisition::roi::{Roi, RoiDescription};
use crate::acquisition::timestamp::{Timestamp, TimestampBatch};
use crate::acquisition::trigger::{
    CancellationToken, PollPolicy, TriggerKind, TriggerSynchronizer,
};

/// Drives one camera through configure, arm, trigger, retrieve, convert and persist.
///
/// The pipeline owns the driver and the fixed slot array of the current run. Every
/// operation checks the current [`PipelineState`] and fails with
/// [`CameraError::InvalidState`] when called out of order.
pub struct AcquisitionPipeline<D: CameraDriver> {
    driver: D,
    session: SessionHandle,
    state: PipelineState,
    settings: Option<AcquisitionSession>,
    sensor: Option<SensorSize>,
    roi: Option<Roi>,
    buffer_depth: u32,
    trigger: TriggerSynchronizer,
    slots: Vec<ImageSlot>,
    fired: usize,
    capturing: bool,
    collection_timestamp: Option<DateTime<Local>>,
    files: Vec<PathBuf>,
    timings: PipelineTimings,
}

impl AcquisitionPipeline<SimulatedCamera> {
    /// A pipeline connected to a fresh simulated camera.
    pub fn simulated() -> Result<Self> {
        Self::connect(SimulatedCamera::new(), 0)
    }
}

impl<D: CameraDriver> AcquisitionPipeline<D> {
    /// Opens a driver session and connects to the camera at `index`.
    pub fn connect(mut driver: D, index: u32) -> Result<Self> {
        let session = driver.create_session()?;
        if let Err(e) = driver.connect(session, index) {
            if let Err(cleanup) = driver.destroy_session(session) {
                warn!("Failed to destroy session after connect error: {}", cleanup);
            }
            return Err(e.into());
        }
        info!(index, "Connected to camera");

        Ok(Self {
            driver,
            session,
            state: PipelineState::Idle,
            settings: None,
            sensor: None,
            roi: None,
            buffer_depth: 0,
            trigger: TriggerSynchronizer::default(),
            slots: Vec::new(),
            fired: 0,
            capturing: false,
            collection_timestamp: None,
            files: Vec::new(),
            timings: PipelineTimings::new(),
        })
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
        self.trigger.set_policy(policy);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.trigger.set_cancellation(Some(token));
        self
    }

    pub fn set_poll_policy(&mut self, policy: PollPolicy) {
        self.trigger.set_policy(policy);
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn session(&self) -> SessionHandle {
        self.session
    }

    pub fn settings(&self) -> Option<&AcquisitionSession> {
        self.settings.as_ref()
    }

    /// Normalized region pushed at configure, `None` for full-sensor runs.
    pub fn roi(&self) -> Option<&Roi> {
        self.roi.as_ref()
    }

    pub fn slots(&self) -> &[ImageSlot] {
        &self.slots
    }

    /// Number of software triggers fired in the current run.
    pub fn fired(&self) -> usize {
        self.fired
    }

    pub fn timings(&self) -> &PipelineTimings {
        &self.timings
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    fn expect_state(&self, operation: &'static str, allowed: &[PipelineState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(CameraError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn current_settings(&self, operation: &'static str) -> Result<&AcquisitionSession> {
        self.settings.as_ref().ok_or(CameraError::InvalidState {
            operation,
            state: self.state,
        })
    }

    /// Pushes the session to the camera and allocates one slot per image.
    ///
    /// Steps run in a fixed order and the first failure aborts the rest, reported as
    /// [`CameraError::Configuration`] naming the step. The pipeline stays `Idle` on error.
    #[instrument(skip_all, fields(num_images = session.num_images))]
    pub fn configure(&mut self, session: AcquisitionSession) -> Result<()> {
        self.expect_state("configure", &[PipelineState::Idle])?;
        let timer = Timer::start("configure");
        let handle = self.session;
        let num_buffers = session
            .buffer_count()
            .map_err(|e| CameraError::configuration(ConfigStep::Buffers, e))?;

        self.driver
            .write_register(handle, registers::POWER, registers::POWER_ON)
            .map_err(|e| CameraError::configuration(ConfigStep::Power, e))?;

        let requested = DriverConfig {
            num_buffers,
            grab_timeout_ms: session.grab_timeout_ms,
            grab_mode: GrabMode::BufferFrames,
            isoch_bus_speed: bus_speed(session.boost_framerate),
            async_bus_speed: bus_speed(session.boost_framerate),
            bandwidth_allocation: if session.boost_framerate {
                BandwidthAllocation::On
            } else {
                BandwidthAllocation::Unspecified
            },
            ..DriverConfig::default()
        };
        self.driver
            .set_configuration(handle, &requested)
            .map_err(|e| CameraError::configuration(ConfigStep::Buffers, e))?;

        let applied = self
            .driver
            .configuration(handle)
            .map_err(|e| CameraError::configuration(ConfigStep::BufferCheck, e))?;
        if (applied.num_buffers as usize) < session.num_images {
            return Err(CameraError::configuration(
                ConfigStep::BufferCheck,
                CameraError::InvalidSettings(format!(
                    "driver holds {} buffers but {} images were requested",
                    applied.num_buffers, session.num_images
                )),
            ));
        }

        let (sensor, roi) = self
            .configure_region(&session)
            .map_err(|e| CameraError::configuration(ConfigStep::Region, e))?;

        for (address, name) in registers::AUTONOMOUS_FEATURES {
            self.disable_feature(address)
                .map_err(|e| CameraError::configuration(ConfigStep::AutonomousFeatures, e))?;
            debug!(feature = name, "Disabled autonomous feature");
        }

        Property::EXPOSURE
            .enable_absolute_control(&mut self.driver, handle)
            .and_then(|_| {
                Property::EXPOSURE.set(&mut self.driver, handle, session.exposure_seconds())
            })
            .map_err(|e| CameraError::configuration(ConfigStep::Exposure, e))?;

        Property::GAIN
            .enable_absolute_control(&mut self.driver, handle)
            .and_then(|_| Property::GAIN.set(&mut self.driver, handle, session.gain_db))
            .map_err(|e| CameraError::configuration(ConfigStep::Gain, e))?;

        self.enable_embedded_timestamp()
            .map_err(|e| CameraError::configuration(ConfigStep::EmbeddedTimestamp, e))?;

        self.trigger
            .enable(&mut self.driver, handle, session.trigger)
            .map_err(|e| CameraError::configuration(ConfigStep::TriggerMode, e))?;

        info!(
            exposure_ms = session.exposure_ms,
            gain_db = session.gain_db,
            buffers = applied.num_buffers,
            roi = %roi.map(|r| r.to_string()).unwrap_or_else(|| "full sensor".to_string()),
            "Camera configured"
        );

        self.slots = vec![ImageSlot::default(); session.num_images];
        self.buffer_depth = applied.num_buffers;
        self.sensor = Some(sensor);
        self.roi = roi;
        self.settings = Some(session);
        self.fired = 0;
        self.files.clear();
        self.collection_timestamp = None;
        self.timings.record(timer);
        self.state = PipelineState::Configured;
        Ok(())
    }

    fn configure_region(
        &mut self,
        session: &AcquisitionSession,
    ) -> Result<(SensorSize, Option<Roi>)> {
        let sensor = self.driver.sensor_size(self.session)?;
        let Some(request) = session.roi else {
            return Ok((sensor, None));
        };

        let roi = request.resolve(sensor)?;
        let settings = Format7Settings {
            mode: 0,
            offset_x: roi.left,
            offset_y: roi.top,
            width: roi.width,
            height: roi.height,
            pixel_format: session.sensor_format,
        };
        self.driver.set_region_of_interest(self.session, &settings)?;
        Ok((sensor, Some(roi)))
    }

    fn disable_feature(&mut self, address: u32) -> Result<()> {
        let current = self.driver.read_register(self.session, address)?;
        let word = current & !(registers::ON_OFF | registers::AUTO_MODE);
        self.driver.write_register(self.session, address, word)?;
        Ok(())
    }

    fn enable_embedded_timestamp(&mut self) -> Result<()> {
        let current = self.driver.read_register(self.session, registers::FRAME_INFO)?;
        self.driver.write_register(
            self.session,
            registers::FRAME_INFO,
            current | registers::FRAME_INFO_TIMESTAMP,
        )?;
        Ok(())
    }

    /// Starts capture and throws away frames left in the driver's buffers.
    ///
    /// The drain stops at the first retrieval timeout and is bounded by the buffer depth.
    #[instrument(skip_all)]
    pub fn start(&mut self) -> Result<usize> {
        self.expect_state("start", &[PipelineState::Configured])?;
        let timer = Timer::start("start");

        self.driver.start_capture(self.session)?;
        self.capturing = true;

        let mut drained = 0;
        while drained < self.buffer_depth as usize {
            match self.driver.retrieve_buffer(self.session) {
                Ok(_) => drained += 1,
                Err(e) if e.is_timeout() => break,
                Err(e) => return Err(e.into()),
            }
        }
        if drained > 0 {
            info!(drained, "Discarded stale frames");
        }

        self.collection_timestamp = Some(Local::now());
        self.timings.record(timer);
        self.state = PipelineState::Armed;
        Ok(drained)
    }

    /// Fires one software trigger. At most `num_images` fires are accepted per run.
    pub fn fire(&mut self) -> Result<()> {
        self.expect_state("fire", &[PipelineState::Armed])?;
        if self.current_settings("fire")?.trigger != TriggerKind::Software {
            return Err(CameraError::InvalidState {
                operation: "fire",
                state: self.state,
            });
        }
        let capacity = self.slots.len();
        if self.fired >= capacity {
            return Err(CameraError::CapacityExceeded {
                requested: self.fired + 1,
                capacity,
            });
        }

        let timer = Timer::start("fire");
        self.trigger.fire_software(&mut self.driver, self.session)?;
        self.fired += 1;
        self.timings.record(timer);
        Ok(())
    }

    /// Fires every remaining software trigger of the run.
    pub fn fire_all(&mut self) -> Result<()> {
        while self.fired < self.slots.len() {
            self.fire()?;
        }
        Ok(())
    }

    pub fn wait_hardware_armed(&mut self) -> Result<()> {
        self.expect_state("wait_hardware_armed", &[PipelineState::Armed])?;
        let timer = Timer::start("wait_armed");
        self.trigger.wait_hardware_armed(&mut self.driver, self.session)?;
        self.timings.record(timer);
        Ok(())
    }

    /// Fills the slots in index order and decodes each frame's embedded timestamp.
    ///
    /// On failure the filled slots are kept, the pipeline stays `Armed`, and a later call
    /// resumes at the first unfilled slot. A frame too short to carry a timestamp still
    /// occupies its slot, so later frames keep their indices.
    #[instrument(skip_all)]
    pub fn retrieve_all(&mut self) -> Result<()> {
        self.expect_state("retrieve_all", &[PipelineState::Armed])?;
        let timer = Timer::start("retrieve");
        let first_unfilled = self
            .slots
            .iter()
            .position(|slot| !slot.is_filled())
            .unwrap_or(self.slots.len());

        for slot_index in first_unfilled..self.slots.len() {
            let image = self
                .driver
                .retrieve_buffer(self.session)
                .map_err(|source| CameraError::Retrieval { slot_index, source })?;
            let header = image.header_bytes();
            let len = image.data.len();
            let slot = &mut self.slots[slot_index];
            slot.raw = Some(image);

            let Some(header) = header else {
                warn!(slot_index, len, "Frame too short for a timestamp header");
                return Err(CameraError::MissingTimestamp { slot_index, len });
            };
            let timestamp = Timestamp::decode(header);
            debug!(slot_index, seconds = timestamp.seconds(), "Retrieved frame");
            slot.timestamp = Some(timestamp);
        }

        self.timings.record(timer);
        self.state = PipelineState::Retrieved;
        info!(images = self.slots.len(), "Retrieved all frames");
        Ok(())
    }

    /// Converts every raw frame to the session's target pixel format.
    #[instrument(skip_all)]
    pub fn convert_all(&mut self) -> Result<()> {
        self.expect_state("convert_all", &[PipelineState::Retrieved])?;
        let target = self.current_settings("convert_all")?.target_format;
        let timer = Timer::start("convert");

        for (slot_index, slot) in self.slots.iter_mut().enumerate() {
            let Some(raw) = slot.raw.as_ref() else {
                continue;
            };
            let converted = self
                .driver
                .convert_image(raw, target)
                .map_err(|source| CameraError::Conversion { slot_index, source })?;
            slot.converted = Some(converted);
        }

        self.timings.record(timer);
        self.state = PipelineState::Converted;
        Ok(())
    }

    /// Writes every converted frame through `writer` and returns the run's record.
    #[instrument(skip_all, fields(directory = %naming.directory().display()))]
    pub fn persist<W: ImageWriter>(
        &mut self,
        naming: &NamingScheme,
        writer: &W,
    ) -> Result<AcquisitionRecord> {
        self.expect_state("persist", &[PipelineState::Converted])?;
        let timer = Timer::start("persist");
        naming.prepare()?;

        let mut files = Vec::with_capacity(self.slots.len());
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(image) = slot.converted.as_ref() else {
                continue;
            };
            let path = naming.path_for(index, writer.extension());
            let mut output = File::create(&path).map_err(|e| CameraError::Persist {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            writer
                .write_image(image, &mut output)
                .map_err(|e| CameraError::Persist {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            files.push(path);
        }

        self.finish_persist(files, timer)
    }

    /// Persists through the driver's own image saver instead of an `ImageWriter`.
    pub fn save_with_driver(
        &mut self,
        naming: &NamingScheme,
        format: FileFormat,
    ) -> Result<AcquisitionRecord> {
        self.expect_state("save_with_driver", &[PipelineState::Converted])?;
        let timer = Timer::start("persist");
        naming.prepare()?;

        let mut files = Vec::with_capacity(self.slots.len());
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(image) = slot.converted.as_ref() else {
                continue;
            };
            let path = naming.path_for(index, format.extension());
            self.driver
                .save_image(image, &path, format)
                .map_err(|e| CameraError::Persist {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            files.push(path);
        }

        self.finish_persist(files, timer)
    }

    fn finish_persist(&mut self, files: Vec<PathBuf>, timer: Timer) -> Result<AcquisitionRecord> {
        info!(files = files.len(), "Persisted images");
        self.files = files;
        let record = self.record()?;
        self.timings.record(timer);
        self.state = PipelineState::Persisted;
        Ok(record)
    }

    /// Timestamps of the filled slots, in slot order.
    pub fn timestamps(&self) -> TimestampBatch {
        let mut batch = TimestampBatch::with_capacity(self.slots.len());
        for timestamp in self.slots.iter().filter_map(|slot| slot.timestamp) {
            batch.push(timestamp);
        }
        batch
    }

    /// Structured record of the run, available once all frames are retrieved.
    pub fn record(&self) -> Result<AcquisitionRecord> {
        self.expect_state(
            "record",
            &[
                PipelineState::Retrieved,
                PipelineState::Converted,
                PipelineState::Persisted,
            ],
        )?;
        let settings = self.current_settings("record")?;
        let sensor = self.sensor.ok_or(CameraError::InvalidState {
            operation: "record",
            state: self.state,
        })?;
        if let Some((slot_index, slot)) = self
            .slots
            .iter()
            .enumerate()
            .find(|(_, slot)| slot.timestamp.is_none())
        {
            return Err(CameraError::MissingTimestamp {
                slot_index,
                len: slot.raw.as_ref().map_or(0, |image| image.data.len()),
            });
        }

        Ok(AcquisitionRecord {
            collection_timestamp: self.collection_timestamp.unwrap_or_else(Local::now),
            exposure_ms: settings.exposure_ms,
            gain_db: settings.gain_db,
            roi: RoiDescription::describe(self.roi.as_ref(), sensor),
            relative_times_ms: self.timestamps().relative_millis()?,
            files: self.files.clone(),
        })
    }

    /// Ends a persisted run: stops capture and clears the slots, keeping their count, so
    /// the camera can be configured again.
    pub fn finish(&mut self) -> Result<()> {
        self.expect_state("finish", &[PipelineState::Persisted])?;
        if self.capturing {
            self.driver.stop_capture(self.session)?;
            self.capturing = false;
        }
        self.slots.iter_mut().for_each(ImageSlot::clear);
        self.fired = 0;
        self.files.clear();
        self.timings.clear();
        self.state = PipelineState::Idle;
        Ok(())
    }

    /// Stops capture and releases the driver session. Safe to call more than once.
    ///
    /// Both teardown calls are attempted. The pipeline is `Stopped` afterwards even when one
    /// of them fails, and the first error is returned.
    pub fn stop(&mut self) -> Result<()> {
        if self.state == PipelineState::Stopped {
            return Ok(());
        }
        self.state = PipelineState::Stopped;

        let stopped = if self.capturing {
            self.capturing = false;
            self.driver.stop_capture(self.session)
        } else {
            Ok(())
        };
        let destroyed = self.driver.destroy_session(self.session);
        info!("Camera session closed");

        stopped?;
        destroyed?;
        Ok(())
    }
}

impl<D: CameraDriver> Drop for AcquisitionPipeline<D> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!("Failed to stop camera cleanly: {}", e);
        }
    }
}

fn bus_speed(boost: bool) -> BusSpeed {
    if boost {
        BusSpeed::Fastest
    } else {
        BusSpeed::Any
    }
}
