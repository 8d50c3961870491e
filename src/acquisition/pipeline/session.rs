//! Acquisition session parameters

use crate::acquisition::common::error::{CameraError, Result};
use crate::acquisition::driver::PixelFormat;
use crate::acquisition::roi::RoiRequest;
use crate::acquisition::trigger::TriggerKind;

/// Largest run whose driver buffer count (`num_images + 1`) fits the driver's u32.
pub const MAX_IMAGES: usize = u32::MAX as usize - 1;

/// Everything `configure` needs for one capture run. Build with
/// [`AcquisitionSession::builder`], which validates the values.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionSession {
    pub exposure_ms: f32,
    pub gain_db: f32,
    /// `None` captures the full sensor.
    pub roi: Option<RoiRequest>,
    pub num_images: usize,
    pub trigger: TriggerKind,
    /// Request the fastest bus speeds and bandwidth allocation.
    pub boost_framerate: bool,
    /// Negative waits forever.
    pub grab_timeout_ms: i32,
    pub sensor_format: PixelFormat,
    pub target_format: PixelFormat,
}

impl Default for AcquisitionSession {
    fn default() -> Self {
        Self {
            exposure_ms: 10.0,
            gain_db: 0.0,
            roi: None,
            num_images: 1,
            trigger: TriggerKind::Software,
            boost_framerate: false,
            grab_timeout_ms: 5000,
            sensor_format: PixelFormat::Raw8,
            target_format: PixelFormat::Bgr,
        }
    }
}

impl AcquisitionSession {
    pub fn builder() -> AcquisitionSessionBuilder {
        AcquisitionSessionBuilder::default()
    }

    /// Exposure as written to the shutter register.
    pub fn exposure_seconds(&self) -> f32 {
        self.exposure_ms / 1000.0
    }

    /// Driver buffer count for this run: one more than the number of images.
    pub fn buffer_count(&self) -> Result<u32> {
        self.num_images
            .checked_add(1)
            .and_then(|count| u32::try_from(count).ok())
            .ok_or_else(|| {
                CameraError::InvalidSettings(format!(
                    "num_images must be at most {MAX_IMAGES}, got {}",
                    self.num_images
                ))
            })
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_images == 0 {
            return Err(CameraError::InvalidSettings(
                "num_images must be at least 1".to_string(),
            ));
        }
        self.buffer_count()?;
        if !self.exposure_ms.is_finite() || self.exposure_ms <= 0.0 {
            return Err(CameraError::InvalidSettings(format!(
                "exposure must be a positive number of milliseconds, got {}",
                self.exposure_ms
            )));
        }
        if !self.gain_db.is_finite() {
            return Err(CameraError::InvalidSettings(format!(
                "gain must be finite, got {}",
                self.gain_db
            )));
        }
        if self.target_format.bytes_per_pixel().is_none() {
            return Err(CameraError::InvalidSettings(format!(
                "unsupported target pixel format {:?}",
                self.target_format
            )));
        }
        Ok(())
    }
}

/// Builder for AcquisitionSession
#[derive(Default)]
pub struct AcquisitionSessionBuilder {
    exposure_ms: Option<f32>,
    gain_db: Option<f32>,
    roi: Option<RoiRequest>,
    num_images: Option<usize>,
    trigger: Option<TriggerKind>,
    boost_framerate: Option<bool>,
    grab_timeout_ms: Option<i32>,
    sensor_format: Option<PixelFormat>,
    target_format: Option<PixelFormat>,
}

impl AcquisitionSessionBuilder {
    pub fn exposure_ms(mut self, exposure_ms: f32) -> Self {
        self.exposure_ms = Some(exposure_ms);
        self
    }

    pub fn gain_db(mut self, gain_db: f32) -> Self {
        self.gain_db = Some(gain_db);
        self
    }

    pub fn roi(mut self, roi: RoiRequest) -> Self {
        self.roi = Some(roi);
        self
    }

    pub fn num_images(mut self, num_images: usize) -> Self {
        self.num_images = Some(num_images);
        self
    }

    pub fn trigger(mut self, trigger: TriggerKind) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn boost_framerate(mut self, enable: bool) -> Self {
        self.boost_framerate = Some(enable);
        self
    }

    pub fn grab_timeout_ms(mut self, timeout: i32) -> Self {
        self.grab_timeout_ms = Some(timeout);
        self
    }

    pub fn sensor_format(mut self, format: PixelFormat) -> Self {
        self.sensor_format = Some(format);
        self
    }

    pub fn target_format(mut self, format: PixelFormat) -> Self {
        self.target_format = Some(format);
        self
    }

    pub fn build(self) -> Result<AcquisitionSession> {
        let default = AcquisitionSession::default();
        let session = AcquisitionSession {
            exposure_ms: self.exposure_ms.unwrap_or(default.exposure_ms),
            gain_db: self.gain_db.unwrap_or(default.gain_db),
            roi: self.roi.or(default.roi),
            num_images: self.num_images.unwrap_or(default.num_images),
            trigger: self.trigger.unwrap_or(default.trigger),
            boost_framerate: self.boost_framerate.unwrap_or(default.boost_framerate),
            grab_timeout_ms: self.grab_timeout_ms.unwrap_or(default.grab_timeout_ms),
            sensor_format: self.sensor_format.unwrap_or(default.sensor_format),
            target_format: self.target_format.unwrap_or(default.target_format),
        };
        session.validate()?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_build() {
        let session = AcquisitionSession::builder().build().unwrap();
        assert_eq!(session, AcquisitionSession::default());
        assert_eq!(session.buffer_count().unwrap(), 2);
    }

    #[test]
    fn test_largest_run_fits_buffer_count() {
        let session = AcquisitionSession::builder()
            .num_images(MAX_IMAGES)
            .build()
            .unwrap();
        assert_eq!(session.buffer_count().unwrap(), u32::MAX);
    }

    #[test]
    fn test_oversized_run_rejected() {
        for num_images in [MAX_IMAGES + 1, usize::MAX] {
            let result = AcquisitionSession::builder().num_images(num_images).build();
            assert!(matches!(result, Err(CameraError::InvalidSettings(_))));
        }
    }

    #[test]
    fn test_non_positive_exposure_rejected() {
        let result = AcquisitionSession::builder().exposure_ms(0.0).build();
        assert!(matches!(result, Err(CameraError::InvalidSettings(_))));
    }
}
