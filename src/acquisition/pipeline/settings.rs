//! JSON settings document for an acquisition run.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::acquisition::common::error::Result;
use crate::acquisition::pipeline::session::AcquisitionSession;
use crate::acquisition::roi::RoiRequest;
use crate::acquisition::trigger::TriggerKind;

/// Flat settings map as an operator writes it. Missing keys take the defaults.
///
/// ```json
/// { "gain": 6.0, "exp_time_ms": 2.5, "use_roi": true, "use_roi_center": true,
///   "roi_center": [640, 480], "roi_width": 320, "roi_height": 240, "num_images": 5 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub gain: f32,
    pub exp_time_ms: f32,
    pub use_roi: bool,
    pub use_roi_center: bool,
    pub roi_left: i64,
    pub roi_top: i64,
    pub roi_width: i64,
    pub roi_height: i64,
    /// (x, y)
    pub roi_center: (i64, i64),
    pub boost_framerate: bool,
    pub num_images: usize,
    pub hardware_trigger: bool,
    pub grab_timeout_ms: i32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        let session = AcquisitionSession::default();
        Self {
            gain: session.gain_db,
            exp_time_ms: session.exposure_ms,
            use_roi: false,
            use_roi_center: false,
            roi_left: 0,
            roi_top: 0,
            roi_width: 0,
            roi_height: 0,
            roi_center: (0, 0),
            boost_framerate: session.boost_framerate,
            num_images: session.num_images,
            hardware_trigger: false,
            grab_timeout_ms: session.grab_timeout_ms,
        }
    }
}

impl CameraSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn roi_request(&self) -> Option<RoiRequest> {
        match (self.use_roi, self.use_roi_center) {
            (false, _) => None,
            (true, true) => Some(RoiRequest::Center {
                center: self.roi_center,
                width: self.roi_width,
                height: self.roi_height,
            }),
            (true, false) => Some(RoiRequest::Corners {
                left: self.roi_left,
                top: self.roi_top,
                width: self.roi_width,
                height: self.roi_height,
            }),
        }
    }

    pub fn into_session(self) -> Result<AcquisitionSession> {
        let trigger = if self.hardware_trigger {
            TriggerKind::Hardware
        } else {
            TriggerKind::Software
        };

        let mut builder = AcquisitionSession::builder()
            .exposure_ms(self.exp_time_ms)
            .gain_db(self.gain)
            .num_images(self.num_images)
            .trigger(trigger)
            .boost_framerate(self.boost_framerate)
            .grab_timeout_ms(self.grab_timeout_ms);
        if let Some(roi) = self.roi_request() {
            builder = builder.roi(roi);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::common::error::CameraError;

    #[test]
    fn test_center_roi_settings() {
        let settings = CameraSettings::from_json_str(
            r#"{"gain": 6.0, "exp_time_ms": 2.5, "use_roi": true, "use_roi_center": true,
                "roi_center": [640, 480], "roi_width": 320, "roi_height": 240,
                "num_images": 5, "boost_framerate": true}"#,
        )
        .unwrap();

        let session = settings.into_session().unwrap();
        assert_eq!(session.num_images, 5);
        assert_eq!(session.gain_db, 6.0);
        assert_eq!(session.exposure_ms, 2.5);
        assert!(session.boost_framerate);
        assert_eq!(
            session.roi,
            Some(RoiRequest::Center {
                center: (640, 480),
                width: 320,
                height: 240
            })
        );
    }

    #[test]
    fn test_roi_ignored_unless_enabled() {
        let settings =
            CameraSettings::from_json_str(r#"{"roi_left": 8, "roi_width": 64, "roi_height": 64}"#)
                .unwrap();
        assert_eq!(settings.roi_request(), None);
        assert_eq!(settings.into_session().unwrap().roi, None);
    }

    #[test]
    fn test_zero_images_rejected() {
        let settings = CameraSettings::from_json_str(r#"{"num_images": 0}"#).unwrap();
        assert!(matches!(
            settings.into_session(),
            Err(CameraError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_num_images_beyond_buffer_range_rejected() {
        let settings =
            CameraSettings::from_json_str(r#"{"num_images": 18446744073709551615}"#).unwrap();
        assert!(matches!(
            settings.into_session(),
            Err(CameraError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        let result = CameraSettings::from_json_str("{\"gain\": \"loud\"}");
        assert!(matches!(result, Err(CameraError::Serialization(_))));
    }
}
