use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::acquisition::common::error::Result;
use crate::acquisition::roi::RoiDescription;

/// Structured summary of one acquisition run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcquisitionRecord {
    /// Host time at which capture started.
    pub collection_timestamp: DateTime<Local>,
    pub exposure_ms: f32,
    pub gain_db: f32,
    pub roi: RoiDescription,
    /// Capture times relative to the first frame, from the embedded timestamps.
    pub relative_times_ms: Vec<f64>,
    /// Written image files in slot order. Empty until the run is persisted.
    pub files: Vec<PathBuf>,
}

impl AcquisitionRecord {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_layout() {
        let record = AcquisitionRecord {
            collection_timestamp: Local::now(),
            exposure_ms: 2.5,
            gain_db: 6.0,
            roi: RoiDescription::Region {
                left: 480,
                top: 360,
                width: 320,
                height: 240,
            },
            relative_times_ms: vec![0.0, 50.0],
            files: vec![PathBuf::from("image_000.tiff")],
        };

        let value: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(value["exposure_ms"], 2.5);
        assert_eq!(value["roi"]["kind"], "region");
        assert_eq!(value["roi"]["width"], 320);
        assert_eq!(value["relative_times_ms"][1], 50.0);
        assert_eq!(value["files"][0], "image_000.tiff");
        assert!(value["collection_timestamp"].is_string());
    }
}
