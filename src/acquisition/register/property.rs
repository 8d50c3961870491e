//! Range-checked camera properties backed by absolute-value registers.

use tracing::debug;

use crate::acquisition::common::error::{CameraError, Result};
use crate::acquisition::driver::{CameraDriver, SessionHandle, registers};
use crate::acquisition::register::codec;

/// Live range of a property as reported by the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyRange {
    pub min: f32,
    pub max: f32,
}

impl PropertyRange {
    /// Both bounds are exclusive.
    pub fn accepts(&self, value: f32) -> bool {
        self.min < value && value < self.max
    }
}

/// A named setting whose min, max and current value live in three registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property {
    pub name: &'static str,
    pub units: &'static str,
    pub control: u32,
    pub min_register: u32,
    pub max_register: u32,
    pub value_register: u32,
}

impl Property {
    /// Shutter time, in seconds.
    pub const EXPOSURE: Property = Property {
        name: "exposure",
        units: "s",
        control: registers::SHUTTER,
        min_register: registers::SHUTTER_ABS_MIN,
        max_register: registers::SHUTTER_ABS_MAX,
        value_register: registers::SHUTTER_ABS_VALUE,
    };

    pub const GAIN: Property = Property {
        name: "gain",
        units: "dB",
        control: registers::GAIN,
        min_register: registers::GAIN_ABS_MIN,
        max_register: registers::GAIN_ABS_MAX,
        value_register: registers::GAIN_ABS_VALUE,
    };

    pub fn range<D: CameraDriver>(
        &self,
        driver: &mut D,
        session: SessionHandle,
    ) -> Result<PropertyRange> {
        let min = codec::decode(driver.read_register(session, self.min_register)?);
        let max = codec::decode(driver.read_register(session, self.max_register)?);
        Ok(PropertyRange { min, max })
    }

    pub fn get<D: CameraDriver>(&self, driver: &mut D, session: SessionHandle) -> Result<f32> {
        Ok(codec::decode(driver.read_register(session, self.value_register)?))
    }

    /// Writes `value` after checking it against the live range. Nothing is written when
    /// the value is rejected.
    pub fn set<D: CameraDriver>(
        &self,
        driver: &mut D,
        session: SessionHandle,
        value: f32,
    ) -> Result<()> {
        let range = self.range(driver, session)?;
        if !range.accepts(value) {
            return Err(CameraError::PropertyRange {
                property: self.name,
                value,
                min: range.min,
                max: range.max,
                units: self.units,
            });
        }

        let word = codec::encode(value);
        debug!(
            property = self.name,
            value,
            register = format_args!("{:#06X}", self.value_register),
            word = format_args!("{word:#010X}"),
            "Writing property"
        );
        driver.write_register(session, self.value_register, word)?;
        Ok(())
    }

    /// Puts the feature in manual mode with absolute-value control enabled.
    pub fn enable_absolute_control<D: CameraDriver>(
        &self,
        driver: &mut D,
        session: SessionHandle,
    ) -> Result<()> {
        let current = driver.read_register(session, self.control)?;
        let word = (current | registers::ABS_CONTROL | registers::ON_OFF) & !registers::AUTO_MODE;
        driver.write_register(session, self.control, word)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::driver::{CameraDriver, SimulatedCamera};

    fn connected_camera() -> (SimulatedCamera, SessionHandle) {
        let mut camera = SimulatedCamera::new();
        let session = camera.create_session().unwrap();
        camera.connect(session, 0).unwrap();
        (camera, session)
    }

    #[test]
    fn test_set_within_range_round_trips() {
        let (mut camera, session) = connected_camera();

        Property::GAIN.set(&mut camera, session, 6.5).unwrap();
        let read_back = Property::GAIN.get(&mut camera, session).unwrap();

        assert_eq!(codec::encode(read_back), codec::encode(6.5));
    }

    #[test]
    fn test_negative_gain_round_trips() {
        let (mut camera, session) = connected_camera();

        Property::GAIN.set(&mut camera, session, -1.25).unwrap();

        assert_eq!(Property::GAIN.get(&mut camera, session).unwrap(), -1.25);
    }

    #[test]
    fn test_out_of_range_is_rejected_without_write() {
        let (mut camera, session) = connected_camera();
        let range = Property::EXPOSURE.range(&mut camera, session).unwrap();
        let writes_before = camera.register_writes().len();

        for value in [range.min, range.max, range.max * 2.0, f32::NAN] {
            let result = Property::EXPOSURE.set(&mut camera, session, value);
            assert!(matches!(
                result,
                Err(CameraError::PropertyRange { property: "exposure", units: "s", .. })
            ));
        }

        assert_eq!(camera.register_writes().len(), writes_before);
    }

    #[test]
    fn test_enable_absolute_control_clears_auto_bit() {
        let (mut camera, session) = connected_camera();

        Property::EXPOSURE.enable_absolute_control(&mut camera, session).unwrap();
        let word = camera.read_register(session, registers::SHUTTER).unwrap();

        assert_ne!(word & registers::ABS_CONTROL, 0);
        assert_ne!(word & registers::ON_OFF, 0);
        assert_eq!(word & registers::AUTO_MODE, 0);
    }
}
