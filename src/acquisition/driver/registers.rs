//! Camera register map and control-register bit layout.

pub const INITIALIZE: u32 = 0x000;
pub const POWER: u32 = 0x610;
/// Software trigger register; also reports trigger readiness.
pub const SOFTWARE_TRIGGER: u32 = 0x62C;
pub const AUTO_EXPOSURE: u32 = 0x804;
pub const SHARPNESS: u32 = 0x808;
pub const GAMMA: u32 = 0x818;
pub const SHUTTER: u32 = 0x81C;
pub const GAIN: u32 = 0x820;
pub const PAN: u32 = 0x884;
pub const TILT: u32 = 0x888;

pub const SHUTTER_ABS_MIN: u32 = 0x910;
pub const SHUTTER_ABS_MAX: u32 = 0x914;
pub const SHUTTER_ABS_VALUE: u32 = 0x918;

pub const GAIN_ABS_MIN: u32 = 0x920;
pub const GAIN_ABS_MAX: u32 = 0x924;
pub const GAIN_ABS_VALUE: u32 = 0x928;

pub const FRAME_INFO: u32 = 0x12F8;

/// Writing this value to `INITIALIZE` restores factory defaults.
pub const INITIALIZE_RESET: u32 = 0x8000_0000;
pub const POWER_ON: u32 = 0x8000_0000;

/// Bit 31: a software trigger is still being processed.
pub const TRIGGER_BUSY: u32 = 0x8000_0000;
/// Bit 0: the camera is armed for an external trigger.
pub const TRIGGER_ARMED: u32 = 0x0000_0001;

// Feature control register bits (MSB first numbering in the camera docs).
pub const PRESENCE_INQ: u32 = 0x8000_0000;
pub const ABS_CONTROL: u32 = 0x4000_0000;
pub const ON_OFF: u32 = 0x0200_0000;
pub const AUTO_MODE: u32 = 0x0100_0000;

/// Frame info bit enabling the embedded timestamp in the first pixels.
pub const FRAME_INFO_TIMESTAMP: u32 = 0x0000_0001;

/// Registers switched off so that no camera-side adjustment happens during a run.
pub const AUTONOMOUS_FEATURES: [(u32, &str); 5] = [
    (AUTO_EXPOSURE, "auto_exposure"),
    (SHARPNESS, "sharpness"),
    (GAMMA, "gamma"),
    (PAN, "pan"),
    (TILT, "tilt"),
];
