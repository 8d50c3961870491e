//! Value types exchanged with the camera driver.

/// Opaque handle for one driver session. Every driver call is addressed through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(pub u64);

/// Pixel formats understood by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Mono8,
    Yuv411,
    Yuv422,
    Yuv444,
    Rgb8,
    Mono16,
    Rgb16,
    SignedMono16,
    SignedRgb16,
    Raw8,
    Raw16,
    Mono12,
    Raw12,
    Bgr,
    Bgru,
    Rgbu,
    Bgr16,
    Bgru16,
    Yuv422Jpeg,
}

impl PixelFormat {
    /// Bytes per pixel for the packed formats the pipeline handles, `None` otherwise.
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            PixelFormat::Mono8 | PixelFormat::Raw8 => Some(1),
            PixelFormat::Mono16 | PixelFormat::Raw16 | PixelFormat::SignedMono16 => Some(2),
            PixelFormat::Rgb8 | PixelFormat::Bgr => Some(3),
            PixelFormat::Rgbu | PixelFormat::Bgru => Some(4),
            PixelFormat::Rgb16 | PixelFormat::Bgr16 | PixelFormat::SignedRgb16 => Some(6),
            PixelFormat::Bgru16 => Some(8),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BayerTileFormat {
    #[default]
    None,
    Rggb,
    Grbg,
    Gbrg,
    Bggr,
}

/// File formats accepted by the driver's save call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    FromFileExtension,
    Pgm,
    Ppm,
    Bmp,
    Jpeg,
    Jpeg2000,
    Tiff,
    Png,
    Raw,
}

impl FileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            FileFormat::FromFileExtension | FileFormat::Raw => "raw",
            FileFormat::Pgm => "pgm",
            FileFormat::Ppm => "ppm",
            FileFormat::Bmp => "bmp",
            FileFormat::Jpeg => "jpg",
            FileFormat::Jpeg2000 => "jp2",
            FileFormat::Tiff => "tiff",
            FileFormat::Png => "png",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrabMode {
    DropFrames,
    #[default]
    BufferFrames,
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusSpeed {
    S100,
    S200,
    S400,
    S480,
    S800,
    S1600,
    S3200,
    S5000,
    Base10T,
    Base100T,
    Base1000T,
    Base10000T,
    Fastest,
    #[default]
    Any,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BandwidthAllocation {
    Off,
    On,
    Unsupported,
    #[default]
    Unspecified,
}

/// Buffering and bus configuration pushed with `set_configuration`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverConfig {
    pub num_buffers: u32,
    pub num_image_notifications: u32,
    pub min_num_image_notifications: u32,
    /// Grab timeout in milliseconds; negative means wait forever.
    pub grab_timeout_ms: i32,
    pub grab_mode: GrabMode,
    pub isoch_bus_speed: BusSpeed,
    pub async_bus_speed: BusSpeed,
    pub bandwidth_allocation: BandwidthAllocation,
    pub register_timeout_retries: u32,
    pub register_timeout: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            num_buffers: 10,
            num_image_notifications: 0,
            min_num_image_notifications: 0,
            grab_timeout_ms: -1,
            grab_mode: GrabMode::DropFrames,
            isoch_bus_speed: BusSpeed::Any,
            async_bus_speed: BusSpeed::Any,
            bandwidth_allocation: BandwidthAllocation::Unspecified,
            register_timeout_retries: 0,
            register_timeout: 0,
        }
    }
}

/// Custom-mode (Format7) image settings: sensor window plus pixel format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format7Settings {
    pub mode: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerMode {
    pub on_off: bool,
    pub polarity: u32,
    pub source: u32,
    pub mode: u32,
    pub parameter: u32,
}

/// Sensor dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSize {
    pub width: u32,
    pub height: u32,
}

impl SensorSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// An image buffer as handed out by the driver, raw or converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub rows: u32,
    pub cols: u32,
    pub stride: u32,
    pub pixel_format: PixelFormat,
    pub bayer_format: BayerTileFormat,
    pub data: Vec<u8>,
}

impl Image {
    /// First four bytes of pixel data, where the camera embeds frame information.
    pub fn header_bytes(&self) -> Option<[u8; 4]> {
        self.data.get(..4)?.try_into().ok()
    }
}
