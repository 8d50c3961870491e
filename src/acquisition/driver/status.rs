//! Driver status codes and the error type carrying them.

use std::fmt;

use thiserror::Error;

/// Status codes reported by the camera driver. `Ok` is code 0; every other code is a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverStatus {
    Ok,
    Failed,
    NotImplemented,
    FailedBusMasterConnection,
    NotConnected,
    InitFailed,
    NotInitialized,
    InvalidParameter,
    InvalidSettings,
    InvalidBusManager,
    MemoryAllocationFailed,
    LowLevelFailure,
    NotFound,
    FailedGuid,
    InvalidPacketSize,
    InvalidMode,
    NotInFormat7,
    NotSupported,
    Timeout,
    BusMasterFailed,
    InvalidGeneration,
    LutFailed,
    IidcFailed,
    StrobeFailed,
    TriggerFailed,
    PropertyFailed,
    PropertyNotPresent,
    RegisterFailed,
    ReadRegisterFailed,
    WriteRegisterFailed,
    IsochFailed,
    IsochAlreadyStarted,
    IsochNotStarted,
    IsochStartFailed,
    IsochRetrieveBufferFailed,
    IsochStopFailed,
    IsochSyncFailed,
    IsochBandwidthExceeded,
    ImageConversionFailed,
    ImageLibraryFailure,
    BufferTooSmall,
    ImageConsistencyError,
    Undefined,
}

const STATUS_TABLE: [(DriverStatus, &str); 43] = [
    (DriverStatus::Ok, "Function returned with no errors."),
    (DriverStatus::Failed, "General failure."),
    (DriverStatus::NotImplemented, "Function has not been implemented."),
    (DriverStatus::FailedBusMasterConnection, "Could not connect to Bus Master."),
    (DriverStatus::NotConnected, "Camera has not been connected."),
    (DriverStatus::InitFailed, "Initialization failed."),
    (DriverStatus::NotInitialized, "Camera has not been initialized."),
    (DriverStatus::InvalidParameter, "Invalid parameter passed to function."),
    (DriverStatus::InvalidSettings, "Setting set to camera is invalid."),
    (DriverStatus::InvalidBusManager, "Invalid Bus Manager object."),
    (DriverStatus::MemoryAllocationFailed, "Could not allocate memory."),
    (DriverStatus::LowLevelFailure, "Low level error."),
    (DriverStatus::NotFound, "Device not found."),
    (DriverStatus::FailedGuid, "GUID failure."),
    (DriverStatus::InvalidPacketSize, "Packet size set to camera is invalid."),
    (DriverStatus::InvalidMode, "Invalid mode has been passed to function."),
    (DriverStatus::NotInFormat7, "Error due to not being in Format7."),
    (DriverStatus::NotSupported, "This feature is unsupported."),
    (DriverStatus::Timeout, "Timeout error."),
    (DriverStatus::BusMasterFailed, "Bus Master Failure."),
    (DriverStatus::InvalidGeneration, "Generation Count Mismatch."),
    (DriverStatus::LutFailed, "Look Up Table failure."),
    (DriverStatus::IidcFailed, "IIDC failure."),
    (DriverStatus::StrobeFailed, "Strobe failure."),
    (DriverStatus::TriggerFailed, "Trigger failure."),
    (DriverStatus::PropertyFailed, "Property failure."),
    (DriverStatus::PropertyNotPresent, "Property is not present."),
    (DriverStatus::RegisterFailed, "Register access failed."),
    (DriverStatus::ReadRegisterFailed, "Register read failed."),
    (DriverStatus::WriteRegisterFailed, "Register write failed."),
    (DriverStatus::IsochFailed, "Isochronous failure."),
    (DriverStatus::IsochAlreadyStarted, "Isochronous transfer has already been started."),
    (DriverStatus::IsochNotStarted, "Isochronous transfer has not been started."),
    (DriverStatus::IsochStartFailed, "Isochronous start failed."),
    (DriverStatus::IsochRetrieveBufferFailed, "Isochronous retrieve buffer failed."),
    (DriverStatus::IsochStopFailed, "Isochronous stop failed."),
    (DriverStatus::IsochSyncFailed, "Isochronous image synchronization failed."),
    (DriverStatus::IsochBandwidthExceeded, "Isochronous bandwidth exceeded."),
    (DriverStatus::ImageConversionFailed, "Image conversion failed."),
    (DriverStatus::ImageLibraryFailure, "Image library failure."),
    (DriverStatus::BufferTooSmall, "Buffer is too small."),
    (DriverStatus::ImageConsistencyError, "There is an image consistency error."),
    (DriverStatus::Undefined, "Undefined"),
];

impl DriverStatus {
    /// Maps a raw driver return code. Codes past the end of the table are `Undefined`.
    pub fn from_code(code: i32) -> Self {
        usize::try_from(code)
            .ok()
            .and_then(|idx| STATUS_TABLE.get(idx))
            .map(|(status, _)| *status)
            .unwrap_or(DriverStatus::Undefined)
    }

    pub fn code(self) -> i32 {
        STATUS_TABLE
            .iter()
            .position(|(status, _)| *status == self)
            .map(|idx| idx as i32)
            .unwrap_or(STATUS_TABLE.len() as i32 - 1)
    }

    pub fn description(self) -> &'static str {
        STATUS_TABLE[self.code() as usize].1
    }

    pub fn is_ok(self) -> bool {
        self == DriverStatus::Ok
    }

    /// Converts a raw return code into `Ok(())` or a `DriverError`.
    pub fn check(code: i32) -> Result<(), DriverError> {
        match DriverStatus::from_code(code) {
            DriverStatus::Ok => Ok(()),
            status => Err(DriverError::new(status)),
        }
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.description())
    }
}

/// A non-zero driver status together with the call that produced it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{status}{}", .context.as_deref().map(|c| format!(" ({c})")).unwrap_or_default())]
pub struct DriverError {
    pub status: DriverStatus,
    pub context: Option<String>,
}

impl DriverError {
    pub fn new(status: DriverStatus) -> Self {
        Self {
            status,
            context: None,
        }
    }

    pub fn with_context(status: DriverStatus, context: impl Into<String>) -> Self {
        Self {
            status,
            context: Some(context.into()),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.status == DriverStatus::Timeout
    }
}
