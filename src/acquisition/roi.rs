//! Region-of-interest module
//!
//! This module normalizes requested sensor windows against the camera's alignment and
//! bounds rules.

mod constraints;
pub mod types;

pub use constraints::{from_center, normalize};
pub use types::{ConstraintError, Roi, RoiDescription, RoiField, RoiRequest};
