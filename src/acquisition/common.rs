//! Common utilities module
//!
//! This module contains the error taxonomy shared across the acquisition stack.

pub mod error;

pub use error::{CameraError, Result};
