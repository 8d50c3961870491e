//! Register-level property access
//!
//! This module encodes floating-point settings into register words and wraps the
//! min/max/value register triplets of camera properties.

pub mod codec;
mod property;

pub use property::{Property, PropertyRange};
