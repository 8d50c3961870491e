//! Region-of-interest types

use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;
use thiserror::Error;

use crate::acquisition::driver::SensorSize;

/// A normalized sensor sub-rectangle. Only produced by the constraint engine, so every
/// value of this type satisfies the alignment and bounds rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Roi {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Roi {
    pub fn right(&self) -> u32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.top + self.height
    }
}

impl fmt::Display for Roi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} at ({}, {})",
            self.width, self.height, self.left, self.top
        )
    }
}

/// How a session asks for its region of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoiRequest {
    Corners {
        left: i64,
        top: i64,
        width: i64,
        height: i64,
    },
    /// Center point as (x, y).
    Center {
        center: (i64, i64),
        width: i64,
        height: i64,
    },
}

/// Region reported in acquisition records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoiDescription {
    Full { width: u32, height: u32 },
    Region { left: u32, top: u32, width: u32, height: u32 },
}

impl RoiDescription {
    pub fn describe(roi: Option<&Roi>, sensor: SensorSize) -> Self {
        match roi {
            Some(roi) => RoiDescription::Region {
                left: roi.left,
                top: roi.top,
                width: roi.width,
                height: roi.height,
            },
            None => RoiDescription::Full {
                width: sensor.width,
                height: sensor.height,
            },
        }
    }
}

/// The bound that an ROI request violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoiField {
    Left,
    Top,
    Width,
    Height,
    /// `left + width`
    Right,
    /// `top + height`
    Bottom,
}

impl fmt::Display for RoiField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoiField::Left => "left",
            RoiField::Top => "top",
            RoiField::Width => "width",
            RoiField::Height => "height",
            RoiField::Right => "left + width",
            RoiField::Bottom => "top + height",
        };
        f.write_str(name)
    }
}

/// Values are reported after alignment rounding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} = {value} is outside the valid range {valid_range:?}")]
pub struct ConstraintError {
    pub field: RoiField,
    pub value: i64,
    pub valid_range: RangeInclusive<i64>,
}
