//! Alignment and bounds rules for sensor regions.
//!
//! Offsets are aligned to 2 pixels (rounded down), widths to 8 pixels and heights to
//! 2 pixels (rounded up). The aligned rectangle must lie fully on the sensor; requests
//! outside it fail instead of being clamped.

use std::ops::RangeInclusive;

use crate::acquisition::driver::SensorSize;
use crate::acquisition::roi::types::{ConstraintError, Roi, RoiField, RoiRequest};

const OFFSET_STEP: i64 = 2;
const WIDTH_STEP: i64 = 8;
const HEIGHT_STEP: i64 = 2;

fn align_down(value: i64, step: i64) -> i64 {
    value - value.rem_euclid(step)
}

/// `None` when rounding up would leave the i64 range.
fn align_up(value: i64, step: i64) -> Option<i64> {
    value.checked_add(step - 1).map(|v| align_down(v, step))
}

fn valid_range(field: RoiField, sensor: SensorSize) -> RangeInclusive<i64> {
    let sensor_w = i64::from(sensor.width);
    let sensor_h = i64::from(sensor.height);
    match field {
        RoiField::Left => 0..=sensor_w - WIDTH_STEP,
        RoiField::Top => 0..=sensor_h - HEIGHT_STEP,
        RoiField::Width | RoiField::Right => WIDTH_STEP..=sensor_w,
        RoiField::Height | RoiField::Bottom => HEIGHT_STEP..=sensor_h,
    }
}

fn check(field: RoiField, value: i64, sensor: SensorSize) -> Result<(), ConstraintError> {
    let valid_range = valid_range(field, sensor);
    if valid_range.contains(&value) {
        Ok(())
    } else {
        Err(ConstraintError {
            field,
            value,
            valid_range,
        })
    }
}

/// Aligns `value` upwards, or reports the unaligned request when it is too large to align.
fn align_up_checked(
    field: RoiField,
    value: i64,
    step: i64,
    sensor: SensorSize,
) -> Result<i64, ConstraintError> {
    align_up(value, step).ok_or_else(|| ConstraintError {
        field,
        value,
        valid_range: valid_range(field, sensor),
    })
}

/// Aligns and validates a corner-based request against the sensor.
pub fn normalize(
    left: i64,
    top: i64,
    width: i64,
    height: i64,
    sensor: SensorSize,
) -> Result<Roi, ConstraintError> {
    let left = align_down(left, OFFSET_STEP);
    let top = align_down(top, OFFSET_STEP);

    check(RoiField::Left, left, sensor)?;
    check(RoiField::Top, top, sensor)?;
    let width = align_up_checked(RoiField::Width, width, WIDTH_STEP, sensor)?;
    check(RoiField::Width, width, sensor)?;
    let height = align_up_checked(RoiField::Height, height, HEIGHT_STEP, sensor)?;
    check(RoiField::Height, height, sensor)?;
    // offsets and sizes are bounded by the sensor here, so the sums cannot overflow
    check(RoiField::Right, left + width, sensor)?;
    check(RoiField::Bottom, top + height, sensor)?;

    Ok(Roi {
        left: left as u32,
        top: top as u32,
        width: width as u32,
        height: height as u32,
    })
}

/// Builds a region around `center` (x, y). Width and height are aligned before the
/// offsets are derived, then the usual alignment and validation applies.
pub fn from_center(
    center: (i64, i64),
    width: i64,
    height: i64,
    sensor: SensorSize,
) -> Result<Roi, ConstraintError> {
    let width = align_up_checked(RoiField::Width, width, WIDTH_STEP, sensor)?;
    let height = align_up_checked(RoiField::Height, height, HEIGHT_STEP, sensor)?;
    let left = center.0.checked_sub(width / 2).ok_or_else(|| ConstraintError {
        field: RoiField::Left,
        value: center.0,
        valid_range: valid_range(RoiField::Left, sensor),
    })?;
    let top = center.1.checked_sub(height / 2).ok_or_else(|| ConstraintError {
        field: RoiField::Top,
        value: center.1,
        valid_range: valid_range(RoiField::Top, sensor),
    })?;
    normalize(left, top, width, height, sensor)
}

impl RoiRequest {
    pub fn resolve(&self, sensor: SensorSize) -> Result<Roi, ConstraintError> {
        match *self {
            RoiRequest::Corners {
                left,
                top,
                width,
                height,
            } => normalize(left, top, width, height, sensor),
            RoiRequest::Center {
                center,
                width,
                height,
            } => from_center(center, width, height, sensor),
        }
    }
}
