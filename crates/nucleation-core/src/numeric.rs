//! Float/integer conversions shared by the samplers and the grid.
//!
//! The workspace denies lossy casts; the few places that genuinely need
//! one go through these helpers so the clamping lives in one spot.

/// Convert a count to `f64`. Counts here stay far below 2^52.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn count_to_f64(count: u64) -> f64 {
    count as f64
}

/// Convert a non-negative float to a count, saturating at both ends.
/// NaN maps to 0.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn f64_to_count(value: f64) -> u64 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= u64::MAX as f64 {
        u64::MAX
    } else {
        value as u64
    }
}

/// Floor a coordinate to a grid cell index, saturating at the `i64` range.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub(crate) fn floor_to_i64(value: f64) -> i64 {
    let floored = value.floor();
    if floored.is_nan() {
        0
    } else if floored <= i64::MIN as f64 {
        i64::MIN
    } else if floored >= i64::MAX as f64 {
        i64::MAX
    } else {
        floored as i64
    }
}
