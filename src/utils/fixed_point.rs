// src/utils/fixed_point.rs
use crate::error::{ConvertError, Result};

/// Truncate toward zero into an i16, failing instead of wrapping.
pub fn to_i16_truncated(value: f64, index: usize) -> Result<i16> {
    let t = value.trunc();
    if !t.is_finite() || t < i16::MIN as f64 || t > i16::MAX as f64 {
        return Err(ConvertError::OutOfRange { index, value });
    }
    Ok(t as i16)
}

pub fn to_fixed_point(data: &[f64]) -> Result<Vec<i16>> {
    data.iter()
        .enumerate()
        .map(|(i, &v)| to_i16_truncated(v, i))
        .collect()
}
