// src/processing/normalize.rs
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConvertError, Result};

/// What happens to no-data samples when values are not mean-centered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoDataPolicy {
    /// Sentinel samples go through scale/offset like any other sample.
    Keep,
    /// Sentinel samples are replaced by 0 before scale/offset.
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Centering {
    /// Subtract the mean of all valid samples, no-data samples become 0.
    Mean,
    None { nodata: NoDataPolicy },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOptions {
    pub scale: f64,
    pub offset: f64,
    pub centering: Centering,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: 0.0,
            centering: Centering::Mean,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub values: Vec<f32>,
    /// Mean that was subtracted, if the samples were centered.
    pub mean: Option<f64>,
    pub no_data_count: usize,
}

/// A NaN sentinel matches NaN samples, any other sentinel matches by equality.
pub fn is_no_data(value: f64, no_data: Option<f64>) -> bool {
    match no_data {
        Some(nd) if nd.is_nan() => value.is_nan(),
        Some(nd) => value == nd,
        None => false,
    }
}

/// Arithmetic mean of all samples not equal to the no-data sentinel.
pub fn valid_mean(samples: &[f64], no_data: Option<f64>) -> Result<f64> {
    let (sum, n) = samples
        .iter()
        .filter(|&&v| !is_no_data(v, no_data))
        .fold((0.0f64, 0usize), |(sum, n), &v| (sum + v, n + 1));

    if n == 0 {
        return Err(ConvertError::EmptyValidSet(no_data.unwrap_or(f64::NAN)));
    }
    Ok(sum / n as f64)
}

/// Turns raw raster samples into grid elevations.
pub struct ValueNormalizer {
    options: NormalizeOptions,
}

impl ValueNormalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    pub fn normalize(&self, samples: &[f64], no_data: Option<f64>) -> Result<Normalized> {
        let NormalizeOptions { scale, offset, centering } = self.options;

        let mean = match centering {
            Centering::Mean => Some(valid_mean(samples, no_data)?),
            Centering::None { .. } => None,
        };
        if let Some(mean) = mean {
            debug!("centering samples on mean {}", mean);
        }

        let mut no_data_count = 0;
        let values = samples
            .iter()
            .map(|&v| {
                let mapped = if is_no_data(v, no_data) {
                    no_data_count += 1;
                    match centering {
                        Centering::None { nodata: NoDataPolicy::Keep } => v,
                        _ => 0.0,
                    }
                } else {
                    v - mean.unwrap_or(0.0)
                };
                (mapped * scale + offset) as f32
            })
            .collect();

        Ok(Normalized { values, mean, no_data_count })
    }
}
