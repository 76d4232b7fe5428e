// src/processing/stats.rs
use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

use super::normalize::is_no_data;

/// Summary of the valid samples of a band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleStats {
    pub valid: usize,
    pub no_data: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

pub fn sample_stats(samples: &[f64], no_data: Option<f64>) -> SampleStats {
    let valid = samples.iter().copied().filter(|&v| !is_no_data(v, no_data));

    let (min, max) = match valid.clone().minmax_by(|a, b| a.total_cmp(b)) {
        MinMaxResult::NoElements => (None, None),
        MinMaxResult::OneElement(v) => (Some(v), Some(v)),
        MinMaxResult::MinMax(lo, hi) => (Some(lo), Some(hi)),
    };

    let (sum, n) = valid.fold((0.0f64, 0usize), |(s, n), v| (s + v, n + 1));

    SampleStats {
        valid: n,
        no_data: samples.len() - n,
        min,
        max,
        mean: (n > 0).then(|| sum / n as f64),
    }
}
