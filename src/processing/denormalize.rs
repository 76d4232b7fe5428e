// src/processing/denormalize.rs
use crate::error::{ConvertError, Result};
use crate::utils::fixed_point::to_fixed_point;
use crate::utils::gdal_ext::{TargetKind, TypedSamples};

/// Scale and offset that were applied on import, undone on export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DenormalizeOptions {
    pub scale: f64,
    pub offset: f64,
}

impl Default for DenormalizeOptions {
    fn default() -> Self {
        Self { scale: 1.0, offset: 0.0 }
    }
}

/// Turns grid elevations into output raster samples.
pub struct ValueDenormalizer {
    target: TargetKind,
    options: DenormalizeOptions,
}

impl ValueDenormalizer {
    pub fn new(target: TargetKind, options: DenormalizeOptions) -> Result<Self> {
        if options.scale == 0.0 || !options.scale.is_finite() {
            return Err(ConvertError::InvalidScale(options.scale));
        }
        Ok(Self { target, options })
    }

    fn is_identity(&self) -> bool {
        self.options.scale == 1.0 && self.options.offset == 0.0
    }

    pub fn denormalize(&self, payload: &[f32]) -> Result<TypedSamples> {
        let DenormalizeOptions { scale, offset } = self.options;

        match self.target {
            TargetKind::Float32 if self.is_identity() => Ok(TypedSamples::F32(payload.to_vec())),
            TargetKind::Float32 => Ok(TypedSamples::F32(
                payload.iter().map(|&v| ((v as f64 - offset) / scale) as f32).collect(),
            )),
            TargetKind::Int16 => {
                let values: Vec<f64> = payload.iter().map(|&v| (v as f64 - offset) / scale).collect();
                Ok(TypedSamples::I16(to_fixed_point(&values)?))
            }
        }
    }
}
