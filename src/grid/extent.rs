// src/grid/extent.rs
use clap::ValueEnum;
use gdal::GeoTransform;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConvertError, Result};

/// How the bounding box is derived from origin, pixel size and dimensions.
///
/// `Edge` treats the raster as covering whole pixel cells and is the only
/// convention that round-trips a geotransform exactly. `Center` uses the first
/// and last sample centers as bounds and shifts the extent by half a pixel
/// when mixed with `Edge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtentConvention {
    #[default]
    Edge,
    Center,
}

impl ExtentConvention {
    fn cells(&self, n: usize) -> usize {
        match self {
            ExtentConvention::Edge => n,
            ExtentConvention::Center => n.saturating_sub(1),
        }
    }
}

/// Upper-left is (`x_min`, `y_max`), lower-right is (`x_max`, `y_min`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extent {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

/// Derive the grid extent from a raster geotransform.
///
/// The upper-left corner is taken verbatim from the transform origin, the
/// lower-right corner is extrapolated along the pixel size. Bounds are not
/// re-sorted, so a south-up raster yields `y_min > y_max`.
pub fn extent_from_transform(gt: &GeoTransform, cols: usize, rows: usize, convention: ExtentConvention) -> Extent {
    let [x0, px, row_rot, y0, col_rot, py] = *gt;
    if row_rot != 0.0 || col_rot != 0.0 {
        warn!("ignoring rotation terms {} {} of geotransform", row_rot, col_rot);
    }

    Extent {
        x_min: x0,
        y_min: y0 + convention.cells(rows) as f64 * py,
        x_max: x0 + convention.cells(cols) as f64 * px,
        y_max: y0,
    }
}

/// Rebuild a north-up geotransform from a grid extent.
///
/// Pixel sizes are derived from the extent, never stored, so the convention
/// must match the one used when the extent was computed.
pub fn transform_from_extent(extent: &Extent, cols: usize, rows: usize, convention: ExtentConvention) -> Result<GeoTransform> {
    let nx = convention.cells(cols);
    let ny = convention.cells(rows);
    if nx == 0 || ny == 0 {
        return Err(ConvertError::DegenerateExtent {
            x_min: extent.x_min,
            y_min: extent.y_min,
            x_max: extent.x_max,
            y_max: extent.y_max,
            cols: cols as i32,
            rows: rows as i32,
        });
    }

    let px = (extent.x_max - extent.x_min) / nx as f64;
    let py = -(extent.y_max - extent.y_min) / ny as f64;

    Ok([extent.x_min, px, 0.0, extent.y_max, 0.0, py])
}
