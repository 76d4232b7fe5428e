// src/pipeline/import.rs
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::grid::{extent_from_transform, Extent, ExtentConvention, GridFile, GridHeader};
use crate::io::{write_grid, GdalSource, RasterSource};
use crate::processing::{sample_stats, NormalizeOptions, SampleStats, ValueNormalizer};
use crate::utils::gdal_ext::NumericKind;

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    pub normalize: NormalizeOptions,
    pub extent: ExtentConvention,
}

/// Outcome of an import, for reporting.
#[derive(Debug, Clone, Copy)]
pub struct ImportSummary {
    pub header: GridHeader,
    pub mean: Option<f64>,
    pub no_data_count: usize,
}

/// Description of a source raster, as printed by `--info`.
#[derive(Debug, Clone, Serialize)]
pub struct RasterInfo {
    pub cols: usize,
    pub rows: usize,
    pub kind: NumericKind,
    pub no_data: Option<f64>,
    pub extent: Extent,
    pub stats: SampleStats,
}

/// Build a grid in memory from a raster source.
pub fn import_raster<S: RasterSource>(source: &S, options: &ImportOptions) -> Result<(GridFile, ImportSummary)> {
    let (cols, rows) = source.raster_size();
    let gt = source.geo_transform()?;
    let kind = source.numeric_kind()?;
    if kind.loses_precision_as_f32() {
        debug!("{:?} samples are stored as f32 and may lose precision", kind);
    }

    let extent = extent_from_transform(&gt, cols, rows, options.extent);
    let header = GridHeader::new(cols, rows, &extent)?;
    if header.x_min >= header.x_max || header.y_min >= header.y_max {
        warn!("grid extent is not ascending: {:?}", extent);
    }

    let samples = source.read_all()?;
    let normalized = ValueNormalizer::new(options.normalize).normalize(&samples, source.no_data_value())?;
    let grid = GridFile::new(header, normalized.values)?;

    Ok((
        grid,
        ImportSummary {
            header,
            mean: normalized.mean,
            no_data_count: normalized.no_data_count,
        },
    ))
}

pub fn raster_info<S: RasterSource>(source: &S, convention: ExtentConvention) -> Result<RasterInfo> {
    let (cols, rows) = source.raster_size();
    let gt = source.geo_transform()?;
    let no_data = source.no_data_value();
    let samples = source.read_all()?;

    Ok(RasterInfo {
        cols,
        rows,
        kind: source.numeric_kind()?,
        no_data,
        extent: extent_from_transform(&gt, cols, rows, convention),
        stats: sample_stats(&samples, no_data),
    })
}

/// Default output path: the input path with a `.grid` extension.
pub fn default_grid_path(input: &Path) -> PathBuf {
    input.with_extension("grid")
}

/// Converts GDAL rasters into grid files.
pub struct GridImporter {
    options: ImportOptions,
    band: usize,
}

impl GridImporter {
    pub fn new(options: ImportOptions) -> Self {
        Self { options, band: 1 }
    }

    pub fn with_band(mut self, band: usize) -> Self {
        self.band = band;
        self
    }

    pub fn process(&self, input: &Path, output: &Path) -> Result<ImportSummary> {
        let source = GdalSource::open(input, self.band)?;
        let (grid, summary) = import_raster(&source, &self.options)?;
        write_grid(output, &grid)?;

        info!(
            "converted {} -> {} ({}x{}, {} no-data samples)",
            input.display(),
            output.display(),
            summary.header.cols,
            summary.header.rows,
            summary.no_data_count
        );
        Ok(summary)
    }

    pub fn info(&self, input: &Path) -> Result<RasterInfo> {
        let source = GdalSource::open(input, self.band)?;
        raster_info(&source, self.options.extent)
    }
}
