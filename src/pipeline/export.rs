// src/pipeline/export.rs
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::grid::{transform_from_extent, ExtentConvention, GridFile};
use crate::io::reader::{check_grid_extension, load_grid};
use crate::io::{ExportRaster, GdalSink, OutputFormat, RasterSink};
use crate::processing::{DenormalizeOptions, ValueDenormalizer};

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    pub denormalize: DenormalizeOptions,
    pub extent: ExtentConvention,
}

/// Turn a decoded grid into a raster for the given output format.
pub fn grid_to_raster(grid: &GridFile, format: OutputFormat, options: &ExportOptions) -> Result<ExportRaster> {
    let (cols, rows) = (grid.cols(), grid.rows());
    let geo_transform = transform_from_extent(&grid.header.extent(), cols, rows, options.extent)?;
    let samples = ValueDenormalizer::new(format.target_kind(), options.denormalize)?.denormalize(&grid.payload)?;

    Ok(ExportRaster {
        cols,
        rows,
        geo_transform,
        projection_epsg: format.placeholder_epsg(),
        samples,
    })
}

/// Write a grid through `sink`, which receives the full raster in one call.
pub fn export_grid<K: RasterSink>(grid: &GridFile, output: &Path, sink: &mut K, options: &ExportOptions) -> Result<()> {
    let format = OutputFormat::for_path(output)?;
    let raster = grid_to_raster(grid, format, options)?;
    sink.write_raster(output, &raster)
}

/// Default output path: the input path with a `.dem` extension.
pub fn default_raster_path(input: &Path) -> PathBuf {
    input.with_extension("dem")
}

/// Converts grid files into GDAL rasters.
pub struct GridExporter<K: RasterSink = GdalSink> {
    options: ExportOptions,
    sink: K,
}

impl GridExporter<GdalSink> {
    pub fn new(options: ExportOptions) -> Self {
        Self { options, sink: GdalSink }
    }
}

impl<K: RasterSink> GridExporter<K> {
    pub fn with_sink(options: ExportOptions, sink: K) -> Self {
        Self { options, sink }
    }

    pub fn process(&mut self, input: &Path, output: &Path) -> Result<()> {
        check_grid_extension(input)?;
        OutputFormat::for_path(output)?;

        let grid = load_grid(input)?;
        export_grid(&grid, output, &mut self.sink, &self.options)?;

        info!("converted {} -> {} ({}x{})", input.display(), output.display(), grid.cols(), grid.rows());
        Ok(())
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }
}
