// src/io/reader.rs
use gdal::{Dataset, GeoTransform};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{source_open_failure, ConvertError, Result};
use crate::grid::{decode, GridFile};
use crate::utils::gdal_ext::NumericKind;

/// GDAL's geotransform for rasters that carry none.
const DEFAULT_GEO_TRANSFORM: GeoTransform = [0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// A single band of a georeferenced raster.
pub trait RasterSource {
    /// `(cols, rows)`
    fn raster_size(&self) -> (usize, usize);

    fn geo_transform(&self) -> Result<GeoTransform>;

    fn numeric_kind(&self) -> Result<NumericKind>;

    fn no_data_value(&self) -> Option<f64>;

    /// Read a rectangular window of samples in row-major order.
    fn read_window(&self, offset: (usize, usize), size: (usize, usize)) -> Result<Vec<f64>>;

    fn read_all(&self) -> Result<Vec<f64>> {
        self.read_window((0, 0), self.raster_size())
    }
}

pub struct GdalSource {
    path: PathBuf,
    dataset: Dataset,
    band: usize,
}

impl GdalSource {
    /// Open `band` (1-based) of the raster at `path`.
    pub fn open<P: AsRef<Path>>(path: P, band: usize) -> Result<Self> {
        let path = path.as_ref();
        // directories (Arc/Info grids) and /vsi paths are left to GDAL
        let dataset = Dataset::open(path).map_err(|e| {
            if is_virtual(path) || path.exists() {
                source_open_failure(path, e)
            } else {
                ConvertError::InputNotFound(path.to_path_buf())
            }
        })?;
        if band == 0 || dataset.rasterband(band).is_err() {
            return Err(ConvertError::BandNotFound(band));
        }
        debug!("opened {} band {} ({}x{})", path.display(), band, dataset.raster_size().0, dataset.raster_size().1);

        Ok(Self {
            path: path.to_path_buf(),
            dataset,
            band,
        })
    }
}

impl RasterSource for GdalSource {
    fn raster_size(&self) -> (usize, usize) {
        self.dataset.raster_size()
    }

    fn geo_transform(&self) -> Result<GeoTransform> {
        match self.dataset.geo_transform() {
            Ok(gt) => Ok(gt),
            Err(e) => {
                warn!("{} has no geotransform ({}), using pixel coordinates", self.path.display(), e);
                Ok(DEFAULT_GEO_TRANSFORM)
            }
        }
    }

    fn numeric_kind(&self) -> Result<NumericKind> {
        NumericKind::try_from(self.dataset.rasterband(self.band)?.band_type())
    }

    fn no_data_value(&self) -> Option<f64> {
        self.dataset.rasterband(self.band).ok().and_then(|b| b.no_data_value())
    }

    fn read_window(&self, offset: (usize, usize), size: (usize, usize)) -> Result<Vec<f64>> {
        let band = self.dataset.rasterband(self.band)?;
        let buffer = band
            .read_as::<f64>((offset.0 as isize, offset.1 as isize), size, size, None)
            .map_err(|e| source_open_failure(&self.path, e))?;
        Ok(buffer.data().to_vec())
    }
}

fn is_virtual(path: &Path) -> bool {
    path.to_str().is_some_and(|p| p.starts_with("/vsi"))
}

/// Read and decode a `.grid` file.
pub fn read_grid<P: AsRef<Path>>(path: P) -> Result<GridFile> {
    let path = path.as_ref();
    check_grid_extension(path)?;
    load_grid(path)
}

/// `read_grid` for a path whose extension was already checked.
pub(crate) fn load_grid(path: &Path) -> Result<GridFile> {
    if !path.is_file() {
        return Err(ConvertError::InputNotFound(path.to_path_buf()));
    }

    let data = fs::read(path).map_err(|e| source_open_failure(path, e))?;
    let grid = decode(&data)?;
    debug!("read {} ({}x{})", path.display(), grid.header.cols, grid.header.rows);
    Ok(grid)
}

pub fn check_grid_extension(path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("grid") => Ok(()),
        _ => Err(ConvertError::NotAGridFile(path.to_path_buf())),
    }
}
