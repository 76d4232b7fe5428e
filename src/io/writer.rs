// src/io/writer.rs
use gdal::raster::{Buffer, RasterCreationOptions};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, Driver, DriverManager, GeoTransform, Metadata};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{sink_create_failure, ConvertError, Result};
use crate::grid::GridFile;
use crate::utils::gdal_ext::{TargetKind, TypedSamples};

/// Driver used for the intermediate file of create-copy writes.
const INTERMEDIATE_DRIVER: &str = "GTiff";

/// Raster output formats, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    GeoTiff,
    UsgsDem,
    GrassAscii,
    EsriAscii,
}

impl OutputFormat {
    pub fn for_ext(ext: &str) -> Option<OutputFormat> {
        match ext.to_ascii_lowercase().as_str() {
            "tif" => Some(OutputFormat::GeoTiff),
            "dem" => Some(OutputFormat::UsgsDem),
            "arx" => Some(OutputFormat::GrassAscii),
            "asc" => Some(OutputFormat::EsriAscii),
            _ => None,
        }
    }

    pub fn for_path(path: &Path) -> Result<OutputFormat> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::for_ext)
            .ok_or_else(|| ConvertError::UnsupportedExtension(path.to_path_buf()))
    }

    pub fn driver_name(&self) -> &'static str {
        match self {
            OutputFormat::GeoTiff => "GTiff",
            OutputFormat::UsgsDem => "USGSDEM",
            OutputFormat::GrassAscii => "GRASSASCIIGrid",
            OutputFormat::EsriAscii => "AAIGrid",
        }
    }

    /// USGSDEM only stores 16-bit integers.
    pub fn target_kind(&self) -> TargetKind {
        match self {
            OutputFormat::UsgsDem => TargetKind::Int16,
            _ => TargetKind::Float32,
        }
    }

    /// EPSG code of the CRS to attach, for formats that refuse rasters without one.
    ///
    /// The grid format has no CRS, so USGSDEM output gets NAD27 / UTM zone 11N as
    /// a placeholder.
    pub fn placeholder_epsg(&self) -> Option<u32> {
        match self {
            OutputFormat::UsgsDem => Some(26711),
            _ => None,
        }
    }
}

/// A complete single-band raster ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRaster {
    pub cols: usize,
    pub rows: usize,
    pub geo_transform: GeoTransform,
    pub projection_epsg: Option<u32>,
    pub samples: TypedSamples,
}

/// Destination of exported rasters. The whole raster is handed over in one call.
pub trait RasterSink {
    fn write_raster(&mut self, path: &Path, raster: &ExportRaster) -> Result<()>;
}

/// Writes rasters through the GDAL driver matching the output extension.
///
/// The destination is built inside a scoped temporary directory next to `path` and
/// renamed into place once the driver has closed it. Nothing under `path` is created,
/// truncated or removed when the export fails.
#[derive(Debug, Default)]
pub struct GdalSink;

impl RasterSink for GdalSink {
    fn write_raster(&mut self, path: &Path, raster: &ExportRaster) -> Result<()> {
        let format = OutputFormat::for_path(path)?;
        let file_name = path
            .file_name()
            .ok_or_else(|| ConvertError::UnsupportedExtension(path.to_path_buf()))?;
        let driver = DriverManager::get_driver_by_name(format.driver_name())
            .map_err(|e| sink_create_failure(path, e))?;

        let tmp_dir = tempfile::Builder::new()
            .prefix(".grid-convert")
            .tempdir_in(parent_dir(path))
            .map_err(|e| sink_create_failure(path, e))?;
        let staging = tmp_dir.path().join("out");
        fs::create_dir(&staging)?;
        let staged = staging.join(file_name);

        if supports_create(&driver) {
            write_dataset(&driver, &staged, raster)?;
        } else {
            // driver can only CreateCopy, go through an intermediate GeoTIFF
            let tmp_path = tmp_dir.path().join("intermediate.tif");
            debug!("writing intermediate {}", tmp_path.display());

            let tmp_driver = DriverManager::get_driver_by_name(INTERMEDIATE_DRIVER)
                .map_err(|e| sink_create_failure(&tmp_path, e))?;
            write_dataset(&tmp_driver, &tmp_path, raster)?;

            let src_ds = Dataset::open(&tmp_path).map_err(|e| sink_create_failure(&tmp_path, e))?;
            let dst_ds = src_ds
                .create_copy(&driver, &staged, &RasterCreationOptions::new())
                .map_err(|e| sink_create_failure(path, e))?;
            drop(dst_ds);
            drop(src_ds);
        }

        publish(&staging, &staged, parent_dir(path))?;
        // tmp_dir and whatever is left in it is removed when dropped
        info!("wrote {} ({})", path.display(), format.driver_name());
        Ok(())
    }
}

fn supports_create(driver: &Driver) -> bool {
    driver
        .metadata_item("DCAP_CREATE", "")
        .is_some_and(|v| v.eq_ignore_ascii_case("YES"))
}

/// Move the staged raster and any sidecar files the driver wrote into `dest_dir`.
/// The raster itself goes last.
fn publish(staging: &Path, staged: &Path, dest_dir: &Path) -> Result<()> {
    for entry in fs::read_dir(staging)? {
        let entry = entry?;
        if entry.path() != staged {
            debug!("moving sidecar {}", entry.path().display());
            fs::rename(entry.path(), dest_dir.join(entry.file_name()))?;
        }
    }
    if let Some(name) = staged.file_name() {
        fs::rename(staged, dest_dir.join(name))?;
    }
    Ok(())
}

fn write_dataset(driver: &Driver, path: &Path, raster: &ExportRaster) -> Result<()> {
    let size = (raster.cols, raster.rows);
    let mut out_ds = match &raster.samples {
        TypedSamples::F32(_) => driver.create_with_band_type::<f32, _>(path, size.0, size.1, 1),
        TypedSamples::I16(_) => driver.create_with_band_type::<i16, _>(path, size.0, size.1, 1),
    }
    .map_err(|e| sink_create_failure(path, e))?;

    out_ds.set_geo_transform(&raster.geo_transform)?;
    if let Some(epsg) = raster.projection_epsg {
        let srs = SpatialRef::from_epsg(epsg)?;
        out_ds.set_projection(&srs.to_wkt()?)?;
    }

    let mut band = out_ds.rasterband(1)?;
    match &raster.samples {
        TypedSamples::F32(data) => {
            let mut buffer = Buffer::new(size, data.clone());
            band.write((0, 0), size, &mut buffer)?;
        }
        TypedSamples::I16(data) => {
            let mut buffer = Buffer::new(size, data.clone());
            band.write((0, 0), size, &mut buffer)?;
        }
    }

    out_ds.flush_cache()?;
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

/// Write a grid file atomically: the file only appears under `path` once it is complete.
pub fn write_grid<P: AsRef<Path>>(path: P, grid: &GridFile) -> Result<()> {
    let path = path.as_ref();
    let data = grid.encode()?;

    let mut builder = tempfile::Builder::new();
    builder.prefix(".grid-convert");
    #[cfg(unix)]
    {
        // same mode as a plain create, narrowed by the umask
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    // not visible under its final name yet
    let mut file = builder.tempfile_in(parent_dir(path))?;
    file.write_all(&data)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;

    debug!("wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}

