// tests/pipeline_tests.rs
use std::fs;
use std::path::{Path, PathBuf};

use gdal::{Dataset, DriverManager, GeoTransform};
use gdal::raster::Buffer;
use grid_convert::batch::{load_batch_config, process_batch};
use grid_convert::cli::CenterMode;
use grid_convert::grid::{decode, ExtentConvention, GridFile, GridHeader};
use grid_convert::io::{
    read_grid, write_grid, ExportRaster, GdalSink, GdalSource, OutputFormat, RasterSink, RasterSource,
};
use grid_convert::pipeline::{
    default_grid_path, default_raster_path, export_grid, import_raster, raster_info, ExportOptions, GridExporter,
    GridImporter, ImportOptions,
};
use grid_convert::utils::gdal_ext::{NumericKind, TargetKind, TypedSamples};
use grid_convert::{ConvertError, Result};

/// In-memory raster band
struct MemSource {
    size: (usize, usize),
    geo_transform: GeoTransform,
    no_data: Option<f64>,
    data: Vec<f64>,
}

impl RasterSource for MemSource {
    fn raster_size(&self) -> (usize, usize) {
        self.size
    }

    fn geo_transform(&self) -> Result<GeoTransform> {
        Ok(self.geo_transform)
    }

    fn numeric_kind(&self) -> Result<NumericKind> {
        Ok(NumericKind::Float64)
    }

    fn no_data_value(&self) -> Option<f64> {
        self.no_data
    }

    fn read_window(&self, offset: (usize, usize), size: (usize, usize)) -> Result<Vec<f64>> {
        let mut out = Vec::with_capacity(size.0 * size.1);
        for row in offset.1..offset.1 + size.1 {
            let start = row * self.size.0 + offset.0;
            out.extend_from_slice(&self.data[start..start + size.0]);
        }
        Ok(out)
    }
}

/// Records every raster it is asked to write
#[derive(Default)]
struct MemSink {
    written: Vec<(PathBuf, ExportRaster)>,
}

impl RasterSink for MemSink {
    fn write_raster(&mut self, path: &Path, raster: &ExportRaster) -> Result<()> {
        self.written.push((path.to_path_buf(), raster.clone()));
        Ok(())
    }
}

fn source_2x2() -> MemSource {
    MemSource {
        size: (2, 2),
        geo_transform: [0.0, 10.0, 0.0, 20.0, 0.0, -10.0],
        no_data: None,
        data: vec![1.0, 2.0, 3.0, 6.0],
    }
}

fn assert_transform_eq(expected: &GeoTransform, actual: &GeoTransform, eps: f64) {
    for (a, b) in expected.iter().zip(actual.iter()) {
        assert!((a - b).abs() < eps, "expected {:?}, got {:?}", expected, actual);
    }
}

#[test]
fn test_import_scenario_2x2() {
    let (grid, summary) = import_raster(&source_2x2(), &ImportOptions::default()).unwrap();

    assert_eq!(
        grid.header,
        GridHeader { cols: 2, rows: 2, x_min: 0.0, y_min: 0.0, x_max: 20.0, y_max: 20.0 }
    );
    assert_eq!(grid.payload, vec![-2.0, -1.0, 0.0, 3.0]);
    assert_eq!(summary.mean, Some(3.0));
}

#[test]
fn test_read_window() {
    let source = MemSource {
        size: (3, 2),
        geo_transform: [0.0, 1.0, 0.0, 0.0, 0.0, -1.0],
        no_data: None,
        data: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
    };
    assert_eq!(source.read_window((1, 0), (2, 2)).unwrap(), vec![2.0, 3.0, 5.0, 6.0]);
    assert_eq!(source.read_all().unwrap().len(), 6);
}

/// import, encode, decode and export must reconstruct the source geotransform
#[test]
fn test_round_trip_geotransform() {
    let source = MemSource {
        size: (5, 4),
        geo_transform: [650000.0, 0.5, 0.0, 5270000.0, 0.0, -0.5],
        no_data: None,
        data: (0..20).map(|i| 100.0 + i as f64).collect(),
    };

    let (grid, _) = import_raster(&source, &ImportOptions::default()).unwrap();
    let decoded = decode(&grid.encode().unwrap()).unwrap();

    let mut sink = MemSink::default();
    export_grid(&decoded, Path::new("out.tif"), &mut sink, &ExportOptions::default()).unwrap();

    let (path, raster) = &sink.written[0];
    assert_eq!(path, Path::new("out.tif"));
    assert_eq!((raster.cols, raster.rows), (5, 4));
    assert_eq!(raster.projection_epsg, None);
    // header values are f32
    assert_transform_eq(&source.geo_transform, &raster.geo_transform, 0.5);
    assert!((raster.geo_transform[1] - 0.5).abs() < 1e-6);
    assert!((raster.geo_transform[5] + 0.5).abs() < 1e-6);
}

#[test]
fn test_round_trip_center_convention() {
    let source = source_2x2();
    let options = ImportOptions { extent: ExtentConvention::Center, ..Default::default() };
    let (grid, _) = import_raster(&source, &options).unwrap();

    let mut sink = MemSink::default();
    let export_options = ExportOptions { extent: ExtentConvention::Center, ..Default::default() };
    export_grid(&grid, Path::new("out.asc"), &mut sink, &export_options).unwrap();

    assert_transform_eq(&source.geo_transform, &sink.written[0].1.geo_transform, 1e-9);
}

#[test]
fn test_export_dem_is_int16_with_projection() {
    let header = GridHeader { cols: 2, rows: 1, x_min: 0.0, y_min: 0.0, x_max: 2.0, y_max: 1.0 };
    let grid = GridFile::new(header, vec![12.7, -3.9]).unwrap();

    let mut sink = MemSink::default();
    export_grid(&grid, Path::new("terrain.dem"), &mut sink, &ExportOptions::default()).unwrap();

    let raster = &sink.written[0].1;
    assert_eq!(raster.samples.kind(), TargetKind::Int16);
    assert_eq!(raster.samples, TypedSamples::I16(vec![12, -3]));
    assert_eq!(raster.projection_epsg, Some(26711));
}

#[test]
fn test_export_out_of_range_writes_nothing() {
    let header = GridHeader { cols: 2, rows: 1, x_min: 0.0, y_min: 0.0, x_max: 2.0, y_max: 1.0 };
    let grid = GridFile::new(header, vec![1.0, 40000.0]).unwrap();

    let mut sink = MemSink::default();
    let err = export_grid(&grid, Path::new("terrain.dem"), &mut sink, &ExportOptions::default()).unwrap_err();
    assert!(matches!(err, ConvertError::OutOfRange { index: 1, .. }));
    assert!(sink.written.is_empty());
}

#[test]
fn test_output_formats() {
    assert_eq!(OutputFormat::for_path(Path::new("a.tif")).unwrap(), OutputFormat::GeoTiff);
    assert_eq!(OutputFormat::for_path(Path::new("a.DEM")).unwrap(), OutputFormat::UsgsDem);
    assert_eq!(OutputFormat::for_path(Path::new("a.arx")).unwrap().driver_name(), "GRASSASCIIGrid");
    assert_eq!(OutputFormat::for_path(Path::new("a.asc")).unwrap().driver_name(), "AAIGrid");

    let err = OutputFormat::for_path(Path::new("a.png")).unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedExtension(_)));
    assert_eq!(err.exit_code(), 2);
    assert!(OutputFormat::for_path(Path::new("noext")).is_err());
}

#[test]
fn test_default_paths() {
    assert_eq!(default_grid_path(Path::new("data/lake.tif")), PathBuf::from("data/lake.grid"));
    assert_eq!(default_raster_path(Path::new("data/lake.grid")), PathBuf::from("data/lake.dem"));
}

#[test]
fn test_write_and_read_grid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sandbox.grid");

    let (grid, _) = import_raster(&source_2x2(), &ImportOptions::default()).unwrap();
    write_grid(&path, &grid).unwrap();

    assert_eq!(fs::metadata(&path).unwrap().len(), 24 + 4 * 4);
    assert_eq!(read_grid(&path).unwrap(), grid);

    // only the final file is left behind
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_read_grid_errors() {
    let dir = tempfile::tempdir().unwrap();

    let err = read_grid(dir.path().join("terrain.tif")).unwrap_err();
    assert!(matches!(err, ConvertError::NotAGridFile(_)));

    let err = read_grid(dir.path().join("missing.grid")).unwrap_err();
    assert!(matches!(err, ConvertError::InputNotFound(_)));
    assert_eq!(err.exit_code(), 3);

    let short = dir.path().join("short.grid");
    fs::write(&short, [1u8, 0, 0, 0]).unwrap();
    assert!(matches!(read_grid(&short), Err(ConvertError::TruncatedHeader(4))));
}

#[test]
fn test_exporter_checks_output_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("missing.grid");

    let mut exporter = GridExporter::with_sink(ExportOptions::default(), MemSink::default());
    let err = exporter.process(&input, &dir.path().join("out.png")).unwrap_err();
    assert!(matches!(err, ConvertError::UnsupportedExtension(_)));

    let err = exporter.process(&input, &dir.path().join("out.tif")).unwrap_err();
    assert!(matches!(err, ConvertError::InputNotFound(_)));

    // the input extension is checked before the output extension
    let err = exporter.process(&dir.path().join("terrain.tif"), &dir.path().join("out.png")).unwrap_err();
    assert!(matches!(err, ConvertError::NotAGridFile(_)));
    assert!(exporter.sink().written.is_empty());
}

#[test]
fn test_exporter_with_sink() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("terrain.grid");
    let (grid, _) = import_raster(&source_2x2(), &ImportOptions::default()).unwrap();
    write_grid(&input, &grid).unwrap();

    let output = dir.path().join("terrain.arx");
    let mut exporter = GridExporter::with_sink(ExportOptions::default(), MemSink::default());
    exporter.process(&input, &output).unwrap();

    let (path, raster) = &exporter.sink().written[0];
    assert_eq!(path, &output);
    assert_eq!(raster.samples, TypedSamples::F32(vec![-2.0, -1.0, 0.0, 3.0]));
}

#[test]
fn test_raster_info() {
    let source = MemSource { no_data: Some(-1.0), data: vec![4.0, -1.0, 8.0, 6.0], ..source_2x2() };
    let info = raster_info(&source, ExtentConvention::Edge).unwrap();

    assert_eq!((info.cols, info.rows), (2, 2));
    assert_eq!(info.stats.no_data, 1);
    assert_eq!(info.stats.mean, Some(6.0));
    assert_eq!(info.extent.x_max, 20.0);

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["kind"], "Float64");
    assert_eq!(json["stats"]["max"], 8.0);
}

#[test]
fn test_batch_config_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("batch.json");
    fs::write(
        &path,
        r#"{
            "global": { "scale": 2.0, "extent": "center" },
            "operations": [
                { "type": "to-grid", "input": "a.tif", "center": "none", "nodata": "zero" },
                { "type": "from-grid", "input": "a.grid", "output": "a.asc", "scale": 0.5 }
            ]
        }"#,
    )
    .unwrap();

    let config = load_batch_config(&path).unwrap();
    assert_eq!(config.global.scale, 2.0);
    assert_eq!(config.global.offset, 0.0);
    assert_eq!(config.global.center, CenterMode::Mean);
    assert_eq!(config.global.extent, ExtentConvention::Center);
    assert_eq!(config.global.band, 1);
    assert_eq!(config.operations.len(), 2);
    assert_eq!(config.operations[0].center, Some(CenterMode::None));
    assert_eq!(config.operations[1].output, Some(PathBuf::from("a.asc")));
}

#[test]
fn test_batch_unknown_operation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("batch.json");
    fs::write(&path, r#"{ "operations": [ { "type": "reproject", "input": "a.tif" } ] }"#).unwrap();

    let err = process_batch(&path).unwrap_err();
    assert!(err.to_string().contains("Unknown operation type"));
}

#[test]
fn test_center_none_requires_policy() {
    assert!(CenterMode::None.centering(None).is_err());
    assert!(CenterMode::Mean.centering(None).is_ok());
}

/// Write a small GeoTIFF through GDAL to use as import input
fn create_test_tiff(path: &Path, no_data: Option<f64>, data: Vec<f32>, size: (usize, usize)) {
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut ds = driver.create_with_band_type::<f32, _>(path, size.0, size.1, 1).unwrap();
    ds.set_geo_transform(&[1000.0, 5.0, 0.0, 2000.0, 0.0, -5.0]).unwrap();

    let mut band = ds.rasterband(1).unwrap();
    if no_data.is_some() {
        band.set_no_data_value(no_data).unwrap();
    }
    let mut buffer = Buffer::new(size, data);
    band.write((0, 0), size, &mut buffer).unwrap();
    ds.flush_cache().unwrap();
}

#[test]
fn test_gdal_import_export() {
    let dir = tempfile::tempdir().unwrap();
    let tif = dir.path().join("input.tif");
    create_test_tiff(&tif, Some(-9999.0), vec![10.0, 20.0, -9999.0, 30.0, 40.0, 50.0], (3, 2));

    let source = GdalSource::open(&tif, 1).unwrap();
    assert_eq!(source.raster_size(), (3, 2));
    assert_eq!(source.no_data_value(), Some(-9999.0));
    assert_eq!(source.numeric_kind().unwrap(), NumericKind::Float32);

    let grid_path = dir.path().join("input.grid");
    let summary = GridImporter::new(ImportOptions::default()).process(&tif, &grid_path).unwrap();
    assert_eq!(summary.mean, Some(30.0));
    assert_eq!(summary.no_data_count, 1);

    let grid = read_grid(&grid_path).unwrap();
    assert_eq!(grid.payload, vec![-20.0, -10.0, 0.0, 0.0, 10.0, 20.0]);
    assert_eq!((grid.header.x_min, grid.header.x_max), (1000.0, 1015.0));
    assert_eq!((grid.header.y_min, grid.header.y_max), (1990.0, 2000.0));

    // tif is written directly, asc goes through CreateCopy
    for ext in ["tif", "asc"] {
        let out = dir.path().join(format!("output.{ext}"));
        GridExporter::new(ExportOptions::default()).process(&grid_path, &out).unwrap();

        let back = GdalSource::open(&out, 1).unwrap();
        assert_eq!(back.raster_size(), (3, 2));
        assert_transform_eq(&[1000.0, 5.0, 0.0, 2000.0, 0.0, -5.0], &back.geo_transform().unwrap(), 1e-6);
        let values = back.read_all().unwrap();
        assert!((values[5] - 20.0).abs() < 1e-6);
    }

    assert!(scratch_entries(dir.path()).is_empty(), "temporary files left behind");
}

#[test]
fn test_gdal_source_errors() {
    let dir = tempfile::tempdir().unwrap();

    let err = GdalSource::open(dir.path().join("missing.tif"), 1).err().unwrap();
    assert!(matches!(err, ConvertError::InputNotFound(_)));

    let garbage = dir.path().join("garbage.tif");
    fs::write(&garbage, b"not a raster").unwrap();
    let err = GdalSource::open(&garbage, 1).err().unwrap();
    assert!(matches!(err, ConvertError::SourceOpenFailure { .. }));
    assert_eq!(err.exit_code(), 2);

    // existing paths GDAL cannot read are open failures, not missing inputs
    let err = GdalSource::open(dir.path(), 1).err().unwrap();
    assert!(matches!(err, ConvertError::SourceOpenFailure { .. }));

    let tif = dir.path().join("one.tif");
    create_test_tiff(&tif, None, vec![1.0], (1, 1));
    assert!(matches!(GdalSource::open(&tif, 2), Err(ConvertError::BandNotFound(2))));
}

#[test]
fn test_gdal_source_virtual_path() {
    let path = Path::new("/vsimem/grid_convert_source.tif");
    create_test_tiff(path, None, vec![1.0, 2.0, 3.0, 4.0], (2, 2));

    let source = GdalSource::open(path, 1).unwrap();
    assert_eq!(source.raster_size(), (2, 2));
    assert_eq!(source.read_all().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    drop(source);
    gdal::vsi::unlink_mem_file(path).unwrap();

    let err = GdalSource::open("/vsimem/grid_convert_missing.tif", 1).err().unwrap();
    assert!(matches!(err, ConvertError::SourceOpenFailure { .. }));
}

fn scratch_entries(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(".grid-convert"))
        .collect()
}

#[test]
fn test_gdal_export_dem() {
    let dir = tempfile::tempdir().unwrap();
    let header = GridHeader { cols: 3, rows: 2, x_min: 500000.0, y_min: 4000000.0, x_max: 500030.0, y_max: 4000020.0 };
    let grid = GridFile::new(header, vec![12.7, -3.9, 100.2, 5.5, 0.0, 7.9]).unwrap();
    let input = dir.path().join("terrain.grid");
    write_grid(&input, &grid).unwrap();

    let output = dir.path().join("terrain.dem");
    GridExporter::new(ExportOptions::default()).process(&input, &output).unwrap();

    let back = GdalSource::open(&output, 1).unwrap();
    assert_eq!(back.raster_size(), (3, 2));
    assert_transform_eq(&[500000.0, 10.0, 0.0, 4000020.0, 0.0, -10.0], &back.geo_transform().unwrap(), 1e-3);
    assert_eq!(back.read_all().unwrap(), vec![12.0, -3.0, 100.0, 5.0, 0.0, 7.0]);

    let ds = Dataset::open(&output).unwrap();
    assert!(ds.projection().contains("NAD27"), "unexpected projection {}", ds.projection());

    assert!(scratch_entries(dir.path()).is_empty(), "temporary files left behind");
}

#[test]
fn test_gdal_failed_export_keeps_existing_output() {
    let dir = tempfile::tempdir().unwrap();

    for ext in ["tif", "asc", "dem"] {
        let output = dir.path().join(format!("previous.{ext}"));
        fs::write(&output, b"earlier export").unwrap();

        // EPSG:1 does not exist, so writing the projection fails mid-export
        let raster = ExportRaster {
            cols: 2,
            rows: 1,
            geo_transform: [0.0, 1.0, 0.0, 1.0, 0.0, -1.0],
            projection_epsg: Some(1),
            samples: TypedSamples::I16(vec![1, 2]),
        };
        assert!(GdalSink.write_raster(&output, &raster).is_err());

        assert_eq!(fs::read(&output).unwrap(), b"earlier export");
        assert!(scratch_entries(dir.path()).is_empty(), "temporary files left behind for {ext}");
    }

    let fresh = dir.path().join("fresh.dem");
    let raster = ExportRaster {
        cols: 1,
        rows: 1,
        geo_transform: [0.0, 1.0, 0.0, 1.0, 0.0, -1.0],
        projection_epsg: Some(1),
        samples: TypedSamples::I16(vec![1]),
    };
    assert!(GdalSink.write_raster(&fresh, &raster).is_err());
    assert!(!fresh.exists());
    assert!(scratch_entries(dir.path()).is_empty());
}

#[cfg(unix)]
#[test]
fn test_grid_file_mode_matches_plain_create() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let plain = dir.path().join("plain.bin");
    fs::write(&plain, b"x").unwrap();

    let path = dir.path().join("shared.grid");
    let (grid, _) = import_raster(&source_2x2(), &ImportOptions::default()).unwrap();
    write_grid(&path, &grid).unwrap();

    let mode = |p: &Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode(&path), mode(&plain));
}
