// src/pipeline/mod.rs
pub mod export;
pub mod import;

pub use export::{default_raster_path, export_grid, grid_to_raster, ExportOptions, GridExporter};
pub use import::{default_grid_path, import_raster, raster_info, GridImporter, ImportOptions, ImportSummary, RasterInfo};
