// src/io/mod.rs
pub mod reader;
pub mod writer;

pub use reader::{read_grid, GdalSource, RasterSource};
pub use writer::{write_grid, ExportRaster, GdalSink, OutputFormat, RasterSink};
