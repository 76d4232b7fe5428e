use anyhow::{anyhow, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use std::path::PathBuf;

use crate::grid::ExtentConvention;
use crate::processing::{Centering, NoDataPolicy};

#[derive(Parser)]
#[command(name = "grid-convert", version)]
#[command(about = "Convert GDAL rasters to and from the SARndbox grid format")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CenterMode {
    /// Subtract the mean of all valid samples
    Mean,
    /// Keep sample values (requires --nodata)
    None,
}

impl CenterMode {
    pub fn centering(self, nodata: Option<NoDataPolicy>) -> Result<Centering> {
        match (self, nodata) {
            (CenterMode::Mean, _) => Ok(Centering::Mean),
            (CenterMode::None, Some(nodata)) => Ok(Centering::None { nodata }),
            (CenterMode::None, None) => Err(anyhow!("a no-data policy (keep or zero) is required when not centering")),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a single band raster (GeoTIFF, USGS DEM, ASCII grids, ...) to a .grid file
    ConvertToGrid {
        /// Input raster
        input: PathBuf,

        /// Output grid file (default: input name with .grid extension)
        output: Option<PathBuf>,

        /// Z offset added after scaling
        #[arg(short, long, default_value = "0.0", allow_hyphen_values = true)]
        offset: f64,

        /// Z scale factor
        #[arg(short, long, default_value = "1.0", allow_hyphen_values = true)]
        scale: f64,

        /// Print information about the input raster and exit
        #[arg(short, long)]
        info: bool,

        /// Print --info output as JSON
        #[arg(long, requires = "info")]
        json: bool,

        /// Band to read (1-based)
        #[arg(short, long, default_value = "1")]
        band: usize,

        /// Centering applied before scale and offset
        #[arg(long, value_enum, default_value = "mean")]
        center: CenterMode,

        /// Treatment of no-data samples when not centering
        #[arg(long, value_enum, required_if_eq("center", "none"))]
        nodata: Option<NoDataPolicy>,

        /// Extent convention written to the grid header
        #[arg(long, value_enum, default_value = "edge")]
        extent: ExtentConvention,
    },

    /// Convert a .grid file to a raster; format by extension: tif, dem, arx, asc
    ConvertFromGrid {
        /// Input grid file
        input: PathBuf,

        /// Output raster (default: input name with .dem extension)
        output: Option<PathBuf>,

        /// Extent convention the grid header was written with
        #[arg(long, value_enum, default_value = "edge")]
        extent: ExtentConvention,

        /// Scale applied on import, divided out again
        #[arg(short, long, default_value = "1.0", allow_hyphen_values = true)]
        scale: f64,

        /// Offset applied on import, subtracted again
        #[arg(short, long, default_value = "0.0", allow_hyphen_values = true)]
        offset: f64,
    },

    /// Run a list of conversions from a JSON file
    Batch {
        /// Batch configuration file
        config: PathBuf,
    },
}
