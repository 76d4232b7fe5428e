// src/batch.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::CenterMode;
use crate::grid::ExtentConvention;
use crate::pipeline::{default_grid_path, default_raster_path, ExportOptions, GridExporter, GridImporter, ImportOptions};
use crate::processing::{DenormalizeOptions, NoDataPolicy, NormalizeOptions};

#[derive(Deserialize, Debug)]
pub struct BatchConfig {
    #[serde(default)]
    pub global: GlobalParams,
    pub operations: Vec<Operation>,
}

#[derive(Deserialize, Debug)]
pub struct GlobalParams {
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub offset: f64,
    #[serde(default = "default_center")]
    pub center: CenterMode,
    #[serde(default)]
    pub nodata: Option<NoDataPolicy>,
    #[serde(default)]
    pub extent: ExtentConvention,
    #[serde(default = "default_band")]
    pub band: usize,
}

impl Default for GlobalParams {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            offset: 0.0,
            center: default_center(),
            nodata: None,
            extent: ExtentConvention::default(),
            band: default_band(),
        }
    }
}

fn default_scale() -> f64 {
    1.0
}

fn default_center() -> CenterMode {
    CenterMode::Mean
}

fn default_band() -> usize {
    1
}

#[derive(Deserialize, Debug)]
pub struct Operation {
    #[serde(rename = "type")]
    pub op_type: String,
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub scale: Option<f64>,
    pub offset: Option<f64>,
    pub center: Option<CenterMode>,
    pub nodata: Option<NoDataPolicy>,
    pub extent: Option<ExtentConvention>,
    pub band: Option<usize>,
}

pub fn load_batch_config(config_path: &Path) -> Result<BatchConfig> {
    let config_content = fs::read_to_string(config_path)
        .with_context(|| format!("cannot read batch file {}", config_path.display()))?;
    let config: BatchConfig = serde_json::from_str(&config_content)
        .with_context(|| format!("invalid batch file {}", config_path.display()))?;
    Ok(config)
}

pub fn process_batch(config_path: &Path) -> Result<()> {
    let config = load_batch_config(config_path)?;

    info!("starting batch with {} operations", config.operations.len());

    for (i, op) in config.operations.iter().enumerate() {
        // operation values override the global ones
        let scale = op.scale.unwrap_or(config.global.scale);
        let offset = op.offset.unwrap_or(config.global.offset);
        let extent = op.extent.unwrap_or(config.global.extent);

        match op.op_type.to_lowercase().as_str() {
            "to-grid" => {
                let center = op.center.unwrap_or(config.global.center);
                let nodata = op.nodata.or(config.global.nodata);
                let options = ImportOptions {
                    normalize: NormalizeOptions {
                        scale,
                        offset,
                        centering: center.centering(nodata)?,
                    },
                    extent,
                };
                let output = op.output.clone().unwrap_or_else(|| default_grid_path(&op.input));
                println!("[{}/{}] {} -> {}", i + 1, config.operations.len(), op.input.display(), output.display());

                GridImporter::new(options)
                    .with_band(op.band.unwrap_or(config.global.band))
                    .process(&op.input, &output)
                    .with_context(|| format!("operation {} failed", i + 1))?;
            }
            "from-grid" => {
                let options = ExportOptions {
                    denormalize: DenormalizeOptions { scale, offset },
                    extent,
                };
                let output = op.output.clone().unwrap_or_else(|| default_raster_path(&op.input));
                println!("[{}/{}] {} -> {}", i + 1, config.operations.len(), op.input.display(), output.display());

                GridExporter::new(options)
                    .process(&op.input, &output)
                    .with_context(|| format!("operation {} failed", i + 1))?;
            }
            _ => return Err(anyhow::anyhow!("Unknown operation type: {}", op.op_type)),
        }
    }

    println!("Batch processing complete!");
    Ok(())
}
