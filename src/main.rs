// src/main.rs
use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use grid_convert::batch::process_batch;
use grid_convert::cli::{Cli, Commands};
use grid_convert::pipeline::{
    default_grid_path, default_raster_path, ExportOptions, GridExporter, GridImporter, ImportOptions, RasterInfo,
};
use grid_convert::processing::{DenormalizeOptions, NormalizeOptions};
use grid_convert::ConvertError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            let code = e.downcast_ref::<ConvertError>().map(ConvertError::exit_code).unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

/// RUST_LOG takes precedence over -v
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::ConvertToGrid { input, output, offset, scale, info, json, band, center, nodata, extent } => {
            let options = ImportOptions {
                normalize: NormalizeOptions {
                    scale: *scale,
                    offset: *offset,
                    centering: center.centering(*nodata)?,
                },
                extent: *extent,
            };
            let importer = GridImporter::new(options).with_band(*band);

            if *info {
                let raster_info = importer.info(input)?;
                if *json {
                    println!("{}", serde_json::to_string_pretty(&raster_info)?);
                } else {
                    print_info(&raster_info);
                }
                return Ok(());
            }

            let output = output.clone().unwrap_or_else(|| default_grid_path(input));
            importer.process(input, &output)?;
            println!("Processing complete: {}", output.display());
        }
        Commands::ConvertFromGrid { input, output, extent, scale, offset } => {
            let options = ExportOptions {
                denormalize: DenormalizeOptions { scale: *scale, offset: *offset },
                extent: *extent,
            };
            let output = output.clone().unwrap_or_else(|| default_raster_path(input));
            GridExporter::new(options).process(input, &output)?;
            println!("Processing complete: {}", output.display());
        }
        Commands::Batch { config } => process_batch(config)?,
    }

    Ok(())
}

fn print_info(info: &RasterInfo) {
    let fmt_opt = |v: Option<f64>| v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string());

    println!("rows: {}", info.rows);
    println!("cols: {}", info.cols);
    println!("type: {:?}", info.kind);
    println!("nodata: {} {}", fmt_opt(info.no_data), info.stats.no_data);
    println!(
        "extent: {:.2}, {:.2}, {:.2}, {:.2}",
        info.extent.x_min, info.extent.y_max, info.extent.x_max, info.extent.y_min
    );
    println!("min z: {}", fmt_opt(info.stats.min));
    println!("max z: {}", fmt_opt(info.stats.max));
    println!("avg z: {}", fmt_opt(info.stats.mean));
}
