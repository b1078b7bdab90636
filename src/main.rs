use anyhow::{bail, Context, Result};
use clap::Parser;
use landparcel::config::UploadConfig;
use landparcel::report;
use std::fs;
use std::path::PathBuf;

/// Measure a land-parcel boundary file (.shp, .kml or .kmz) into an
/// area/centroid/bounding-box report.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the boundary file on disk
    file: PathBuf,

    /// Declared file name, when it differs from the stored path
    #[arg(short, long)]
    name: Option<String>,

    /// Print the structured report as JSON instead of the text summary
    #[arg(long)]
    json: bool,

    /// Upload-limit configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => UploadConfig::load_from_file(path)?,
        None => UploadConfig::default(),
    };

    let declared_name = match &cli.name {
        Some(name) => name.clone(),
        None => cli
            .file
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .context("input path has no file name")?,
    };

    // Upload-style pre-validation; the measurement core never checks sizes.
    let metadata = fs::metadata(&cli.file)
        .with_context(|| format!("Failed to read input file: {:?}", cli.file))?;
    if metadata.len() > config.max_file_size {
        bail!(
            "file is {} bytes, over the {} byte limit",
            metadata.len(),
            config.max_file_size
        );
    }
    if !config.allows_extension(&declared_name) {
        bail!("file type not allowed: {}", declared_name);
    }

    let property = landparcel::process_property_file(&cli.file, &declared_name)?;
    let rendered = report::render(&property, &declared_name);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&rendered.structured)?);
    } else {
        println!("{}", rendered.summary);
    }

    Ok(())
}
