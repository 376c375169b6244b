use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info};

use av_catalog::config::Config;
use av_catalog::domain::{CatalogRun, StandardizedEquipmentRecord};
use av_catalog::logging::init_logging;
use av_catalog::pipeline::processing::validate::ValidatorConfig;
use av_catalog::pipeline::CatalogPipeline;
use av_catalog::taxonomy::Taxonomy;

#[derive(Parser)]
#[command(name = "av_catalog")]
#[command(about = "Cross-venue AV equipment catalog reconciliation")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a raw extraction batch into the equipment catalog
    Run {
        /// Raw extraction batch (JSON mapping venue name to records)
        input: String,
        /// Override the configured output directory
        #[arg(long)]
        output_dir: Option<String>,
    },
    /// Load a taxonomy file and report what it contains
    CheckTaxonomy {
        /// Taxonomy TOML file to validate
        path: String,
    },
}

#[derive(Serialize)]
struct ExportMetadata {
    export_timestamp: String,
    total_venues: usize,
    total_equipment_items: usize,
    data_version: &'static str,
}

#[derive(Serialize)]
struct VenueExport<'a> {
    venue_name: &'a str,
    equipment_count: usize,
    equipment: &'a [StandardizedEquipmentRecord],
}

#[derive(Serialize)]
struct CatalogExport<'a> {
    metadata: ExportMetadata,
    venues: BTreeMap<&'a str, VenueExport<'a>>,
}

#[derive(Serialize)]
struct ReportExport<'a> {
    metadata: ExportMetadata,
    venues: &'a BTreeMap<String, Vec<String>>,
}

fn load_taxonomy(config: &Config) -> Result<Taxonomy> {
    match &config.taxonomy_path {
        Some(path) => {
            info!("loading taxonomy from {path}");
            Ok(Taxonomy::load(path)?)
        }
        None => Ok(Taxonomy::builtin()),
    }
}

async fn run_catalog(config: Config, input: &str, output_dir: Option<String>) -> Result<()> {
    let taxonomy = Arc::new(load_taxonomy(&config)?);

    let batch = av_catalog::domain::load_batch(input)
        .with_context(|| format!("failed to load extraction batch '{input}'"))?;

    info!(venues = batch.len(), "starting catalog run");

    // Venues share only the read-only taxonomy, so each one gets its own
    // blocking task.
    let mut handles = Vec::with_capacity(batch.len());
    for (venue, records) in batch {
        let taxonomy = Arc::clone(&taxonomy);
        let threshold = config.low_confidence_threshold;
        handles.push(tokio::task::spawn_blocking(move || {
            let pipeline = CatalogPipeline::new(&taxonomy).with_validator_config(ValidatorConfig {
                low_confidence_threshold: threshold,
            });
            let (merged, issues) = pipeline.process_venue(&venue, records);
            (venue, merged, issues)
        }));
    }

    let mut run = CatalogRun::default();
    for handle in handles {
        match handle.await {
            Ok((venue, merged, issues)) => {
                run.report.insert(
                    venue.clone(),
                    issues.into_iter().map(|i| i.message).collect(),
                );
                run.catalog.insert(venue, merged);
            }
            Err(e) => error!("venue task panicked: {e}"),
        }
    }

    let output_dir = output_dir.unwrap_or(config.output_dir);
    let (catalog_path, report_path) = export_run(&run, Path::new(&output_dir))?;

    let total_items: usize = run.catalog.values().map(Vec::len).sum();
    let total_issues: usize = run.report.values().map(Vec::len).sum();
    println!("\nCatalog run complete:");
    println!("   Venues processed: {}", run.catalog.len());
    println!("   Equipment items: {total_items}");
    println!("   Validation issues: {total_issues}");
    println!("   Catalog: {}", catalog_path.display());
    println!("   Report:  {}", report_path.display());

    Ok(())
}

/// Write the catalog and validation report as timestamped JSON files.
fn export_run(run: &CatalogRun, output_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output directory '{}'", output_dir.display()))?;

    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let metadata = |total_items: usize| ExportMetadata {
        export_timestamp: Local::now().to_rfc3339(),
        total_venues: run.catalog.len(),
        total_equipment_items: total_items,
        data_version: "1.0",
    };

    let total_items: usize = run.catalog.values().map(Vec::len).sum();
    let catalog = CatalogExport {
        metadata: metadata(total_items),
        venues: run
            .catalog
            .iter()
            .map(|(name, equipment)| {
                (
                    name.as_str(),
                    VenueExport {
                        venue_name: name,
                        equipment_count: equipment.len(),
                        equipment,
                    },
                )
            })
            .collect(),
    };
    let catalog_path = output_dir.join(format!("equipment_catalog_{timestamp}.json"));
    fs::write(&catalog_path, serde_json::to_string_pretty(&catalog)?)?;
    info!("catalog exported to {}", catalog_path.display());

    let report = ReportExport {
        metadata: metadata(total_items),
        venues: &run.report,
    };
    let report_path = output_dir.join(format!("validation_report_{timestamp}.json"));
    fs::write(&report_path, serde_json::to_string_pretty(&report)?)?;
    info!("validation report exported to {}", report_path.display());

    Ok((catalog_path, report_path))
}

fn check_taxonomy(path: &str) -> Result<()> {
    let taxonomy = Taxonomy::load(path)?;
    println!("Taxonomy '{path}' is valid:");
    println!("   Categories: {}", taxonomy.categories().len());
    println!("   Manufacturers: {}", taxonomy.manufacturers().len());
    println!("   Specification keys: {}", taxonomy.spec_keys().len());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let _guard = init_logging();
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Run { input, output_dir } => run_catalog(config, &input, output_dir).await,
        Commands::CheckTaxonomy { path } => check_taxonomy(&path),
    }
}
