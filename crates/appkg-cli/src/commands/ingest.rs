//! `appkg ingest`: CSV to graph.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

use appkg_core::normalize::normalize_table;
use appkg_core::Table;
use appkg_graph::{IngestOptions, Pipeline};

use crate::config::AppConfig;
use crate::output::{self, BarProgress};

#[derive(Args)]
pub struct IngestArgs {
    /// CSV file with a header row
    pub csv: PathBuf,

    /// Rows per bulk write (per-row backends always write one row at a time)
    #[arg(long, default_value_t = 1000)]
    pub batch_size: usize,

    /// Read at most this many data rows
    #[arg(long, default_value_t = 100_000)]
    pub limit: usize,

    /// Per-row backends: stop if this many writes fail before any succeeds (0 disables)
    #[arg(long, default_value_t = 6)]
    pub warmup_failures: usize,

    /// Per-row backends: successful writes between progress updates
    #[arg(long, default_value_t = 500)]
    pub progress_every: usize,

    /// Do not create constraints or labels first
    #[arg(long)]
    pub skip_schema: bool,
}

impl IngestArgs {
    fn options(&self) -> IngestOptions {
        IngestOptions {
            batch_size: self.batch_size,
            warmup_failures: self.warmup_failures,
            progress_every: self.progress_every,
        }
    }
}

pub async fn execute(args: IngestArgs, config: &AppConfig) -> Result<()> {
    let table = Table::read_path(&args.csv, Some(args.limit))
        .with_context(|| format!("Failed to read {}", args.csv.display()))?;
    let normalized = normalize_table(&table);
    output::print_normalized(&args.csv.display().to_string(), &normalized);

    if normalized.records.is_empty() {
        println!("{}", "Nothing to ingest.".dimmed());
        return Ok(());
    }

    let backend = super::open_backend(&config.graph).await?;
    println!("{} {}", "Writing to".bold(), backend.name().cyan());

    let report = Pipeline::new(backend.as_ref(), args.options())
        .skip_schema(args.skip_schema)
        .run_with_progress(&normalized.records, BarProgress::new())
        .await?;

    if let Some(provision) = &report.provision {
        output::print_provision_report(provision);
    }
    output::print_ingest_report(&report.ingest);

    if !report.ingest.is_completed() {
        bail!("Ingestion did not complete");
    }

    let counts = backend.counts().await?;
    println!();
    output::print_counts(backend.name(), &counts);
    Ok(())
}
