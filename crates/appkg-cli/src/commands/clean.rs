//! `appkg clean`: raw export to ingestion-ready CSV.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use appkg_core::clean::clean_table;
use appkg_core::Table;

use crate::output;

#[derive(Args)]
pub struct CleanArgs {
    /// Raw CSV export
    pub input: PathBuf,

    /// Where to write the cleaned CSV
    pub output: PathBuf,
}

pub fn execute(args: CleanArgs) -> Result<()> {
    let raw = Table::read_path(&args.input, None)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let (cleaned, report) = clean_table(&raw)?;
    cleaned
        .write_path(&args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    output::print_clean_report(&report, &args.output.display().to_string());
    Ok(())
}
