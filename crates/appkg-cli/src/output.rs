//! Terminal output formatting.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use appkg_core::clean::CleanReport;
use appkg_core::NormalizedTable;
use appkg_graph::{GraphCounts, IngestOutcome, IngestReport, ProgressReporter, ProvisionReport};
use appkg_qa::AnswerRecord;

/// Print how many rows survived normalization.
pub fn print_normalized(source: &str, table: &NormalizedTable) {
    println!("{} {}", "Loaded".bold(), source.cyan());
    println!("  Rows normalized: {}", table.records.len().to_string().green());
    if table.skipped > 0 {
        println!("  Rows dropped (no id): {}", table.skipped.to_string().yellow());
    }
}

pub fn print_provision_report(report: &ProvisionReport) {
    println!("\n{}", "Schema:".bold());
    println!("  Created:        {}", report.created.to_string().green());
    println!("  Already there:  {}", report.existing.to_string().dimmed());

    if !report.failed.is_empty() {
        println!("  Failed:         {}", report.failed.len().to_string().yellow());
        for (name, error) in &report.failed {
            println!("    {} {} {}", "→".dimmed(), name, error.to_string().dimmed());
        }
    }
}

pub fn print_ingest_report(report: &IngestReport) {
    let heading = match &report.outcome {
        IngestOutcome::Completed => "Ingestion complete:".green().bold(),
        IngestOutcome::Aborted(_) => "Ingestion aborted:".red().bold(),
    };
    println!("\n{}", heading);
    println!("  Rows processed:  {}", report.processed);
    println!("  Rows written:    {}", report.succeeded.to_string().green());
    if report.failed > 0 {
        println!("  Rows failed:     {}", report.failed.to_string().red());
    }
    println!("  Batches:         {}/{}", report.batches_succeeded, report.batches_submitted);
    println!(
        "  Elapsed:         {:.2}s ({:.0} rows/s)",
        report.elapsed.as_secs_f64(),
        report.rate()
    );

    if let IngestOutcome::Aborted(reason) = &report.outcome {
        println!("  Reason:          {}", reason.to_string().red());
    }
}

pub fn print_clean_report(report: &CleanReport, output: &str) {
    println!("{}", "Cleaning complete:".green().bold());
    println!("  Input rows:          {}", report.input_rows);
    println!("  Dropped (missing):   {}", report.dropped_missing.to_string().yellow());
    println!("  Dropped (duplicate): {}", report.dropped_duplicates.to_string().yellow());
    println!("  Written:             {} → {}", report.output_rows.to_string().green(), output.cyan());
}

pub fn print_counts(backend: &str, counts: &GraphCounts) {
    println!("{} {}", "Graph status".bold(), format!("({})", backend).dimmed());
    println!("{}", "─".repeat(40));
    println!("  Nodes:         {}", counts.nodes.to_string().cyan());
    println!("  Relationships: {}", counts.relationships.to_string().cyan());
}

pub fn print_answer(records: &[AnswerRecord], show_query: bool) {
    let Some(record) = records.first() else {
        println!("{}", "No answer.".dimmed());
        return;
    };

    if show_query {
        for cypher in &record.sql {
            println!("{} {}", "Cypher:".dimmed(), cypher.dimmed());
        }
    }

    if record.is_error() {
        println!("{}", record.answer.red());
    } else {
        println!("{}", record.answer);
    }
}

/// Progress bar for ingestion.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        Self { bar }
    }
}

impl ProgressReporter for BarProgress {
    fn start(&mut self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
    }

    fn advance(&mut self, processed: usize, succeeded: usize) {
        self.bar.set_position(processed as u64);
        self.bar.set_message(format!("{} written", succeeded));
    }

    fn finish(&mut self, report: &IngestReport) {
        self.bar.set_position(report.processed as u64);
        self.bar.finish_and_clear();
    }
}
