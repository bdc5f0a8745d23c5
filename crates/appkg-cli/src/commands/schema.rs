//! `appkg schema`: provisioning only.

use anyhow::Result;
use colored::Colorize;

use appkg_graph::SchemaProvisioner;

use crate::config::AppConfig;
use crate::output;

pub async fn execute(config: &AppConfig) -> Result<()> {
    let backend = super::open_backend(&config.graph).await?;
    println!("{} {}", "Provisioning schema on".bold(), backend.name().cyan());

    let report = SchemaProvisioner::new(backend.as_ref()).provision().await?;
    output::print_provision_report(&report);
    Ok(())
}
