//! `appkg status`: node and relationship counts.

use anyhow::Result;

use crate::config::AppConfig;
use crate::output;

pub async fn execute(config: &AppConfig) -> Result<()> {
    let backend = super::open_backend(&config.graph).await?;
    let counts = backend.counts().await?;
    output::print_counts(backend.name(), &counts);
    Ok(())
}
