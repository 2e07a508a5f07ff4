//! Validate a host configuration and the datasets it points at.
//!
//! Usage: `searchneu-check-data [CONFIG]`. Without an argument the default
//! config path is used. Prints a JSON summary of what was loaded to stdout;
//! logs go to stderr.

use std::path::PathBuf;

use anyhow::Context;
use searchneu::HostConfig;
use searchneu::dataset;

fn main() -> anyhow::Result<()> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(HostConfig::default_config_path);

    let config = HostConfig::from_file(&path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    let _guard = searchneu::logging::init(&config.logging)?;
    config.validate()?;

    let provider = dataset::load_provider(&config.data.term_dumps)?;
    let employees = match &config.data.employees {
        Some(path) => dataset::load_employees(path)?.len(),
        None => 0,
    };

    let summary = serde_json::json!({
        "config": path,
        "terms": provider.term_count(),
        "classes": provider.class_count(),
        "sections": provider.section_count(),
        "employees": employees,
        "checkedAt": chrono::Utc::now().to_rfc3339(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    tracing::info!(config = %path.display(), "datasets are valid");
    Ok(())
}
