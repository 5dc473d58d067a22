use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use std::path::Path;

const EXAMPLE_CONFIG: &str = include_str!("../../docs/example_config.yaml");
const EXAMPLE_PORTFOLIO: &str = include_str!("../../docs/portfolio.csv");
const EXAMPLE_UNIVERSE: &str = include_str!("../../docs/ai_universe.csv");

/// Creates a default configuration file with example content at the default location
pub fn setup() -> Result<()> {
    let path = AppConfig::default_config_path()?;
    setup_at_path(path)
}

/// Creates a default configuration file at the specified path, along with
/// example tables next to it unless tables already exist there.
pub fn setup_at_path<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    std::fs::write(path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;
    tracing::info!("Created default configuration at {}", path.display());

    for (name, content) in [
        ("portfolio.csv", EXAMPLE_PORTFOLIO),
        ("ai_universe.csv", EXAMPLE_UNIVERSE),
    ] {
        let table_path = dir.join(name);
        if table_path.exists() {
            tracing::info!("Keeping existing table {}", table_path.display());
            continue;
        }
        std::fs::write(&table_path, content)
            .with_context(|| format!("Failed to write table to {}", table_path.display()))?;
        tracing::info!("Created example table {}", table_path.display());
    }

    Ok(())
}
