//! `evitrack config` command implementation
//!
//! Prints the resolved configuration. Settings are changed through
//! environment variables (or a `.env` file), not through the CLI.

use crate::config::{Config, CATALOG_ENV, DATA_DIR_ENV, DOWNLOAD_DIR_ENV};
use crate::error::Result;
use colored::Colorize;

/// Print one configuration value
pub async fn get(config: &Config, key: &str) -> Result<()> {
    println!("{}", config.value_of(key)?);
    Ok(())
}

/// Show all configuration
pub async fn show(config: &Config) -> Result<()> {
    println!("{}", "Evitrack Configuration:".cyan().bold());
    println!();
    for key in crate::config::CONFIG_KEYS {
        println!("{:<15} {}", format!("{}:", key), config.value_of(key)?);
    }
    println!();
    println!("{}", "Environment Variables:".cyan());
    println!("  {:<22} - Data directory (database lives here)", DATA_DIR_ENV);
    println!("  {:<22} - Where downloads are saved", DOWNLOAD_DIR_ENV);
    println!("  {:<22} - YAML catalog used instead of the built-in ones", CATALOG_ENV);
    println!("  {:<22} - Log level (error, warn, info, debug, trace)", "EVITRACK_LOG_LEVEL");

    Ok(())
}
