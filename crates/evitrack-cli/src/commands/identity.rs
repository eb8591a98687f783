//! `evitrack identity` command implementation
//!
//! The identity is the name stamped on evidence shared from this machine.

use crate::commands::open_store;
use crate::config::Config;
use crate::error::Result;
use crate::session::SessionIdentity;
use colored::Colorize;

/// Print the current identity
pub async fn show(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let identity = SessionIdentity::load(&store);

    if identity.is_default() {
        println!("{} {}", identity, "(default)".dimmed());
        println!("Run 'evitrack identity set <name>' to change it.");
    } else {
        println!("{}", identity);
    }
    Ok(())
}

/// Store a new identity
pub async fn set(config: &Config, name: &str) -> Result<()> {
    let mut store = open_store(config)?;
    let identity = SessionIdentity::save(&mut store, name)?;

    println!("{} Evidence will be shared as {}", "✓".green(), identity.to_string().bold());
    Ok(())
}
