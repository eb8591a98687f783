//! `evitrack ledger` command implementation
//!
//! Lists and edits the flat evidence ledger stored in the data directory.

use crate::commands::open_store;
use crate::config::Config;
use crate::download::DirectorySink;
use crate::error::{Result, TrackerError};
use crate::ledger::{EvidenceEntry, EvidenceLedger, LedgerChange, RemovalOutcome};
use crate::notify::ConsoleNotifier;
use crate::session::SessionIdentity;
use colored::Colorize;

/// Print the ledger as a table or as JSON
pub async fn list(config: &Config, json: bool) -> Result<()> {
    let store = open_store(config)?;
    let ledger = EvidenceLedger::load(&store);

    if json {
        println!("{}", serde_json::to_string_pretty(ledger.list())?);
    } else if ledger.list().is_empty() {
        println!("The ledger is empty.");
        println!("Run 'evitrack ledger add <name>' to record evidence.");
    } else {
        print!("{}", format_as_table(ledger.list()));
    }
    Ok(())
}

/// Record a new entry shared by the stored identity
///
/// Fails when the entry could not be written, since nothing outlives this process.
pub async fn add(config: &Config, name: &str) -> Result<()> {
    let mut store = open_store(config)?;
    let identity = SessionIdentity::load(&store);
    let mut ledger = EvidenceLedger::load(&store);
    let mut notifier = ConsoleNotifier::new();

    let entry = ledger
        .add(name, identity.as_str(), &mut store, &mut notifier)
        .and_then(LedgerChange::into_saved)
        .map_err(TrackerError::reported)?;
    println!("  id: {}", entry.id);
    Ok(())
}

/// Remove an entry after confirmation
pub async fn remove(config: &Config, id: u64, yes: bool) -> Result<()> {
    let mut store = open_store(config)?;
    let mut ledger = EvidenceLedger::load(&store);
    let mut notifier = ConsoleNotifier::new().assume_yes(yes);

    match ledger.remove(id, &mut store, &mut notifier) {
        RemovalOutcome::Removed(change) => change
            .into_saved()
            .map(|_| ())
            .map_err(TrackerError::reported),
        RemovalOutcome::Cancelled => {
            println!("Removal cancelled.");
            Ok(())
        },
        RemovalOutcome::NotFound => Err(TrackerError::not_found(format!("ledger entry #{}", id))),
    }
}

/// Save a placeholder file for `name` into the download directory
pub async fn download(config: &Config, name: &str) -> Result<()> {
    let store = open_store(config)?;
    let ledger = EvidenceLedger::load(&store);
    let sink = DirectorySink::new(config.download_dir());
    let mut notifier = ConsoleNotifier::new();

    ledger
        .download(name, &sink, &mut notifier)
        .map_err(TrackerError::reported)?;
    Ok(())
}

/// Format entries as a table
pub fn format_as_table(entries: &[EvidenceEntry]) -> String {
    use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["ID", "Name", "Date", "Shared by"]);

    for entry in entries {
        table.add_row(vec![
            entry.id.to_string(),
            entry.name.clone(),
            entry.date.clone(),
            entry.shared_by.clone(),
        ]);
    }

    format!("{}\n", table)
}

/// One-line summary used by the shell
pub fn format_summary(entries: &[EvidenceEntry]) -> String {
    let noun = if entries.len() == 1 { "entry" } else { "entries" };
    format!("{} {}", entries.len(), noun).cyan().to_string()
}
