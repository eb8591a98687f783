//! CLI command implementations
//!
//! Each subcommand has its own module. The helpers here open the pieces a
//! command needs from the resolved [`Config`].

pub mod config;
pub mod identity;
pub mod ledger;
pub mod shell;
pub mod tree;

use crate::catalog::{CatalogVariant, ComplianceTree};
use crate::config::Config;
use crate::download::DirectorySink;
use crate::error::Result;
use crate::notify::ConsoleNotifier;
use crate::session::Session;
use crate::storage::SqliteStore;
use tracing::debug;

/// Open the database under the data directory, creating it if needed
pub fn open_store(config: &Config) -> Result<SqliteStore> {
    SqliteStore::open(config.db_path())
}

/// Pick the catalog: an explicit variant wins, then a configured file, then the default
pub fn load_catalog(config: &Config, variant: Option<CatalogVariant>) -> Result<ComplianceTree> {
    match (variant, config.catalog_path()) {
        (Some(variant), _) => Ok(variant.builtin()),
        (None, Some(path)) => {
            debug!(path = %path.display(), "Loading catalog file");
            ComplianceTree::load(path)
        },
        (None, None) => Ok(CatalogVariant::default().builtin()),
    }
}

/// Open a terminal session
pub fn open_session(
    config: &Config,
    variant: Option<CatalogVariant>,
    assume_yes: bool,
) -> Result<Session<SqliteStore, ConsoleNotifier>> {
    let tree = load_catalog(config, variant)?;
    let store = open_store(config)?;
    let notifier = ConsoleNotifier::new().assume_yes(assume_yes);
    let sink = DirectorySink::new(config.download_dir());

    Ok(Session::open(store, notifier, tree, Box::new(sink)))
}
