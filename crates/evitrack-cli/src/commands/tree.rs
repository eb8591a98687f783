//! `evitrack tree` command implementation

use crate::attachments::AttachmentLifecycle;
use crate::catalog::CatalogVariant;
use crate::commands::load_catalog;
use crate::config::Config;
use crate::error::Result;
use crate::expansion::ExpansionState;
use crate::render::render_tree;
use colored::Colorize;

/// Print the catalog with its preloaded evidence
pub async fn run(config: &Config, variant: Option<CatalogVariant>, expand_all: bool) -> Result<()> {
    let tree = load_catalog(config, variant)?;
    let attachments = AttachmentLifecycle::new(tree.variant().policy());
    let mut expansion = ExpansionState::new();
    if expand_all {
        expansion.expand_all(&tree);
    }

    println!(
        "{} {}",
        "Catalog:".cyan().bold(),
        format!("{} ({} nodes)", tree.variant(), tree.len())
    );
    println!();
    print!("{}", render_tree(&tree, &expansion, &attachments));

    if !expand_all {
        println!();
        println!("Run with --expand-all to show every node and its evidence.");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_tree_runs_for_both_variants() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            download_dir: None,
            catalog_path: None,
        };

        run(&config, Some(CatalogVariant::Clauses), false).await.unwrap();
        run(&config, Some(CatalogVariant::Controls), true).await.unwrap();
    }
}
