//! Build automation tasks for Evitrack
//!
//! Currently generates the CLI reference from the clap definitions.

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for Evitrack", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<evitrack_cli::Cli>();

    let content = format!(
        r#"# Evitrack CLI Reference

This documentation is generated from the CLI source code. Last updated: {}.

## Overview

Evitrack tracks compliance evidence: attachments on the nodes of a clause or
control catalog, and a flat evidence ledger kept in a local database.

## Quick Start

```bash
# Who evidence is shared as
evitrack identity set "Dana Reyes"

# Browse the control catalog with its preloaded evidence
evitrack tree --variant controls --expand-all

# Record and list ledger entries
evitrack ledger add Access-Review-Q3.xlsx
evitrack ledger list

# Attach files in an interactive session
evitrack shell --variant controls
```

## Commands

{}

## Environment Variables

- `EVITRACK_DATA_DIR` - Data directory holding `evitrack.db`
- `EVITRACK_DOWNLOAD_DIR` - Where downloads are saved (default: `<data dir>/downloads`)
- `EVITRACK_CATALOG` - YAML catalog used instead of the built-in ones
- `EVITRACK_LOG_LEVEL` - Logging level (`trace`, `debug`, `info`, `warn`, `error`)
- `EVITRACK_LOG_OUTPUT` - `console`, `file` or `both`
- `EVITRACK_LOG_FORMAT` - `text` or `json`
- `EVITRACK_LOG_DIR` - Directory for log files

## Catalog Files

```yaml
variant: controls
nodes:
  - id: "5"
    title: Organizational controls
    children:
      - id: "5.1"
        title: Policies for information security
        has_info: true
        evidence:
          - name: Information-Security-Policy-v3.pdf
            date: Mar 4, 2026
            shared_by: CISO Office
```

Node ids must be unique. `variant` selects the deletion policy: `clauses`
allows deleting any row after confirmation, `controls` protects preloaded
evidence.

---

*To update, run `cargo xtask generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    let file_path = output_path.join("cli-reference.md");
    fs::write(&file_path, content)?;

    println!("✅ Generated CLI documentation at: {}", file_path.display());

    Ok(())
}
