//! `evitrack shell` command implementation
//!
//! Uploaded evidence lives only as long as the session, so attaching and
//! deleting happen inside this line-oriented shell. Commands are read from
//! stdin one per line until `quit` or end of input. Words follow POSIX shell
//! quoting, so `attach 5.1 "Risk Register.xlsx"` names one file.

use crate::attachments::{DeleteOutcome, DownloadOutcome, IncomingFile};
use crate::catalog::CatalogVariant;
use crate::commands::ledger::{format_as_table, format_summary};
use crate::commands::open_session;
use crate::config::Config;
use crate::error::{Result, TrackerError};
use crate::ledger::RemovalOutcome;
use crate::notify::NotificationChannel;
use crate::render::render_tree;
use crate::session::Session;
use crate::storage::PersistenceAdapter;
use colored::Colorize;
use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use tracing::{debug, info};

const HELP: &str = "\
Commands:
  tree                       Show the catalog
  toggle <id>                Expand or collapse a node
  expand-all | collapse-all  Expand or collapse every node
  attach <id> <file>...      Attach local files to a node (quote paths with spaces)
  delete <id> <index>        Delete the evidence row at <index>
  download <id> <index>      Save the evidence row at <index>
  ledger [list]              Show the evidence ledger
  ledger add <name>          Add an entry to the ledger
  ledger remove <id>         Remove a ledger entry
  ledger download <name>     Save a placeholder for a ledger entry
  identity                   Show who evidence is shared as
  help                       Show this help
  quit                       Leave the shell (uploads are discarded)
";

/// One parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Empty,
    Tree,
    Toggle(String),
    ExpandAll,
    CollapseAll,
    Attach { node_id: String, paths: Vec<PathBuf> },
    Delete { node_id: String, index: usize },
    Download { node_id: String, index: usize },
    LedgerList,
    LedgerAdd(String),
    LedgerRemove(u64),
    LedgerDownload(String),
    Identity,
    Help,
    Quit,
}

/// Whether the shell keeps reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

impl ShellCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();

        // Ledger names run to the end of the line, spacing included
        if let Some(rest) = strip_words(line, &["ledger", "add"]).filter(|r| !r.is_empty()) {
            return Ok(Self::LedgerAdd(name_argument(rest)?));
        }
        if let Some(rest) = strip_words(line, &["ledger", "download"]).filter(|r| !r.is_empty()) {
            return Ok(Self::LedgerDownload(name_argument(rest)?));
        }

        let owned = shell_words::split(line)
            .map_err(|e| TrackerError::validation(format!("could not read '{}': {}", line, e)))?;
        let words: Vec<&str> = owned.iter().map(String::as_str).collect();
        let Some((&head, rest)) = words.split_first() else {
            return Ok(Self::Empty);
        };

        let command = match (head, rest) {
            ("tree" | "t", []) => Self::Tree,
            ("toggle", [id]) => Self::Toggle(id.to_string()),
            ("expand-all", []) => Self::ExpandAll,
            ("collapse-all", []) => Self::CollapseAll,
            ("attach", [id, paths @ ..]) if !paths.is_empty() => Self::Attach {
                node_id: id.to_string(),
                paths: paths.iter().map(|p| PathBuf::from(*p)).collect(),
            },
            ("delete", [id, index]) => Self::Delete {
                node_id: id.to_string(),
                index: parse_index(index)?,
            },
            ("download", [id, index]) => Self::Download {
                node_id: id.to_string(),
                index: parse_index(index)?,
            },
            ("ledger", [] | ["list"]) => Self::LedgerList,
            ("ledger", ["remove", id]) => Self::LedgerRemove(
                id.trim_start_matches('#')
                    .parse()
                    .map_err(|_| TrackerError::validation(format!("'{}' is not a ledger id", id)))?,
            ),
            ("identity", []) => Self::Identity,
            ("help" | "?", _) => Self::Help,
            ("quit" | "exit" | "q", []) => Self::Quit,
            _ => {
                return Err(TrackerError::validation(format!(
                    "could not understand '{}'; type 'help' for commands",
                    line
                )))
            },
        };
        Ok(command)
    }
}

/// Text following the leading `words` of `line`, or `None` if it starts otherwise
fn strip_words<'a>(line: &'a str, words: &[&str]) -> Option<&'a str> {
    let mut rest = line;
    for word in words {
        rest = rest.strip_prefix(*word)?;
        if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
            return None;
        }
        rest = rest.trim_start();
    }
    Some(rest)
}

/// A name argument: one quoted word, or the raw text as typed
fn name_argument(raw: &str) -> Result<String> {
    if !raw.starts_with(['"', '\'']) {
        return Ok(raw.to_string());
    }

    match shell_words::split(raw) {
        Ok(words) if words.len() == 1 => Ok(words.into_iter().collect()),
        Ok(_) => Err(TrackerError::validation(format!(
            "expected one quoted name, got '{}'",
            raw
        ))),
        Err(e) => Err(TrackerError::validation(format!("could not read '{}': {}", raw, e))),
    }
}

fn parse_index(raw: &str) -> Result<usize> {
    raw.trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .map_err(|_| TrackerError::validation(format!("'{}' is not a row index", raw)))
}

/// Run one command against the session, writing any output to `out`
pub fn dispatch<S: PersistenceAdapter, N: NotificationChannel>(
    session: &mut Session<S, N>,
    command: ShellCommand,
    out: &mut dyn Write,
) -> Result<Flow> {
    match command {
        ShellCommand::Empty => {},
        ShellCommand::Tree => {
            write!(out, "{}", render_tree(session.tree(), session.expansion(), session.attachments()))?;
        },
        ShellCommand::Toggle(id) => {
            if !session.tree().contains(&id) {
                debug!(node_id = %id, "Toggling unknown node");
            }
            let state = if session.toggle(&id) { "Expanded" } else { "Collapsed" };
            writeln!(out, "{} {}", state, id)?;
        },
        ShellCommand::ExpandAll => session.expand_all(),
        ShellCommand::CollapseAll => session.collapse_all(),
        ShellCommand::Attach { node_id, paths } => {
            let files = IncomingFile::read_batch(&paths)?;
            session
                .add_attachments(&node_id, files)
                .map_err(TrackerError::reported)?;
        },
        ShellCommand::Delete { node_id, index } => match session.delete_attachment(&node_id, index) {
            DeleteOutcome::Cancelled => writeln!(out, "Deletion cancelled.")?,
            DeleteOutcome::Deleted(_) | DeleteOutcome::Rejected | DeleteOutcome::NotFound => {},
        },
        ShellCommand::Download { node_id, index } => {
            let outcome = session
                .download_attachment(&node_id, index)
                .map_err(TrackerError::reported)?;
            if let Some(DownloadOutcome::Saved(path)) = outcome {
                debug!(path = %path.display(), "Attachment saved");
            }
        },
        ShellCommand::LedgerList => {
            let entries = session.ledger().list();
            writeln!(out, "{}", format_summary(entries))?;
            if !entries.is_empty() {
                write!(out, "{}", format_as_table(entries))?;
            }
        },
        ShellCommand::LedgerAdd(name) => {
            // A failed write is already on screen; the entry stays for this session
            session.ledger_add(&name).map_err(TrackerError::reported)?;
        },
        ShellCommand::LedgerRemove(id) => match session.ledger_remove(id) {
            RemovalOutcome::Removed(_) => {},
            RemovalOutcome::Cancelled => writeln!(out, "Removal cancelled.")?,
            RemovalOutcome::NotFound => writeln!(out, "No ledger entry #{}", id)?,
        },
        ShellCommand::LedgerDownload(name) => {
            session.ledger_download(&name).map_err(TrackerError::reported)?;
        },
        ShellCommand::Identity => writeln!(out, "{}", session.identity())?,
        ShellCommand::Help => write!(out, "{}", HELP)?,
        ShellCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Read commands from stdin until `quit` or end of input
pub async fn run(config: &Config, variant: Option<CatalogVariant>, yes: bool) -> Result<()> {
    let mut session = open_session(config, variant, yes)?;
    let interactive = std::io::stdin().is_terminal();
    let mut stdout = std::io::stdout();

    info!(variant = %session.tree().variant(), identity = %session.identity(), "Shell started");
    if interactive {
        println!(
            "{} {} catalog, sharing as {}. Type 'help' for commands.",
            "Evitrack shell:".cyan().bold(),
            session.tree().variant(),
            session.identity()
        );
    }

    loop {
        if interactive {
            print!("{} ", "evitrack>".cyan());
            stdout.flush()?;
        }

        let mut line = String::new();
        if std::io::stdin().lock().read_line(&mut line)? == 0 {
            break;
        }

        let flow = ShellCommand::parse(&line).and_then(|command| dispatch(&mut session, command, &mut stdout));
        match flow {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {},
            Err(e) if e.is_reported() => debug!(error = %e, "Shell command failed"),
            Err(e) => eprintln!("{} {}", "Error:".red(), e),
        }
    }

    session.close();
    Ok(())
}
