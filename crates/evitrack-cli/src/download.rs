//! Local "downloads": saving evidence bytes to a directory
//!
//! Nothing leaves the machine. An uploaded payload is exposed through a
//! short-lived [`TransientRef`] while it is written out, and the ledger's
//! placeholder files are generated on the spot.

use crate::error::{Result, TrackerError};
use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use uuid::Uuid;

/// Highest "(n)" suffix tried before giving up
const MAX_SUFFIX: u32 = 10_000;

/// Destination for saved files
pub trait DownloadSink {
    /// Save `bytes` under a name derived from `file_name`; returns where it landed
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Saves into a directory, never overwriting an existing file
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Candidate paths for `file_name`: "a.pdf", then "a (1).pdf", "a (2).pdf", ...
    fn candidates<'a>(&'a self, file_name: &'a str) -> impl Iterator<Item = PathBuf> + 'a {
        let path = Path::new(file_name);
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| file_name.to_string());
        let ext = path.extension().map(|e| e.to_string_lossy().to_string());

        std::iter::once(self.dir.join(file_name)).chain((1..MAX_SUFFIX).map(move |n| match &ext {
            Some(ext) => self.dir.join(format!("{} ({}).{}", stem, n, ext)),
            None => self.dir.join(format!("{} ({})", stem, n)),
        }))
    }
}

impl DownloadSink for DirectorySink {
    fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let file_name = sanitize_file_name(file_name)?;
        std::fs::create_dir_all(&self.dir)?;

        for path in self.candidates(&file_name) {
            // create_new fails on an existing file, so a concurrent save moves on
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    trace!(path = %path.display(), "Download name taken");
                    continue;
                },
                Err(e) => return Err(e.into()),
            };
            file.write_all(bytes)?;
            debug!(path = %path.display(), size = bytes.len(), "Saved download");
            return Ok(path);
        }

        Err(TrackerError::validation(format!(
            "no free file name for '{}' in {}",
            file_name,
            self.dir.display()
        )))
    }
}

/// Strip directory components so a display name cannot escape the sink
fn sanitize_file_name(name: &str) -> Result<String> {
    let cleaned: String = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_control())
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return Err(TrackerError::validation(format!(
            "'{}' is not a usable file name",
            name
        )));
    }
    Ok(cleaned.to_string())
}

/// Short-lived handle to in-memory bytes, released on drop
pub struct TransientRef<'a> {
    id: Uuid,
    bytes: &'a [u8],
}

impl<'a> TransientRef<'a> {
    pub fn materialize(bytes: &'a [u8]) -> Self {
        let id = Uuid::new_v4();
        trace!(reference = %id, size = bytes.len(), "Materialized transient reference");
        Self { id, bytes }
    }

    pub fn uri(&self) -> String {
        format!("blob:evitrack/{}", self.id)
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl Drop for TransientRef<'_> {
    fn drop(&mut self) {
        trace!(reference = %self.id, "Released transient reference");
    }
}

/// Text written in place of a real file for ledger downloads
pub fn placeholder_content(name: &str, at: DateTime<Utc>) -> String {
    format!(
        "Evidence placeholder\n\
         ====================\n\
         Name:      {}\n\
         Generated: {}\n\
         \n\
         This file stands in for the evidence document. The ledger records\n\
         metadata only; the original file is held by its owner.\n",
        name,
        at.to_rfc3339()
    )
}
