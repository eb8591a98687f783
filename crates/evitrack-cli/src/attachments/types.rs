//! Attachment record types

use crate::error::{Result, TrackerError};
use chrono::{DateTime, Local};
use evitrack_common::checksum::PayloadDigest;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Display format for "date shared" columns, e.g. "Oct 19, 2026"
pub const DISPLAY_DATE_FORMAT: &str = "%b %-d, %Y";

/// Format a timestamp the way attachment and ledger dates are shown
pub fn display_date(at: DateTime<Local>) -> String {
    at.format(DISPLAY_DATE_FORMAT).to_string()
}

/// Where an attachment came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Preloaded with the catalog
    Seed,
    /// Added during the current session
    Uploaded,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Seed => write!(f, "preloaded"),
            Origin::Uploaded => write!(f, "uploaded"),
        }
    }
}

/// Bytes of an uploaded file plus their digest
///
/// Cloning shares the underlying buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    bytes: Arc<[u8]>,
    digest: PayloadDigest,
}

impl Payload {
    pub fn new(bytes: Vec<u8>) -> Self {
        let digest = PayloadDigest::of(&bytes);
        Self {
            bytes: bytes.into(),
            digest,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn digest(&self) -> &PayloadDigest {
        &self.digest
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Re-check the bytes against the digest taken at upload
    pub fn verify(&self) -> Result<()> {
        self.digest.verify(&self.bytes).map_err(TrackerError::from)
    }
}

/// One row in a node's evidence list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRecord {
    /// Display filename; not required to be unique
    pub name: String,
    pub date_shared: String,
    pub shared_by: String,
    pub origin: Origin,
    /// Present only for uploaded records
    pub payload: Option<Payload>,
}

impl AttachmentRecord {
    /// Preloaded evidence from the catalog
    pub fn seed(
        name: impl Into<String>,
        date_shared: impl Into<String>,
        shared_by: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            date_shared: date_shared.into(),
            shared_by: shared_by.into(),
            origin: Origin::Seed,
            payload: None,
        }
    }

    /// Evidence uploaded during the session
    pub fn uploaded(file: IncomingFile, shared_by: impl Into<String>, at: DateTime<Local>) -> Self {
        Self {
            name: file.name,
            date_shared: display_date(at),
            shared_by: shared_by.into(),
            origin: Origin::Uploaded,
            payload: Some(Payload::new(file.bytes)),
        }
    }

    pub fn is_seed(&self) -> bool {
        self.origin == Origin::Seed
    }
}

/// A user-selected file on its way into the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl IncomingFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk; the display name is the path's file name
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| TrackerError::validation(format!("'{}' is not a file", path.display())))?;
        let bytes = std::fs::read(path)?;
        Ok(Self { name, bytes })
    }

    /// Read several files, failing the whole batch if any one cannot be read
    pub fn read_batch<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Self>> {
        paths.iter().map(Self::from_path).collect()
    }
}
