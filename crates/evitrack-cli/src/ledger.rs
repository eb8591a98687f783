//! Flat evidence ledger shown on the overview page
//!
//! The ledger is rewritten to the store after every add and every confirmed
//! removal. Ids come from a persisted high-water mark so an id freed by a
//! removal is never handed out again.

use crate::attachments::types::display_date;
use crate::download::{placeholder_content, DownloadSink};
use crate::error::{Result, TrackerError};
use crate::notify::NotificationChannel;
use crate::storage::{load_json, save_json, PersistenceAdapter, LEDGER_KEY, LEDGER_SEQ_KEY};
use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// One ledger row, stored as `{id, name, date, sharedBy}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceEntry {
    pub id: u64,
    pub name: String,
    pub date: String,
    pub shared_by: String,
}

/// A removal waiting on confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRemoval {
    pub id: u64,
    pub name: String,
}

impl PendingRemoval {
    pub fn prompt(&self) -> String {
        format!("Remove '{}' (#{}) from the ledger?", self.name, self.id)
    }
}

/// An applied ledger change and whether it reached the store
///
/// The in-memory ledger keeps the change either way; one-shot front ends use
/// [`into_saved`](Self::into_saved) to fail when it was not written.
#[derive(Debug)]
pub struct LedgerChange {
    pub entry: EvidenceEntry,
    save_error: Option<TrackerError>,
}

impl LedgerChange {
    pub fn is_saved(&self) -> bool {
        self.save_error.is_none()
    }

    /// The changed entry, or the store error if the write failed
    pub fn into_saved(self) -> Result<EvidenceEntry> {
        match self.save_error {
            None => Ok(self.entry),
            Some(err) => Err(err),
        }
    }
}

/// Result of [`EvidenceLedger::remove`]
#[derive(Debug)]
pub enum RemovalOutcome {
    Removed(LedgerChange),
    Cancelled,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct EvidenceLedger {
    entries: Vec<EvidenceEntry>,
    pending: Option<PendingRemoval>,
    high_water: u64,
}

impl EvidenceLedger {
    /// Read the ledger from `store`, falling back to the default entries
    pub fn load(store: &dyn PersistenceAdapter) -> Self {
        let entries = load_json::<Vec<EvidenceEntry>>(store, LEDGER_KEY).unwrap_or_else(|| {
            debug!("No stored ledger, using defaults");
            default_entries()
        });
        let stored_seq = load_json::<u64>(store, LEDGER_SEQ_KEY).unwrap_or(0);

        Self::from_entries(entries).with_high_water(stored_seq)
    }

    pub fn from_entries(entries: Vec<EvidenceEntry>) -> Self {
        let high_water = entries.iter().map(|e| e.id).max().unwrap_or(0);
        Self {
            entries,
            pending: None,
            high_water,
        }
    }

    fn with_high_water(mut self, seq: u64) -> Self {
        self.high_water = self.high_water.max(seq);
        self
    }

    /// Entries, newest first
    pub fn list(&self) -> &[EvidenceEntry] {
        &self.entries
    }

    pub fn get(&self, id: u64) -> Option<&EvidenceEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Id the next [`add`](Self::add) will use
    pub fn next_id(&self) -> u64 {
        self.high_water + 1
    }

    pub fn pending(&self) -> Option<&PendingRemoval> {
        self.pending.as_ref()
    }

    /// Record a new piece of evidence at the top of the ledger
    pub fn add(
        &mut self,
        name: &str,
        shared_by: &str,
        store: &mut dyn PersistenceAdapter,
        notifier: &mut dyn NotificationChannel,
    ) -> Result<LedgerChange> {
        let name = name.trim();
        if name.is_empty() {
            let err = TrackerError::validation("evidence name cannot be empty");
            notifier.error(err.to_string());
            return Err(err);
        }

        let entry = EvidenceEntry {
            id: self.next_id(),
            name: name.to_string(),
            date: display_date(Local::now()),
            shared_by: shared_by.to_string(),
        };
        self.entries.insert(0, entry.clone());
        self.high_water = entry.id;
        info!(entry_id = entry.id, name = %entry.name, "Added ledger entry");

        let save_error = self.persist(store, notifier).err();
        if save_error.is_none() {
            notifier.success(format!("Added '{}' to the ledger", entry.name));
        }
        Ok(LedgerChange { entry, save_error })
    }

    /// Capture `id` as the pending removal; false if no such entry
    pub fn request_removal(&mut self, id: u64, name: &str) -> bool {
        if self.get(id).is_none() {
            debug!(entry_id = id, "Removal requested for missing entry");
            return false;
        }
        self.pending = Some(PendingRemoval {
            id,
            name: name.to_string(),
        });
        true
    }

    /// Remove the pending entry and persist
    pub fn confirm_removal(
        &mut self,
        store: &mut dyn PersistenceAdapter,
        notifier: &mut dyn NotificationChannel,
    ) -> Option<LedgerChange> {
        let pending = self.pending.take()?;
        let position = self.entries.iter().position(|e| e.id == pending.id)?;
        let removed = self.entries.remove(position);
        info!(entry_id = removed.id, name = %removed.name, "Removed ledger entry");

        let save_error = self.persist(store, notifier).err();
        if save_error.is_none() {
            notifier.success(format!("Removed '{}' from the ledger", removed.name));
        }
        Some(LedgerChange {
            entry: removed,
            save_error,
        })
    }

    pub fn cancel_removal(&mut self) -> Option<PendingRemoval> {
        self.pending.take()
    }

    /// Request, prompt, then confirm or cancel in one call
    pub fn remove(
        &mut self,
        id: u64,
        store: &mut dyn PersistenceAdapter,
        notifier: &mut dyn NotificationChannel,
    ) -> RemovalOutcome {
        let Some(name) = self.get(id).map(|e| e.name.clone()) else {
            return RemovalOutcome::NotFound;
        };
        self.request_removal(id, &name);

        let prompt = self.pending.as_ref().map(PendingRemoval::prompt).unwrap_or_default();
        if !notifier.confirm(&prompt) {
            self.cancel_removal();
            return RemovalOutcome::Cancelled;
        }

        match self.confirm_removal(store, notifier) {
            Some(change) => RemovalOutcome::Removed(change),
            None => RemovalOutcome::NotFound,
        }
    }

    /// Save a placeholder document for `name`
    pub fn download(
        &self,
        name: &str,
        sink: &dyn DownloadSink,
        notifier: &mut dyn NotificationChannel,
    ) -> Result<PathBuf> {
        let content = placeholder_content(name, Utc::now());
        match sink.save(name, content.as_bytes()) {
            Ok(path) => {
                notifier.success(format!("Downloaded '{}' to {}", name, path.display()));
                Ok(path)
            },
            Err(e) => {
                notifier.error(format!("Could not download '{}': {}", name, e));
                Err(e)
            },
        }
    }

    /// Write entries and the id high-water mark; the in-memory state stands either way
    fn persist(
        &self,
        store: &mut dyn PersistenceAdapter,
        notifier: &mut dyn NotificationChannel,
    ) -> Result<()> {
        let result = save_json(store, LEDGER_KEY, &self.entries)
            .and_then(|()| save_json(store, LEDGER_SEQ_KEY, &self.high_water));

        if let Err(e) = &result {
            warn!(error = %e, "Failed to persist ledger");
            notifier.error(format!("Ledger change was not saved: {}", e));
        }
        result
    }
}

/// Entries shown before anything has been stored
pub fn default_entries() -> Vec<EvidenceEntry> {
    let entry = |id: u64, name: &str, date: &str| EvidenceEntry {
        id,
        name: name.to_string(),
        date: date.to_string(),
        shared_by: "Compliance Office".to_string(),
    };

    vec![
        entry(3, "Evidence-5.pdf", "Sep 22, 2026"),
        entry(2, "Evidence-4.docx", "Sep 15, 2026"),
        entry(1, "Evidence-3.xlsx", "Sep 3, 2026"),
    ]
}
