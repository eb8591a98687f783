//! Session context: everything one run of the tracker works on
//!
//! A [`Session`] is built once at startup and passed by reference to whatever
//! front end drives it. It owns the store and notifier so every operation
//! reports through the same channel and writes through the same adapter.

use crate::attachments::{
    AttachmentLifecycle, DeleteOutcome, DeleteRequest, DownloadOutcome, IncomingFile, PendingDeletion,
};
use crate::catalog::ComplianceTree;
use crate::download::DownloadSink;
use crate::error::{Result, TrackerError};
use crate::expansion::ExpansionState;
use crate::ledger::{EvidenceLedger, LedgerChange, RemovalOutcome};
use crate::notify::NotificationChannel;
use crate::storage::{PersistenceAdapter, IDENTITY_KEY};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Name used when no identity has been stored
pub const DEFAULT_IDENTITY: &str = "Compliance Officer";

/// Who is sharing evidence in this session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity(String);

impl SessionIdentity {
    /// Read the stored identity, or the default when absent or unreadable
    pub fn load(store: &dyn PersistenceAdapter) -> Self {
        match store.get(IDENTITY_KEY) {
            Ok(Some(name)) if !name.trim().is_empty() => Self(name.trim().to_string()),
            Ok(_) => Self(DEFAULT_IDENTITY.to_string()),
            Err(e) => {
                warn!(error = %e, "Failed to read identity, using default");
                Self(DEFAULT_IDENTITY.to_string())
            },
        }
    }

    /// Store a new identity; it takes effect for sessions opened afterwards
    pub fn save(store: &mut dyn PersistenceAdapter, name: &str) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TrackerError::validation("identity cannot be empty"));
        }
        store.set(IDENTITY_KEY, name)?;
        info!(identity = name, "Saved identity");
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_IDENTITY
    }
}

impl std::fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

pub struct Session<S, N> {
    store: S,
    notifier: N,
    identity: SessionIdentity,
    tree: ComplianceTree,
    expansion: ExpansionState,
    attachments: AttachmentLifecycle,
    ledger: EvidenceLedger,
    sink: Box<dyn DownloadSink>,
}

impl<S: PersistenceAdapter, N: NotificationChannel> Session<S, N> {
    /// Read identity and ledger from `store` and start with everything collapsed
    pub fn open(store: S, notifier: N, tree: ComplianceTree, sink: Box<dyn DownloadSink>) -> Self {
        let identity = SessionIdentity::load(&store);
        let ledger = EvidenceLedger::load(&store);
        let attachments = AttachmentLifecycle::new(tree.variant().policy());

        debug!(
            identity = %identity,
            variant = %tree.variant(),
            nodes = tree.len(),
            ledger_entries = ledger.list().len(),
            "Opened session"
        );

        Self {
            store,
            notifier,
            identity,
            tree,
            expansion: ExpansionState::new(),
            attachments,
            ledger,
            sink,
        }
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn tree(&self) -> &ComplianceTree {
        &self.tree
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    pub fn attachments(&self) -> &AttachmentLifecycle {
        &self.attachments
    }

    pub fn ledger(&self) -> &EvidenceLedger {
        &self.ledger
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn toggle(&mut self, node_id: &str) -> bool {
        self.expansion.toggle(node_id)
    }

    pub fn expand_all(&mut self) {
        self.expansion.expand_all(&self.tree);
    }

    pub fn collapse_all(&mut self) {
        self.expansion.collapse_all();
    }

    pub fn add_attachments(&mut self, node_id: &str, files: Vec<IncomingFile>) -> Result<usize> {
        self.attachments.add_attachments(
            &self.tree,
            &mut self.expansion,
            node_id,
            files,
            self.identity.as_str(),
            &mut self.notifier,
        )
    }

    pub fn request_delete(&mut self, node_id: &str, merged_index: usize) -> DeleteRequest {
        self.attachments
            .request_delete(&self.tree, node_id, merged_index, &mut self.notifier)
    }

    pub fn confirm_delete(&mut self) -> DeleteOutcome {
        self.attachments.confirm_delete(&self.tree, &mut self.notifier)
    }

    pub fn cancel_delete(&mut self) -> Option<PendingDeletion> {
        self.attachments.cancel_delete()
    }

    pub fn delete_attachment(&mut self, node_id: &str, merged_index: usize) -> DeleteOutcome {
        self.attachments
            .delete_attachment(&self.tree, node_id, merged_index, &mut self.notifier)
    }

    /// Download the row at `merged_index`; `None` when there is no such row
    pub fn download_attachment(
        &mut self,
        node_id: &str,
        merged_index: usize,
    ) -> Result<Option<DownloadOutcome>> {
        let Some(record) = self.attachments.record_at(&self.tree, node_id, merged_index) else {
            return Ok(None);
        };
        self.attachments
            .download_attachment(record, self.sink.as_ref(), &mut self.notifier)
            .map(Some)
    }

    pub fn ledger_add(&mut self, name: &str) -> Result<LedgerChange> {
        self.ledger
            .add(name, self.identity.as_str(), &mut self.store, &mut self.notifier)
    }

    /// First phase of a ledger removal; false if there is no entry `id`
    pub fn ledger_request_removal(&mut self, id: u64, name: &str) -> bool {
        self.ledger.request_removal(id, name)
    }

    pub fn ledger_confirm_removal(&mut self) -> Option<LedgerChange> {
        self.ledger.confirm_removal(&mut self.store, &mut self.notifier)
    }

    pub fn ledger_cancel_removal(&mut self) {
        self.ledger.cancel_removal();
    }

    pub fn ledger_remove(&mut self, id: u64) -> RemovalOutcome {
        self.ledger.remove(id, &mut self.store, &mut self.notifier)
    }

    pub fn ledger_download(&mut self, name: &str) -> Result<PathBuf> {
        self.ledger.download(name, self.sink.as_ref(), &mut self.notifier)
    }

    /// End the session and hand the store back
    pub fn close(self) -> S {
        debug!(
            uploaded = self.attachments.store().total_uploaded(),
            "Closed session, discarding uploads"
        );
        self.store
    }
}
