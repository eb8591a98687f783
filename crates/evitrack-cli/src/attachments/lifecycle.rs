//! Add, delete, and download rules for node attachments
//!
//! Deletion is two-phase. [`AttachmentLifecycle::request_delete`] checks the
//! policy and captures a [`PendingDeletion`]; nothing changes until
//! [`AttachmentLifecycle::confirm_delete`]. Only one deletion can be pending at
//! a time, so confirm/mutate pairs never interleave.

use crate::attachments::store::{AttachmentStore, MergedView};
use crate::attachments::types::{AttachmentRecord, IncomingFile, Origin};
use crate::catalog::{ComplianceNode, ComplianceTree};
use crate::download::{DownloadSink, TransientRef};
use crate::error::{Result, TrackerError};
use crate::expansion::ExpansionState;
use crate::notify::NotificationChannel;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Which rows may be deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Any row, seed or uploaded, once confirmed
    Clauses,
    /// Uploaded rows only; seed rows are rejected outright
    Controls,
}

impl DeletePolicy {
    pub fn permits(self, origin: Origin) -> bool {
        match self {
            DeletePolicy::Clauses => true,
            DeletePolicy::Controls => origin == Origin::Uploaded,
        }
    }
}

/// A deletion waiting on confirmation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDeletion {
    pub node_id: String,
    pub merged_index: usize,
    pub name: String,
    pub origin: Origin,
}

impl PendingDeletion {
    pub fn prompt(&self) -> String {
        format!("Delete '{}' from {}?", self.name, self.node_id)
    }
}

/// Result of asking to delete a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteRequest {
    AwaitingConfirmation(PendingDeletion),
    /// Blocked by policy; a rejection notice was raised
    Rejected,
    /// Node or index does not exist; nothing happened
    NotFound,
}

/// Final result of a deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(AttachmentRecord),
    Rejected,
    Cancelled,
    NotFound,
}

/// Result of a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Real bytes were written here
    Saved(PathBuf),
    /// No bytes to hand out; the user was told a download started
    Simulated,
}

/// Attachment operations under one deletion policy
#[derive(Debug, Clone)]
pub struct AttachmentLifecycle {
    policy: DeletePolicy,
    store: AttachmentStore,
    pending: Option<PendingDeletion>,
}

impl AttachmentLifecycle {
    pub fn new(policy: DeletePolicy) -> Self {
        Self {
            policy,
            store: AttachmentStore::new(),
            pending: None,
        }
    }

    pub fn policy(&self) -> DeletePolicy {
        self.policy
    }

    pub fn store(&self) -> &AttachmentStore {
        &self.store
    }

    pub fn merged<'a>(&'a self, node: &'a ComplianceNode) -> MergedView<'a> {
        self.store.merged(node)
    }

    pub fn pending(&self) -> Option<&PendingDeletion> {
        self.pending.as_ref()
    }

    /// Row at `merged_index` of `node_id`, if both exist
    pub fn record_at<'a>(
        &'a self,
        tree: &'a ComplianceTree,
        node_id: &str,
        merged_index: usize,
    ) -> Option<&'a AttachmentRecord> {
        let node = tree.find(node_id)?;
        self.store.merged(node).get(merged_index)
    }

    /// Attach a batch of files to `node_id`
    ///
    /// Records are appended in the order given and the node is expanded so
    /// the new rows are visible. An empty batch does nothing.
    pub fn add_attachments(
        &mut self,
        tree: &ComplianceTree,
        expansion: &mut ExpansionState,
        node_id: &str,
        files: Vec<IncomingFile>,
        shared_by: &str,
        notifier: &mut dyn NotificationChannel,
    ) -> Result<usize> {
        if files.is_empty() {
            return Ok(0);
        }

        let Some(node) = tree.find(node_id) else {
            notifier.error(format!("No requirement with id {} in this catalog", node_id));
            return Err(TrackerError::not_found(format!("node {}", node_id)));
        };

        let now = Local::now();
        let count = files.len();
        let records: Vec<AttachmentRecord> = files
            .into_iter()
            .map(|file| AttachmentRecord::uploaded(file, shared_by, now))
            .collect();

        self.store.append(&node.id, records);
        expansion.expand(&node.id);

        info!(node_id = %node.id, count, shared_by, "Attached evidence");
        let noun = if count == 1 { "file" } else { "files" };
        notifier.success(format!("{} {} attached to {}", count, noun, node.id));

        Ok(count)
    }

    /// Check policy and capture a pending deletion
    ///
    /// A new request replaces any earlier one that was never confirmed.
    pub fn request_delete(
        &mut self,
        tree: &ComplianceTree,
        node_id: &str,
        merged_index: usize,
        notifier: &mut dyn NotificationChannel,
    ) -> DeleteRequest {
        let Some(record) = self.record_at(tree, node_id, merged_index) else {
            debug!(node_id, merged_index, "Delete request for missing row ignored");
            return DeleteRequest::NotFound;
        };

        if !self.policy.permits(record.origin) {
            let err = TrackerError::policy_violation(node_id, &record.name);
            warn!(node_id, merged_index, "Rejected deletion of preloaded evidence");
            notifier.error(err.to_string());
            return DeleteRequest::Rejected;
        }

        let pending = PendingDeletion {
            node_id: node_id.to_string(),
            merged_index,
            name: record.name.clone(),
            origin: record.origin,
        };
        if let Some(previous) = self.pending.replace(pending.clone()) {
            debug!(node_id = %previous.node_id, name = %previous.name, "Superseded pending deletion");
        }

        DeleteRequest::AwaitingConfirmation(pending)
    }

    /// Carry out the pending deletion
    ///
    /// If the row at the captured position is no longer the one that was
    /// requested, nothing is removed.
    pub fn confirm_delete(
        &mut self,
        tree: &ComplianceTree,
        notifier: &mut dyn NotificationChannel,
    ) -> DeleteOutcome {
        let Some(pending) = self.pending.take() else {
            return DeleteOutcome::NotFound;
        };
        let Some(node) = tree.find(&pending.node_id) else {
            return DeleteOutcome::NotFound;
        };

        let (still_there, slot) = {
            let view = self.store.merged(node);
            let still_there = view
                .get(pending.merged_index)
                .is_some_and(|r| r.name == pending.name && r.origin == pending.origin);
            (still_there, view.locate(pending.merged_index))
        };

        let (true, Some(slot)) = (still_there, slot) else {
            warn!(node_id = %pending.node_id, name = %pending.name, "Pending deletion target moved, skipping");
            return DeleteOutcome::NotFound;
        };

        match self.store.remove(node, slot) {
            Some(record) => {
                info!(node_id = %node.id, name = %record.name, origin = %record.origin, "Deleted evidence");
                notifier.success(format!("Deleted '{}' from {}", record.name, node.id));
                DeleteOutcome::Deleted(record)
            },
            None => DeleteOutcome::NotFound,
        }
    }

    /// Drop the pending deletion without touching anything
    pub fn cancel_delete(&mut self) -> Option<PendingDeletion> {
        self.pending.take()
    }

    /// Request, prompt, then confirm or cancel in one call
    pub fn delete_attachment(
        &mut self,
        tree: &ComplianceTree,
        node_id: &str,
        merged_index: usize,
        notifier: &mut dyn NotificationChannel,
    ) -> DeleteOutcome {
        match self.request_delete(tree, node_id, merged_index, notifier) {
            DeleteRequest::AwaitingConfirmation(pending) => {
                if notifier.confirm(&pending.prompt()) {
                    self.confirm_delete(tree, notifier)
                } else {
                    self.cancel_delete();
                    DeleteOutcome::Cancelled
                }
            },
            DeleteRequest::Rejected => DeleteOutcome::Rejected,
            DeleteRequest::NotFound => DeleteOutcome::NotFound,
        }
    }

    /// Save a record's bytes, or report a simulated download when it has none
    pub fn download_attachment(
        &self,
        record: &AttachmentRecord,
        sink: &dyn DownloadSink,
        notifier: &mut dyn NotificationChannel,
    ) -> Result<DownloadOutcome> {
        let Some(payload) = &record.payload else {
            debug!(name = %record.name, "No payload, simulating download");
            notifier.success(format!("Download initiated for '{}'", record.name));
            return Ok(DownloadOutcome::Simulated);
        };

        if let Err(e) = payload.verify() {
            notifier.error(format!("'{}' failed its integrity check and was not saved", record.name));
            return Err(e);
        }
        debug!(name = %record.name, digest = payload.digest().short(), "Payload verified");

        let handle = TransientRef::materialize(payload.bytes());
        let saved = sink.save(&record.name, handle.bytes());
        drop(handle);

        match saved {
            Ok(path) => {
                notifier.success(format!("Saved '{}' to {}", record.name, path.display()));
                Ok(DownloadOutcome::Saved(path))
            },
            Err(e) => {
                notifier.error(format!("Could not save '{}': {}", record.name, e));
                Err(e)
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::catalog::CatalogVariant;
    use crate::download::DirectorySink;
    use crate::notify::RecordingNotifier;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn file(name: &str) -> IncomingFile {
        IncomingFile::new(name, format!("bytes of {}", name).into_bytes())
    }

    fn controls() -> (ComplianceTree, ExpansionState, AttachmentLifecycle) {
        (
            CatalogVariant::Controls.builtin(),
            ExpansionState::new(),
            AttachmentLifecycle::new(DeletePolicy::Controls),
        )
    }

    fn names(life: &AttachmentLifecycle, tree: &ComplianceTree, id: &str) -> Vec<String> {
        life.merged(tree.find(id).unwrap())
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    #[test]
    fn test_add_appends_in_order_and_expands() {
        let (tree, mut expansion, mut life) = controls();
        let mut notifier = RecordingNotifier::approving();

        let added = life
            .add_attachments(&tree, &mut expansion, "5.3", vec![file("a"), file("b")], "Dana", &mut notifier)
            .unwrap();

        assert_eq!(added, 2);
        assert_eq!(names(&life, &tree, "5.3"), vec!["a", "b"]);
        assert!(expansion.is_expanded("5.3"));
        assert_eq!(notifier.notices().len(), 1);
        assert_eq!(notifier.notices()[0].message, "2 files attached to 5.3");

        let record = life.record_at(&tree, "5.3", 0).unwrap();
        assert_eq!(record.shared_by, "Dana");
        assert_eq!(record.origin, Origin::Uploaded);
    }

    #[test]
    fn test_add_empty_batch_is_noop() {
        let (tree, mut expansion, mut life) = controls();
        let mut notifier = RecordingNotifier::approving();

        let added = life
            .add_attachments(&tree, &mut expansion, "5.3", Vec::new(), "Dana", &mut notifier)
            .unwrap();

        assert_eq!(added, 0);
        assert!(expansion.is_empty());
        assert!(notifier.notices().is_empty());
    }

    #[test]
    fn test_add_to_unknown_node_is_rejected() {
        let (tree, mut expansion, mut life) = controls();
        let mut notifier = RecordingNotifier::approving();

        let result = life.add_attachments(&tree, &mut expansion, "99", vec![file("a")], "Dana", &mut notifier);

        assert!(matches!(result, Err(TrackerError::NotFound(_))));
        assert_eq!(life.store().total_uploaded(), 0);
        assert_eq!(notifier.errors().count(), 1);
    }

    #[test]
    fn test_controls_rejects_seed_then_deletes_upload() {
        let (tree, mut expansion, mut life) = controls();
        let mut notifier = RecordingNotifier::approving();
        let seeds = names(&life, &tree, "5.1");
        assert_eq!(seeds.len(), 2);

        life.add_attachments(&tree, &mut expansion, "5.1", vec![file("fileA")], "Dana", &mut notifier)
            .unwrap();
        notifier.clear();

        // Preloaded row is protected
        let outcome = life.delete_attachment(&tree, "5.1", 0, &mut notifier);
        assert_eq!(outcome, DeleteOutcome::Rejected);
        assert_eq!(names(&life, &tree, "5.1").len(), 3);
        assert_eq!(names(&life, &tree, "5.1")[2], "fileA");
        assert_eq!(notifier.notices().len(), 1);
        assert!(notifier.notices()[0].is_error());
        assert!(notifier.prompts().is_empty());

        // Uploaded row goes after confirmation
        let outcome = life.delete_attachment(&tree, "5.1", 2, &mut notifier);
        assert!(matches!(outcome, DeleteOutcome::Deleted(ref r) if r.name == "fileA"));
        assert_eq!(names(&life, &tree, "5.1"), seeds);
        assert_eq!(notifier.prompts(), &["Delete 'fileA' from 5.1?".to_string()]);
    }

    #[test]
    fn test_declined_confirmation_changes_nothing() {
        let (tree, mut expansion, mut life) = controls();
        let mut notifier = RecordingNotifier::declining();
        life.add_attachments(&tree, &mut expansion, "5.1", vec![file("fileA")], "Dana", &mut notifier)
            .unwrap();

        let outcome = life.delete_attachment(&tree, "5.1", 2, &mut notifier);

        assert_eq!(outcome, DeleteOutcome::Cancelled);
        assert_eq!(names(&life, &tree, "5.1").len(), 3);
        assert!(life.pending().is_none());
    }

    #[test]
    fn test_clauses_policy_deletes_seed_rows() {
        let tree = CatalogVariant::Clauses.builtin();
        let mut life = AttachmentLifecycle::new(DeletePolicy::Clauses);
        let mut notifier = RecordingNotifier::approving();

        let outcome = life.delete_attachment(&tree, "5.1", 0, &mut notifier);

        assert!(matches!(outcome, DeleteOutcome::Deleted(ref r) if r.origin == Origin::Seed));
        assert_eq!(names(&life, &tree, "5.1"), vec!["Management-Commitment-Letter.pdf"]);
        // Catalog keeps its seeds
        assert_eq!(tree.find("5.1").unwrap().seed_attachments.len(), 2);
    }

    #[test]
    fn test_out_of_range_delete_is_silent() {
        let (tree, _, mut life) = controls();
        let mut notifier = RecordingNotifier::approving();

        assert_eq!(life.delete_attachment(&tree, "5.1", 7, &mut notifier), DeleteOutcome::NotFound);
        assert_eq!(life.delete_attachment(&tree, "nope", 0, &mut notifier), DeleteOutcome::NotFound);
        assert!(notifier.notices().is_empty());
        assert!(notifier.prompts().is_empty());
    }

    #[test]
    fn test_two_phase_cancel_and_supersede() {
        let (tree, mut expansion, mut life) = controls();
        let mut notifier = RecordingNotifier::approving();
        life.add_attachments(&tree, &mut expansion, "5.3", vec![file("a"), file("b")], "Dana", &mut notifier)
            .unwrap();

        let first = life.request_delete(&tree, "5.3", 0, &mut notifier);
        assert!(matches!(first, DeleteRequest::AwaitingConfirmation(ref p) if p.name == "a"));
        let second = life.request_delete(&tree, "5.3", 1, &mut notifier);
        assert!(matches!(second, DeleteRequest::AwaitingConfirmation(ref p) if p.name == "b"));

        let cancelled = life.cancel_delete().unwrap();
        assert_eq!(cancelled.name, "b");
        assert_eq!(life.confirm_delete(&tree, &mut notifier), DeleteOutcome::NotFound);
        assert_eq!(names(&life, &tree, "5.3"), vec!["a", "b"]);
    }

    #[test]
    fn test_confirm_skips_moved_target() {
        let tree = CatalogVariant::Clauses.builtin();
        let mut life = AttachmentLifecycle::new(DeletePolicy::Clauses);
        let mut notifier = RecordingNotifier::approving();

        life.request_delete(&tree, "5.1", 1, &mut notifier);
        // Row 0 removed out from under the pending request
        let node = tree.find("5.1").unwrap();
        let slot = life.merged(node).locate(0).unwrap();
        life.store.remove(node, slot);

        assert_eq!(life.confirm_delete(&tree, &mut notifier), DeleteOutcome::NotFound);
        assert_eq!(names(&life, &tree, "5.1"), vec!["Management-Commitment-Letter.pdf"]);
    }

    #[test]
    fn test_download_uploaded_saves_bytes() {
        let (tree, mut expansion, mut life) = controls();
        let mut notifier = RecordingNotifier::approving();
        let dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(dir.path());
        life.add_attachments(&tree, &mut expansion, "8.15", vec![file("syslog.txt")], "Dana", &mut notifier)
            .unwrap();

        let record = life.record_at(&tree, "8.15", 0).unwrap().clone();
        let outcome = life.download_attachment(&record, &sink, &mut notifier).unwrap();

        let DownloadOutcome::Saved(path) = outcome else {
            panic!("expected a real save");
        };
        assert_eq!(std::fs::read(path).unwrap(), b"bytes of syslog.txt");
    }

    #[test]
    fn test_download_seed_is_simulated() {
        let (tree, _, life) = controls();
        let mut notifier = RecordingNotifier::approving();
        let dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(dir.path());

        let record = life.record_at(&tree, "5.1", 0).unwrap().clone();
        let outcome = life.download_attachment(&record, &sink, &mut notifier).unwrap();

        assert_eq!(outcome, DownloadOutcome::Simulated);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert!(notifier.notices()[0].message.starts_with("Download initiated"));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Add(Vec<String>),
        Delete(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            proptest::collection::vec("[a-z]{1,6}\\.pdf", 0..3).prop_map(Op::Add),
            (0usize..8).prop_map(Op::Delete),
        ]
    }

    proptest! {
        #[test]
        fn prop_merged_is_seed_then_uploaded(ops in proptest::collection::vec(op_strategy(), 0..20)) {
            let (tree, mut expansion, mut life) = controls();
            let mut notifier = RecordingNotifier::approving();
            let seeds = names(&life, &tree, "5.1");
            let mut model: Vec<String> = Vec::new();

            for op in ops {
                match op {
                    Op::Add(batch) => {
                        let files = batch.iter().map(|n| file(n)).collect();
                        life.add_attachments(&tree, &mut expansion, "5.1", files, "p", &mut notifier).unwrap();
                        model.extend(batch);
                    },
                    Op::Delete(index) => {
                        life.delete_attachment(&tree, "5.1", index, &mut notifier);
                        if index >= seeds.len() && index - seeds.len() < model.len() {
                            model.remove(index - seeds.len());
                        }
                    },
                }
                let expected: Vec<String> = seeds.iter().cloned().chain(model.iter().cloned()).collect();
                prop_assert_eq!(names(&life, &tree, "5.1"), expected);
            }
        }

        #[test]
        fn prop_controls_never_deletes_seeds(
            uploads in proptest::collection::vec("[a-z]{1,6}", 0..4),
            node_pick in 0usize..64,
        ) {
            let (tree, mut expansion, mut life) = controls();
            let seeded: Vec<String> = tree
                .iter()
                .filter(|n| !n.seed_attachments.is_empty())
                .map(|n| n.id.clone())
                .collect();
            let node_id = &seeded[node_pick % seeded.len()];
            let mut notifier = RecordingNotifier::approving();
            let files = uploads.iter().map(|n| file(n)).collect();
            life.add_attachments(&tree, &mut expansion, node_id, files, "p", &mut notifier).unwrap();

            let seed_len = tree.find(node_id).unwrap().seed_attachments.len();
            for i in 0..seed_len {
                let before = names(&life, &tree, node_id);
                notifier.clear();

                let outcome = life.delete_attachment(&tree, node_id, i, &mut notifier);

                prop_assert_eq!(outcome, DeleteOutcome::Rejected);
                prop_assert_eq!(names(&life, &tree, node_id), before);
                prop_assert_eq!(notifier.notices().len(), 1);
                prop_assert!(notifier.prompts().is_empty());
            }
        }
    }
}
