//! Per-node uploaded attachments and the merged seed ++ uploaded view

use crate::attachments::types::AttachmentRecord;
use crate::catalog::ComplianceNode;
use std::collections::{BTreeSet, HashMap};

/// Session-scoped attachment state
///
/// A node with no entry behaves exactly like a node with an empty list.
/// Catalog seeds are never touched; a seed removed under the clauses policy
/// is recorded here as retired and left out of the merged view.
#[derive(Debug, Clone, Default)]
pub struct AttachmentStore {
    uploaded: HashMap<String, Vec<AttachmentRecord>>,
    retired_seeds: HashMap<String, BTreeSet<usize>>,
}

/// Which underlying segment a merged position falls in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Index into the node's catalog seed list
    Seed(usize),
    /// Index into the node's uploaded list
    Uploaded(usize),
}

impl AttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records uploaded to `node_id`, oldest first
    pub fn uploaded(&self, node_id: &str) -> &[AttachmentRecord] {
        self.uploaded.get(node_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Append records to `node_id` in the order given
    pub fn append(&mut self, node_id: &str, records: impl IntoIterator<Item = AttachmentRecord>) {
        self.uploaded
            .entry(node_id.to_string())
            .or_default()
            .extend(records);
    }

    /// Merged list shown for `node`
    pub fn merged<'a>(&'a self, node: &'a ComplianceNode) -> MergedView<'a> {
        let retired = self.retired_seeds.get(&node.id);
        let seeds = node
            .seed_attachments
            .iter()
            .enumerate()
            .filter(|(i, _)| retired.map_or(true, |r| !r.contains(i)))
            .collect();

        MergedView {
            seeds,
            uploaded: self.uploaded(&node.id),
        }
    }

    /// Remove whatever sits in `slot`; `None` if the slot is already empty
    pub fn remove(&mut self, node: &ComplianceNode, slot: Slot) -> Option<AttachmentRecord> {
        match slot {
            Slot::Seed(seed_index) => {
                let record = node.seed_attachments.get(seed_index)?.clone();
                let newly_retired = self
                    .retired_seeds
                    .entry(node.id.clone())
                    .or_default()
                    .insert(seed_index);
                newly_retired.then_some(record)
            },
            Slot::Uploaded(index) => {
                let list = self.uploaded.get_mut(&node.id)?;
                if index < list.len() {
                    Some(list.remove(index))
                } else {
                    None
                }
            },
        }
    }

    /// Total uploaded records across all nodes
    pub fn total_uploaded(&self) -> usize {
        self.uploaded.values().map(Vec::len).sum()
    }
}

/// Borrowed seed ++ uploaded sequence for one node
#[derive(Debug, Clone)]
pub struct MergedView<'a> {
    seeds: Vec<(usize, &'a AttachmentRecord)>,
    uploaded: &'a [AttachmentRecord],
}

impl<'a> MergedView<'a> {
    pub fn len(&self) -> usize {
        self.seeds.len() + self.uploaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of visible seed rows at the head of the list
    pub fn seed_len(&self) -> usize {
        self.seeds.len()
    }

    pub fn get(&self, index: usize) -> Option<&'a AttachmentRecord> {
        match self.locate(index)? {
            Slot::Seed(_) => self.seeds.get(index).map(|(_, r)| *r),
            Slot::Uploaded(i) => self.uploaded.get(i),
        }
    }

    /// Map a merged position to its underlying segment
    pub fn locate(&self, index: usize) -> Option<Slot> {
        if let Some((seed_index, _)) = self.seeds.get(index) {
            return Some(Slot::Seed(*seed_index));
        }
        let uploaded_index = index - self.seeds.len();
        (uploaded_index < self.uploaded.len()).then_some(Slot::Uploaded(uploaded_index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a AttachmentRecord> + '_ {
        self.seeds
            .iter()
            .map(|(_, r)| *r)
            .chain(self.uploaded.iter())
    }

    pub fn names(&self) -> Vec<&'a str> {
        self.iter().map(|r| r.name.as_str()).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::attachments::types::{IncomingFile, Origin};
    use crate::catalog::CatalogVariant;
    use chrono::Local;

    fn upload(name: &str) -> AttachmentRecord {
        AttachmentRecord::uploaded(IncomingFile::new(name, name.as_bytes().to_vec()), "tester", Local::now())
    }

    #[test]
    fn test_absent_node_is_empty() {
        let store = AttachmentStore::new();
        assert!(store.uploaded("9.9").is_empty());
        assert_eq!(store.total_uploaded(), 0);
    }

    #[test]
    fn test_merged_is_seed_then_uploaded() {
        let tree = CatalogVariant::Controls.builtin();
        let node = tree.find("5.1").unwrap();
        let mut store = AttachmentStore::new();
        store.append("5.1", [upload("a.pdf"), upload("b.pdf")]);

        let view = store.merged(node);
        assert_eq!(view.len(), 4);
        assert_eq!(view.seed_len(), 2);
        assert_eq!(
            view.names(),
            vec![
                "Information-Security-Policy-v3.pdf",
                "Policy-Acknowledgements.xlsx",
                "a.pdf",
                "b.pdf"
            ]
        );
        assert_eq!(view.get(2).unwrap().origin, Origin::Uploaded);
        assert!(view.get(4).is_none());
    }

    #[test]
    fn test_locate_segments() {
        let tree = CatalogVariant::Controls.builtin();
        let node = tree.find("5.1").unwrap();
        let mut store = AttachmentStore::new();
        store.append("5.1", [upload("a.pdf")]);

        let view = store.merged(node);
        assert_eq!(view.locate(0), Some(Slot::Seed(0)));
        assert_eq!(view.locate(1), Some(Slot::Seed(1)));
        assert_eq!(view.locate(2), Some(Slot::Uploaded(0)));
        assert_eq!(view.locate(3), None);
    }

    #[test]
    fn test_retired_seed_shifts_positions() {
        let tree = CatalogVariant::Controls.builtin();
        let node = tree.find("5.1").unwrap();
        let mut store = AttachmentStore::new();
        store.append("5.1", [upload("a.pdf")]);

        let removed = store.remove(node, Slot::Seed(0)).unwrap();
        assert_eq!(removed.name, "Information-Security-Policy-v3.pdf");
        assert!(store.remove(node, Slot::Seed(0)).is_none());

        let view = store.merged(node);
        assert_eq!(view.names(), vec!["Policy-Acknowledgements.xlsx", "a.pdf"]);
        assert_eq!(view.locate(0), Some(Slot::Seed(1)));
        assert_eq!(view.locate(1), Some(Slot::Uploaded(0)));

        // The catalog itself is untouched
        assert_eq!(node.seed_attachments.len(), 2);
    }

    #[test]
    fn test_remove_uploaded_out_of_range() {
        let tree = CatalogVariant::Clauses.builtin();
        let node = tree.find("4.4").unwrap();
        let mut store = AttachmentStore::new();

        assert!(store.remove(node, Slot::Uploaded(0)).is_none());
        store.append("4.4", [upload("x.txt")]);
        assert!(store.remove(node, Slot::Uploaded(1)).is_none());
        assert_eq!(store.remove(node, Slot::Uploaded(0)).unwrap().name, "x.txt");
        assert!(store.uploaded("4.4").is_empty());
    }
}
