//! Which tree nodes are currently expanded

use crate::catalog::ComplianceTree;
use std::collections::BTreeSet;

/// Set of expanded node ids
///
/// Levels are independent: collapsing "4" leaves "4.1" expanded, so reopening
/// the parent shows the child the way it was left. Unknown ids are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: BTreeSet<String>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `id`; returns the new state
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_string());
            true
        }
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    /// Expand `id`; returns true if it was collapsed before
    pub fn expand(&mut self, id: &str) -> bool {
        self.expanded.insert(id.to_string())
    }

    /// Expand every node in `tree`
    pub fn expand_all(&mut self, tree: &ComplianceTree) {
        self.expanded.extend(tree.iter().map(|n| n.id.clone()));
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::catalog::CatalogVariant;
    use proptest::prelude::*;

    #[test]
    fn test_toggle_flips_membership() {
        let mut state = ExpansionState::new();
        assert!(state.toggle("4"));
        assert!(state.is_expanded("4"));
        assert!(!state.toggle("4"));
        assert!(!state.is_expanded("4"));
    }

    #[test]
    fn test_levels_are_independent() {
        let mut state = ExpansionState::new();
        state.toggle("4");
        state.toggle("4.1");
        state.toggle("4");

        assert!(!state.is_expanded("4"));
        assert!(state.is_expanded("4.1"));
    }

    #[test]
    fn test_unknown_ids_are_not_errors() {
        let mut state = ExpansionState::new();
        state.toggle("not-a-node");
        assert!(state.is_expanded("not-a-node"));
    }

    #[test]
    fn test_expand_is_idempotent() {
        let mut state = ExpansionState::new();
        assert!(state.expand("5.1"));
        assert!(!state.expand("5.1"));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_expand_all_and_collapse_all() {
        let tree = CatalogVariant::Controls.builtin();
        let mut state = ExpansionState::new();

        state.expand_all(&tree);
        assert_eq!(state.len(), tree.len());
        assert!(tree.iter().all(|n| state.is_expanded(&n.id)));

        state.collapse_all();
        assert!(state.is_empty());
    }

    proptest! {
        #[test]
        fn prop_double_toggle_restores_membership(
            initial in proptest::collection::btree_set("[0-9]{1,2}(\\.[0-9]{1,2})?", 0..8),
            id in "[0-9a-z.]{0,6}",
        ) {
            let mut state = ExpansionState::new();
            for existing in &initial {
                state.expand(existing);
            }
            let before = state.clone();

            state.toggle(&id);
            state.toggle(&id);

            prop_assert_eq!(state, before);
        }
    }
}
