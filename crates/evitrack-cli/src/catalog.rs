//! Compliance catalog: the static tree of requirement nodes
//!
//! A catalog is either the built-in management-system clauses, the built-in
//! control set, or a YAML file with the same shape. It is built once per
//! session and never mutated afterwards; seed evidence hangs off the nodes.

use crate::attachments::{AttachmentRecord, DeletePolicy};
use crate::error::{Result, TrackerError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Which built-in catalog (and deletion policy) a session uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CatalogVariant {
    /// Management-system clauses 4-10; any row may be deleted after confirmation
    #[default]
    Clauses,
    /// Annex-style controls; preloaded evidence is protected
    Controls,
}

impl CatalogVariant {
    pub fn policy(self) -> DeletePolicy {
        match self {
            CatalogVariant::Clauses => DeletePolicy::Clauses,
            CatalogVariant::Controls => DeletePolicy::Controls,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CatalogVariant::Clauses => "clauses",
            CatalogVariant::Controls => "controls",
        }
    }

    /// The built-in tree for this variant
    pub fn builtin(self) -> ComplianceTree {
        let roots = match self {
            CatalogVariant::Clauses => builtin::clauses(),
            CatalogVariant::Controls => builtin::controls(),
        };
        ComplianceTree {
            variant: self,
            roots,
        }
    }
}

impl std::fmt::Display for CatalogVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A clause, sub-clause, control, or sub-control
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceNode {
    pub id: String,
    pub title: String,
    pub has_info: bool,
    pub children: Vec<ComplianceNode>,
    pub seed_attachments: Vec<AttachmentRecord>,
}

impl ComplianceNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Immutable catalog tree
#[derive(Debug, Clone)]
pub struct ComplianceTree {
    variant: CatalogVariant,
    roots: Vec<ComplianceNode>,
}

impl ComplianceTree {
    /// Build a tree, rejecting blank or duplicate node ids
    pub fn new(variant: CatalogVariant, roots: Vec<ComplianceNode>) -> Result<Self> {
        let tree = Self { variant, roots };
        let mut seen = HashSet::new();
        for node in tree.iter() {
            if node.id.trim().is_empty() {
                return Err(TrackerError::invalid_catalog(format!(
                    "node '{}' has an empty id",
                    node.title
                )));
            }
            if !seen.insert(node.id.as_str()) {
                return Err(TrackerError::invalid_catalog(format!(
                    "duplicate node id '{}'",
                    node.id
                )));
            }
        }
        Ok(tree)
    }

    /// Load a catalog from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TrackerError::config(format!(
                "catalog file '{}' does not exist",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a catalog from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: CatalogFile = serde_yaml::from_str(content)?;
        let roots = file.nodes.into_iter().map(ComplianceNode::from).collect();
        Self::new(file.variant, roots)
    }

    pub fn variant(&self) -> CatalogVariant {
        self.variant
    }

    pub fn roots(&self) -> &[ComplianceNode] {
        &self.roots
    }

    /// Depth-first, pre-order walk over every node
    pub fn iter(&self) -> NodeIter<'_> {
        NodeIter {
            stack: self.roots.iter().rev().collect(),
        }
    }

    pub fn find(&self, id: &str) -> Option<&ComplianceNode> {
        self.iter().find(|node| node.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Ids of nodes that have children
    pub fn branch_ids(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|n| !n.is_leaf()).map(|n| n.id.as_str())
    }
}

/// Pre-order iterator over a [`ComplianceTree`]
pub struct NodeIter<'a> {
    stack: Vec<&'a ComplianceNode>,
}

impl<'a> Iterator for NodeIter<'a> {
    type Item = &'a ComplianceNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

// ============================================================================
// YAML catalog format
// ============================================================================

#[derive(Debug, Deserialize)]
struct CatalogFile {
    variant: CatalogVariant,
    #[serde(default)]
    nodes: Vec<NodeSpec>,
}

#[derive(Debug, Deserialize)]
struct NodeSpec {
    id: String,
    title: String,
    #[serde(default)]
    has_info: bool,
    #[serde(default)]
    children: Vec<NodeSpec>,
    #[serde(default)]
    evidence: Vec<SeedSpec>,
}

#[derive(Debug, Deserialize)]
struct SeedSpec {
    name: String,
    date: String,
    shared_by: String,
}

impl From<NodeSpec> for ComplianceNode {
    fn from(raw: NodeSpec) -> Self {
        Self {
            id: raw.id,
            title: raw.title,
            has_info: raw.has_info,
            children: raw.children.into_iter().map(Self::from).collect(),
            seed_attachments: raw
                .evidence
                .into_iter()
                .map(|s| AttachmentRecord::seed(s.name, s.date, s.shared_by))
                .collect(),
        }
    }
}

mod builtin {
    use super::ComplianceNode;
    use crate::attachments::AttachmentRecord;

    type Seed = (&'static str, &'static str, &'static str);

    fn leaf(id: &str, title: &str, has_info: bool, seeds: &[Seed]) -> ComplianceNode {
        ComplianceNode {
            id: id.to_string(),
            title: title.to_string(),
            has_info,
            children: Vec::new(),
            seed_attachments: seeds
                .iter()
                .map(|(name, date, by)| AttachmentRecord::seed(*name, *date, *by))
                .collect(),
        }
    }

    fn branch(id: &str, title: &str, children: Vec<ComplianceNode>) -> ComplianceNode {
        ComplianceNode {
            id: id.to_string(),
            title: title.to_string(),
            has_info: true,
            children,
            seed_attachments: Vec::new(),
        }
    }

    const PMO: &str = "Priya Raman (PMO)";
    const CISO: &str = "Marcus Bell (CISO)";
    const HR: &str = "Elena Ortiz (HR)";
    const IT: &str = "Sam Okafor (IT Ops)";

    pub(super) fn clauses() -> Vec<ComplianceNode> {
        vec![
            branch("4", "Context of the organization", vec![
                leaf("4.1", "Understanding the organization and its context", true, &[
                    ("Context-Analysis-2024.pdf", "Jan 12, 2024", PMO),
                ]),
                leaf("4.2", "Needs and expectations of interested parties", true, &[
                    ("Stakeholder-Register.xlsx", "Jan 15, 2024", PMO),
                ]),
                leaf("4.3", "Determining the scope of the ISMS", true, &[
                    ("ISMS-Scope-Statement.pdf", "Jan 18, 2024", CISO),
                ]),
                leaf("4.4", "Information security management system", false, &[]),
            ]),
            branch("5", "Leadership", vec![
                leaf("5.1", "Leadership and commitment", true, &[
                    ("Board-Minutes-Q1.pdf", "Feb 2, 2024", PMO),
                    ("Management-Commitment-Letter.pdf", "Feb 5, 2024", CISO),
                ]),
                leaf("5.2", "Policy", true, &[
                    ("Information-Security-Policy-v3.pdf", "Feb 9, 2024", CISO),
                ]),
                leaf("5.3", "Organizational roles, responsibilities and authorities", false, &[
                    ("RACI-Matrix.xlsx", "Feb 14, 2024", PMO),
                ]),
            ]),
            branch("6", "Planning", vec![
                leaf("6.1", "Actions to address risks and opportunities", true, &[
                    ("Risk-Assessment-Methodology.docx", "Mar 1, 2024", CISO),
                    ("Risk-Register-Q1.xlsx", "Mar 4, 2024", CISO),
                ]),
                leaf("6.2", "Information security objectives and planning", false, &[]),
                leaf("6.3", "Planning of changes", false, &[]),
            ]),
            branch("7", "Support", vec![
                leaf("7.1", "Resources", false, &[]),
                leaf("7.2", "Competence", true, &[
                    ("Training-Records-2024.xlsx", "Mar 20, 2024", HR),
                ]),
                leaf("7.3", "Awareness", false, &[]),
                leaf("7.4", "Communication", false, &[]),
                leaf("7.5", "Documented information", true, &[
                    ("Document-Control-Procedure.pdf", "Mar 28, 2024", PMO),
                ]),
            ]),
            branch("8", "Operation", vec![
                leaf("8.1", "Operational planning and control", false, &[]),
                leaf("8.2", "Information security risk assessment", true, &[]),
                leaf("8.3", "Information security risk treatment", true, &[
                    ("Statement-of-Applicability.xlsx", "Apr 10, 2024", CISO),
                ]),
            ]),
            branch("9", "Performance evaluation", vec![
                leaf("9.1", "Monitoring, measurement, analysis and evaluation", false, &[]),
                leaf("9.2", "Internal audit", true, &[
                    ("Internal-Audit-Report-2024.pdf", "May 6, 2024", PMO),
                ]),
                leaf("9.3", "Management review", true, &[]),
            ]),
            branch("10", "Improvement", vec![
                leaf("10.1", "Continual improvement", false, &[]),
                leaf("10.2", "Nonconformity and corrective action", true, &[
                    ("Corrective-Action-Log.xlsx", "May 20, 2024", PMO),
                ]),
            ]),
        ]
    }

    pub(super) fn controls() -> Vec<ComplianceNode> {
        vec![
            branch("5", "Organizational controls", vec![
                leaf("5.1", "Policies for information security", true, &[
                    ("Information-Security-Policy-v3.pdf", "Feb 9, 2024", CISO),
                    ("Policy-Acknowledgements.xlsx", "Feb 20, 2024", HR),
                ]),
                leaf("5.2", "Information security roles and responsibilities", false, &[
                    ("RACI-Matrix.xlsx", "Feb 14, 2024", PMO),
                ]),
                leaf("5.3", "Segregation of duties", false, &[]),
                leaf("5.7", "Threat intelligence", true, &[]),
                leaf("5.15", "Access control", true, &[
                    ("Access-Control-Policy.pdf", "Mar 3, 2024", CISO),
                ]),
            ]),
            branch("6", "People controls", vec![
                leaf("6.1", "Screening", false, &[
                    ("Background-Check-Procedure.pdf", "Mar 11, 2024", HR),
                ]),
                leaf("6.3", "Information security awareness, education and training", true, &[
                    ("Training-Records-2024.xlsx", "Mar 20, 2024", HR),
                ]),
            ]),
            branch("7", "Physical controls", vec![
                leaf("7.1", "Physical security perimeters", false, &[]),
                leaf("7.4", "Physical security monitoring", false, &[
                    ("CCTV-Coverage-Map.pdf", "Apr 2, 2024", IT),
                ]),
            ]),
            branch("8", "Technological controls", vec![
                leaf("8.1", "User endpoint devices", false, &[]),
                leaf("8.5", "Secure authentication", true, &[
                    ("MFA-Rollout-Report.pdf", "Apr 15, 2024", IT),
                ]),
                leaf("8.13", "Information backup", true, &[
                    ("Backup-Restore-Test.docx", "Apr 22, 2024", IT),
                ]),
                leaf("8.15", "Logging", false, &[]),
            ]),
        ]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::attachments::Origin;

    #[test]
    fn test_builtin_catalogs_are_valid() {
        for variant in [CatalogVariant::Clauses, CatalogVariant::Controls] {
            let tree = variant.builtin();
            let rebuilt = ComplianceTree::new(variant, tree.roots().to_vec());
            assert!(rebuilt.is_ok(), "{} catalog has duplicate ids", variant);
            assert!(!tree.is_empty());
        }
    }

    #[test]
    fn test_controls_5_1_has_two_seeds() {
        let tree = CatalogVariant::Controls.builtin();
        let node = tree.find("5.1").unwrap();
        assert_eq!(node.seed_attachments.len(), 2);
        assert!(node.seed_attachments.iter().all(|r| r.origin == Origin::Seed));
        assert!(node.is_leaf());
    }

    #[test]
    fn test_iter_is_pre_order() {
        let tree = CatalogVariant::Clauses.builtin();
        let ids: Vec<&str> = tree.iter().take(6).map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["4", "4.1", "4.2", "4.3", "4.4", "5"]);
        assert_eq!(tree.branch_ids().count(), 7);
    }

    #[test]
    fn test_find_unknown_node() {
        let tree = CatalogVariant::Clauses.builtin();
        assert!(tree.find("42.7").is_none());
        assert!(!tree.contains(""));
    }

    #[test]
    fn test_variant_policy() {
        assert_eq!(CatalogVariant::Clauses.policy(), DeletePolicy::Clauses);
        assert_eq!(CatalogVariant::Controls.policy(), DeletePolicy::Controls);
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
variant: controls
nodes:
  - id: "A"
    title: "Access"
    children:
      - id: "A.1"
        title: "Badges"
        has_info: true
        evidence:
          - name: "badge-log.csv"
            date: "Jun 1, 2024"
            shared_by: "Facilities"
"#;
        let tree = ComplianceTree::from_yaml(yaml).unwrap();
        assert_eq!(tree.variant(), CatalogVariant::Controls);
        assert_eq!(tree.len(), 2);

        let leaf = tree.find("A.1").unwrap();
        assert!(leaf.has_info);
        assert_eq!(leaf.seed_attachments[0].name, "badge-log.csv");
        assert_eq!(leaf.seed_attachments[0].shared_by, "Facilities");
    }

    #[test]
    fn test_from_yaml_rejects_duplicate_ids() {
        let yaml = r#"
variant: clauses
nodes:
  - id: "1"
    title: "One"
  - id: "1"
    title: "Also one"
"#;
        match ComplianceTree::from_yaml(yaml) {
            Err(TrackerError::InvalidCatalog(msg)) => assert!(msg.contains("duplicate")),
            other => panic!("expected invalid catalog, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            ComplianceTree::load("/definitely/not/here.yml"),
            Err(TrackerError::Config(_))
        ));
    }
}
