//! Terminal rendering of the compliance tree
//!
//! Collapsed nodes show one line. An expanded branch shows its children; an
//! expanded node shows its merged evidence rows with their merged index, which
//! is what `delete` and `download` take.

use crate::attachments::{AttachmentLifecycle, AttachmentRecord, Origin};
use crate::catalog::{ComplianceNode, ComplianceTree};
use crate::expansion::ExpansionState;
use colored::Colorize;
use std::fmt::Write;

const INDENT: &str = "    ";

/// Render the visible part of `tree`
pub fn render_tree(
    tree: &ComplianceTree,
    expansion: &ExpansionState,
    attachments: &AttachmentLifecycle,
) -> String {
    let mut out = String::new();
    for node in tree.roots() {
        render_node(&mut out, node, 0, expansion, attachments);
    }
    out
}

fn render_node(
    out: &mut String,
    node: &ComplianceNode,
    depth: usize,
    expansion: &ExpansionState,
    attachments: &AttachmentLifecycle,
) {
    let indent = INDENT.repeat(depth);
    let expanded = expansion.is_expanded(&node.id);
    let marker = if expanded { "▾" } else { "▸" };
    let view = attachments.merged(node);

    let mut line = format!("{}{} {}  {}", indent, marker, node.id.bold(), node.title);
    if node.has_info {
        line.push_str(&format!(" {}", "(i)".dimmed()));
    }
    if !view.is_empty() {
        let noun = if view.len() == 1 { "file" } else { "files" };
        line.push_str(&format!("  {}", format!("[{} {}]", view.len(), noun).cyan()));
    }
    let _ = writeln!(out, "{}", line);

    if !expanded {
        return;
    }

    for child in &node.children {
        render_node(out, child, depth + 1, expansion, attachments);
    }

    if node.is_leaf() && view.is_empty() {
        let _ = writeln!(out, "{}{}{}", indent, INDENT, "No evidence shared yet".dimmed());
    }
    for (index, record) in view.iter().enumerate() {
        let _ = writeln!(out, "{}{}{}", indent, INDENT, attachment_line(index, record));
    }
}

fn attachment_line(index: usize, record: &AttachmentRecord) -> String {
    let origin = match record.origin {
        Origin::Seed => record.origin.to_string().yellow(),
        Origin::Uploaded => record.origin.to_string().green(),
    };
    format!(
        "[{}] {}  {}  {}  {}",
        index,
        record.name,
        record.date_shared.dimmed(),
        record.shared_by,
        origin
    )
}
