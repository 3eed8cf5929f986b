//! engine::diff
//!
//! Derive change operations from an (active, working) pair.
//!
//! # Architecture
//!
//! Both trees are walked in lock-step, parent before children. At each
//! path:
//!
//! - present only in working: `Add`, then `Deactivate`/`Comment` if the
//!   new node carries them, then the children as further adds
//! - present only in active: `Delete`, then the children as further
//!   deletes
//! - present in both: `Update` if values or flags differ, `Activate` or
//!   `Deactivate` if the flag differs, `Comment` if the comment differs
//!
//! Children are visited in working-tree order, then active-only children
//! in active-tree order.
//!
//! # Invariants
//!
//! - Output is pre-order: a parent's ops precede its descendants' ops
//! - Identical trees produce no ops
//! - Diffing is pure: no I/O, no mutation

use crate::core::change::{ChangeKind, ChangeOp};
use crate::core::node::ConfigNode;
use crate::core::path::ConfigPath;
use crate::core::tree::ConfigTree;

/// Compute the pre-order change list turning `active` into `working`.
///
/// # Example
///
/// ```
/// use cstore::core::path::ConfigPath;
/// use cstore::core::tree::ConfigTree;
/// use cstore::core::node::NodeFlags;
/// use cstore::engine::diff::diff;
///
/// let active = ConfigTree::new();
/// let mut working = ConfigTree::new();
/// let path = ConfigPath::parse("a/b").unwrap();
/// working.set(&path, None, &|_: &ConfigPath| NodeFlags::default()).unwrap();
///
/// let ops = diff(&active, &working);
/// assert_eq!(ops.len(), 2);
/// assert_eq!(ops[0].path, ConfigPath::parse("a").unwrap());
/// ```
pub fn diff(active: &ConfigTree, working: &ConfigTree) -> Vec<ChangeOp> {
    let mut ops = Vec::new();
    let root = ConfigPath::root();
    if active.root().comment() != working.root().comment() {
        ops.push(comment_op(&root, working.root()));
    }
    diff_children(active.root(), working.root(), &root, &mut ops);
    ops
}

fn diff_children(active: &ConfigNode, working: &ConfigNode, path: &ConfigPath, ops: &mut Vec<ChangeOp>) {
    for child in working.children() {
        let name = child.name().unwrap_or_default();
        let child_path = path.join_unchecked(name);
        match active.child(name) {
            Some(old) => diff_node(old, child, &child_path, ops),
            None => added(child, &child_path, ops),
        }
    }
    for old in active.children() {
        let name = old.name().unwrap_or_default();
        if working.child(name).is_none() {
            deleted(old, &path.join_unchecked(name), ops);
        }
    }
}

fn diff_node(active: &ConfigNode, working: &ConfigNode, path: &ConfigPath, ops: &mut Vec<ChangeOp>) {
    if active.values() != working.values() || active.flags() != working.flags() {
        ops.push(ChangeOp::new(
            path.clone(),
            ChangeKind::Update {
                old: active.values().to_vec(),
                new: working.values().to_vec(),
                flags: working.flags(),
            },
        ));
    }
    match (active.is_deactivated(), working.is_deactivated()) {
        (false, true) => ops.push(ChangeOp::new(path.clone(), ChangeKind::Deactivate)),
        (true, false) => ops.push(ChangeOp::new(path.clone(), ChangeKind::Activate)),
        _ => {}
    }
    if active.comment() != working.comment() {
        ops.push(comment_op(path, working));
    }
    diff_children(active, working, path, ops);
}

fn added(node: &ConfigNode, path: &ConfigPath, ops: &mut Vec<ChangeOp>) {
    ops.push(ChangeOp::new(
        path.clone(),
        ChangeKind::Add {
            values: node.values().to_vec(),
            flags: node.flags(),
        },
    ));
    if node.is_deactivated() {
        ops.push(ChangeOp::new(path.clone(), ChangeKind::Deactivate));
    }
    if node.comment().is_some() {
        ops.push(comment_op(path, node));
    }
    for child in node.children() {
        added(child, &path.join_unchecked(child.name().unwrap_or_default()), ops);
    }
}

fn deleted(node: &ConfigNode, path: &ConfigPath, ops: &mut Vec<ChangeOp>) {
    ops.push(ChangeOp::new(path.clone(), ChangeKind::Delete));
    for child in node.children() {
        deleted(child, &path.join_unchecked(child.name().unwrap_or_default()), ops);
    }
}

fn comment_op(path: &ConfigPath, node: &ConfigNode) -> ChangeOp {
    ChangeOp::new(
        path.clone(),
        ChangeKind::Comment {
            text: node.comment().map(str::to_string),
        },
    )
}
