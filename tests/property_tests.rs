//! Property-based tests for the store and commit engine.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated edit sequences.

use proptest::prelude::*;

use cstore::core::change::{ChangeKind, ChangeOp};
use cstore::core::node::NodeFlags;
use cstore::core::path::ConfigPath;
use cstore::core::schema::OpenSchema;
use cstore::core::tree::ConfigTree;
use cstore::engine::{CommitError, CommitPlan, Executor};
use cstore::store::Store;

/// A small alphabet so generated paths collide often.
fn component() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(String::from)
}

fn config_path() -> impl Strategy<Value = ConfigPath> {
    prop::collection::vec(component(), 1..5).prop_map(|c| ConfigPath::new(c).unwrap())
}

fn value() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}"
}

#[derive(Debug, Clone)]
enum Edit {
    Set(ConfigPath, Option<String>),
    Delete(ConfigPath),
    Rename(ConfigPath, String),
    Deactivate(ConfigPath),
    Activate(ConfigPath),
    Comment(ConfigPath, Option<String>),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        3 => (config_path(), prop::option::of(value())).prop_map(|(p, v)| Edit::Set(p, v)),
        1 => config_path().prop_map(Edit::Delete),
        1 => (config_path(), component()).prop_map(|(p, n)| Edit::Rename(p, n)),
        1 => config_path().prop_map(Edit::Deactivate),
        1 => config_path().prop_map(Edit::Activate),
        1 => (config_path(), prop::option::of(value())).prop_map(|(p, t)| Edit::Comment(p, t)),
    ]
}

/// Apply an edit, ignoring rejections: those leave the tree unchanged.
fn apply_edit(store: &mut Store, edit: &Edit) {
    let _ = match edit {
        Edit::Set(path, value) => store.set_path(path, value.as_deref()),
        Edit::Delete(path) => store.delete_path(path, None),
        Edit::Rename(path, name) => store.rename(path, name),
        Edit::Deactivate(path) => store.deactivate(path),
        Edit::Activate(path) => store.activate(path),
        Edit::Comment(path, text) => store.comment(path, text.as_deref()),
    };
}

fn store_with(edits: &[Edit]) -> Store {
    let mut store = Store::new(Box::new(OpenSchema));
    for edit in edits {
        apply_edit(&mut store, edit);
    }
    store
}

fn position(ops: &[ChangeOp], path: &ConfigPath) -> Option<usize> {
    ops.iter().position(|op| &op.path == path)
}

proptest! {
    /// Setting a value on a fresh path makes it readable from working.
    #[test]
    fn set_then_get(path in config_path(), v in value()) {
        let mut store = Store::new(Box::new(OpenSchema));
        store.set_path(&path, Some(&v)).unwrap();
        prop_assert_eq!(store.get(&path).unwrap(), [v.clone()]);
        prop_assert!(store.active().is_empty());
    }

    /// A rejected edit never changes the working tree.
    #[test]
    fn rejected_edits_are_noops(setup in prop::collection::vec(edit(), 0..12), attempt in edit()) {
        let mut store = store_with(&setup);
        let before = store.working().clone();
        let result = match &attempt {
            Edit::Set(path, value) => store.set_path(path, value.as_deref()),
            Edit::Delete(path) => store.delete_path(path, None),
            Edit::Rename(path, name) => store.rename(path, name),
            Edit::Deactivate(path) => store.deactivate(path),
            Edit::Activate(path) => store.activate(path),
            Edit::Comment(path, text) => store.comment(path, text.as_deref()),
        };
        if result.is_err() {
            prop_assert_eq!(store.working(), &before);
        }
    }

    /// Edits followed by discard leave working equal to active.
    #[test]
    fn discard_round_trip(
        committed in prop::collection::vec(edit(), 0..10),
        pending in prop::collection::vec(edit(), 1..15),
    ) {
        let mut store = store_with(&committed);
        store.commit().unwrap();
        let active = store.active().clone();

        for edit in &pending {
            apply_edit(&mut store, edit);
        }
        if store.in_session() {
            store.discard().unwrap();
        }
        prop_assert_eq!(store.working(), &active);
        prop_assert_eq!(store.active(), &active);
    }

    /// Commit makes active equal working, and a second commit does nothing.
    #[test]
    fn commit_converges_and_is_idempotent(edits in prop::collection::vec(edit(), 0..20)) {
        let mut store = store_with(&edits);
        let working = store.working().clone();

        store.commit().unwrap();
        prop_assert_eq!(store.active(), &working);
        prop_assert!(store.pending().is_empty());

        let before = store.active().clone();
        let report = store.commit().unwrap();
        prop_assert_eq!(report.applied, 0);
        prop_assert_eq!(store.active(), &before);
    }

    /// A second round of edits on top of a committed tree also converges.
    #[test]
    fn incremental_commit_converges(
        first in prop::collection::vec(edit(), 0..12),
        second in prop::collection::vec(edit(), 0..12),
    ) {
        let mut store = store_with(&first);
        store.commit().unwrap();
        for edit in &second {
            apply_edit(&mut store, edit);
        }
        let working = store.working().clone();
        store.commit().unwrap();
        prop_assert_eq!(store.active(), &working);
    }

    /// A plan that fails at step k leaves the source tree untouched.
    #[test]
    fn failed_apply_is_atomic(
        setup in prop::collection::vec(edit(), 0..10),
        adds in prop::collection::vec(component(), 0..6),
    ) {
        let mut store = store_with(&setup);
        store.commit().unwrap();
        let active = store.active().clone();

        // Adds under a fresh top-level node always apply; the trailing
        // delete targets a node that never exists.
        let mut ops = vec![ChangeOp::new(
            ConfigPath::new(["fresh"]).unwrap(),
            ChangeKind::Add { values: vec![], flags: NodeFlags::default() },
        )];
        for (i, name) in adds.iter().enumerate() {
            let path = ConfigPath::new(["fresh".to_string(), format!("{name}{i}")]).unwrap();
            ops.push(ChangeOp::new(
                path,
                ChangeKind::Add { values: vec![], flags: NodeFlags::default() },
            ));
        }
        let k = ops.len();
        ops.push(ChangeOp::new(ConfigPath::new(["absent"]).unwrap(), ChangeKind::Delete));
        let plan = CommitPlan::from_ordered(ops);

        let schema = OpenSchema;
        let err = Executor::new(&schema).apply(&plan, &active).unwrap_err();
        let failed_at_k = matches!(err, CommitError::ApplyFailed { index, .. } if index == k);
        prop_assert!(failed_at_k, "expected apply failure at step {}, got {}", k, err);
        prop_assert_eq!(store.active(), &active);
    }

    /// Parents are added before children and deleted after them.
    #[test]
    fn nested_ops_are_ordered(path in prop::collection::vec("[a-z]{1,4}", 2..6)) {
        let full = ConfigPath::new(path).unwrap();
        let mut prefixes = Vec::new();
        let mut prefix = ConfigPath::root();
        for component in full.iter() {
            prefix = prefix.join(component).unwrap();
            prefixes.push(prefix.clone());
        }

        let empty = ConfigTree::new();
        let mut nested = ConfigTree::new();
        nested.set(&full, None, &|_: &ConfigPath| NodeFlags::default()).unwrap();

        let adding = CommitPlan::between(&empty, &nested);
        let add_positions: Vec<usize> = prefixes
            .iter()
            .map(|p| position(adding.ops(), p).unwrap())
            .collect();
        prop_assert!(add_positions.windows(2).all(|w| w[0] < w[1]));

        let removing = CommitPlan::between(&nested, &empty);
        let delete_positions: Vec<usize> = prefixes
            .iter()
            .map(|p| position(removing.ops(), p).unwrap())
            .collect();
        prop_assert!(delete_positions.windows(2).all(|w| w[0] > w[1]));
    }
}
