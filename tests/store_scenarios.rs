//! Store scenarios run through the public library API.
//!
//! Each test builds a [`Store`], drives it through edits and commits, and
//! checks both trees afterwards.

use cstore::core::change::{ChangeKind, ChangeOp};
use cstore::core::config::SchemaConfig;
use cstore::core::node::NodeFlags;
use cstore::core::path::{ConfigPath, PathArgs};
use cstore::core::schema::{OpenSchema, PatternSchema, Schema};
use cstore::core::tree::ConfigTree;
use cstore::engine::{CommitError, CommitPlan, Executor};
use cstore::store::{ErrorKind, Store};

// =============================================================================
// Test Fixtures
// =============================================================================

fn p(s: &str) -> ConfigPath {
    ConfigPath::parse(s).unwrap()
}

fn args(words: &[&str]) -> PathArgs {
    PathArgs::new(words).unwrap()
}

fn router_schema() -> Box<dyn Schema> {
    Box::new(
        PatternSchema::from_config(&SchemaConfig {
            leaf: vec![
                "interfaces/ethernet/*/address".into(),
                "system/host-name".into(),
            ],
            multi: vec!["system/name-server".into()],
            tag: vec!["interfaces/ethernet".into(), "firewall/rule".into()],
        })
        .unwrap(),
    )
}

fn open_store() -> Store {
    Store::new(Box::new(OpenSchema))
}

// =============================================================================
// Commit
// =============================================================================

#[test]
fn commit_new_interface_address() {
    let mut store = Store::new(router_schema());
    store
        .set(args(&["interfaces", "ethernet", "eth0", "address", "10.0.0.1"]))
        .unwrap();

    let report = store.commit().unwrap();
    assert_eq!(report.applied, 4);
    assert!(report.digest.starts_with("sha256:"));

    let path = p("interfaces/ethernet/eth0/address");
    assert_eq!(store.active().get(&path).unwrap(), ["10.0.0.1"]);
    assert_eq!(store.active(), store.working());
    assert!(!store.in_session());
    assert!(store.active().node(&p("interfaces/ethernet")).unwrap().is_tag_node());
}

#[test]
fn commit_with_no_edits_is_noop() {
    let mut store = open_store();
    store.set_path(&p("a/b"), Some("1")).unwrap();
    store.commit().unwrap();
    let before = store.active().clone();

    let report = store.commit().unwrap();
    assert_eq!(report.applied, 0);
    assert!(report.changes.is_empty());
    assert_eq!(store.active(), &before);
}

#[test]
fn commit_carries_every_kind_of_change() {
    let mut store = open_store();
    store.set_path(&p("fw/rule/10"), Some("accept")).unwrap();
    store.set_path(&p("old/leaf"), None).unwrap();
    store.commit().unwrap();

    store.set_path(&p("fw/rule/10"), Some("drop")).unwrap();
    store.deactivate(&p("fw/rule")).unwrap();
    store.comment(&p("fw"), Some("edge")).unwrap();
    store.delete_path(&p("old"), None).unwrap();
    store.set_path(&p("new"), None).unwrap();

    let labels: Vec<&str> = store.pending().ops().iter().map(|op| op.kind.label()).collect();
    assert!(labels.contains(&"update"));
    assert!(labels.contains(&"deactivate"));
    assert!(labels.contains(&"comment"));
    assert!(labels.contains(&"delete"));
    assert!(labels.contains(&"add"));

    store.commit().unwrap();
    let active = store.active();
    assert_eq!(active.get(&p("fw/rule/10")).unwrap(), ["drop"]);
    assert!(active.node(&p("fw/rule")).unwrap().is_deactivated());
    assert_eq!(active.node(&p("fw")).unwrap().comment(), Some("edge"));
    assert!(!active.exists(&p("old")));
    assert!(active.exists(&p("new")));
}

#[test]
fn schema_rejection_leaves_trees() {
    #[derive(Debug)]
    struct RejectDeletes;

    impl Schema for RejectDeletes {
        fn validate_change(&self, op: &ChangeOp, _tree: &ConfigTree) -> Result<(), String> {
            if op.is_delete() {
                return Err("deletes are frozen".into());
            }
            Ok(())
        }
    }

    let mut store = Store::new(Box::new(RejectDeletes));
    store.set_path(&p("a/b"), None).unwrap();
    store.commit().unwrap();

    store.delete_path(&p("a/b"), None).unwrap();
    let active_before = store.active().clone();
    let working_before = store.working().clone();

    let err = store.commit().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailed);
    assert_eq!(store.active(), &active_before);
    assert_eq!(store.working(), &working_before);
    assert!(store.in_session());
}

#[test]
fn crafted_plan_failing_midway_leaves_active() {
    let mut active = ConfigTree::new();
    active
        .set(&p("keep/me"), Some("1"), &|_: &ConfigPath| NodeFlags::default())
        .unwrap();
    let before = active.clone();

    let add = |path: &str| {
        ChangeOp::new(
            p(path),
            ChangeKind::Add {
                values: vec![],
                flags: NodeFlags::default(),
            },
        )
    };
    let plan = CommitPlan::from_ordered(vec![
        add("x"),
        add("x/y"),
        ChangeOp::new(p("missing"), ChangeKind::Delete),
        add("x/z"),
    ]);

    let schema = OpenSchema;
    let err = Executor::new(&schema).apply(&plan, &active).unwrap_err();
    assert!(matches!(err, CommitError::ApplyFailed { index: 2, .. }));
    assert_eq!(active, before);
}

// =============================================================================
// Structural edits
// =============================================================================

#[test]
fn rename_onto_existing_sibling() {
    let mut store = open_store();
    store.set_path(&p("service/http/port"), Some("80")).unwrap();
    store.set_path(&p("service/webserver"), None).unwrap();
    let before = store.working().clone();

    let err = store.rename(&p("service/http"), "webserver").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(store.working(), &before);
}

#[test]
fn deactivate_twice() {
    let mut store = Store::new(router_schema());
    store.set_path(&p("firewall/rule/10"), None).unwrap();
    store.deactivate(&p("firewall/rule/10")).unwrap();

    let err = store.deactivate(&p("firewall/rule/10")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyInactive);

    store.activate(&p("firewall/rule/10")).unwrap();
    let err = store.activate(&p("firewall/rule/10")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyActive);
}

#[test]
fn delete_missing_path() {
    let mut store = open_store();
    store.set_path(&p("a/b/c"), None).unwrap();
    let before = store.working().clone();

    let err = store.delete_path(&p("a/x"), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(store.working(), &before);
}

#[test]
fn set_below_a_leaf_conflicts() {
    let mut store = Store::new(router_schema());
    store
        .set(args(&["system", "host-name", "r1"]))
        .unwrap();

    let err = store
        .set_path(&p("system/host-name/r1/extra"), None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PathConflict);
}

#[test]
fn move_and_copy_subtrees() {
    let mut store = open_store();
    store.set_path(&p("a/b/c"), Some("1")).unwrap();
    store.set_path(&p("d"), None).unwrap();

    store.copy(&p("a/b"), &p("d/b2")).unwrap();
    store.move_to(&p("a/b"), &p("d")).unwrap();

    let working = store.working();
    assert_eq!(working.get(&p("d/b/c")).unwrap(), ["1"]);
    assert_eq!(working.get(&p("d/b2/c")).unwrap(), ["1"]);
    assert!(!working.exists(&p("a/b")));

    let err = store.move_to(&p("d"), &p("d/b")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
}

#[test]
fn root_cannot_be_deleted() {
    let mut store = open_store();
    let err = store.delete_path(&ConfigPath::root(), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidOperation);
}

// =============================================================================
// Sessions
// =============================================================================

#[test]
fn discard_after_edits_restores_active() {
    let mut store = open_store();
    store.set_path(&p("a/b"), Some("1")).unwrap();
    store.commit().unwrap();

    store.set_path(&p("a/b"), Some("2")).unwrap();
    store.set_path(&p("c"), None).unwrap();
    store.rename(&p("a"), "z").unwrap();
    store.discard().unwrap();

    assert_eq!(store.working(), store.active());
    assert_eq!(store.discard().unwrap_err().kind(), ErrorKind::NoSession);
    assert_eq!(store.working(), store.active());
}

#[test]
fn begin_session_twice_is_busy() {
    let mut store = open_store();
    store.begin_session().unwrap();
    assert_eq!(
        store.begin_session().unwrap_err().kind(),
        ErrorKind::SessionBusy
    );
}

#[cfg(feature = "fault_injection")]
mod fault_injection {
    use super::*;
    use cstore::engine::engine_hooks;

    #[test]
    fn apply_failure_at_each_step_keeps_trees() {
        for step in 0..3 {
            let mut store = open_store();
            store.set_path(&p("base"), None).unwrap();
            store.commit().unwrap();

            store.set_path(&p("x/y/z"), None).unwrap();
            let active_before = store.active().clone();
            let working_before = store.working().clone();

            engine_hooks::set_fail_at(step);
            let err = store.commit().unwrap_err();
            engine_hooks::clear();

            assert_eq!(err.kind(), ErrorKind::CommitFailed);
            assert_eq!(store.active(), &active_before);
            assert_eq!(store.working(), &working_before);
            assert!(store.in_session());
        }
    }
}
