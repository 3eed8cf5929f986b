//! End-to-end tests for the `cstore` binary.
//!
//! Every test runs against its own temporary store directory and an
//! explicit config file, so nothing from the host environment leaks in.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Fixtures
// =============================================================================

const SCHEMA: &str = r#"
log_filter = "warn"

[schema]
leaf = ["banner", "system/host-name", "interfaces/ethernet/*/description"]
multi = ["system/name-server"]
tag = ["interfaces/ethernet", "firewall/rule"]
"#;

struct TestStore {
    dir: TempDir,
}

impl TestStore {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        std::fs::write(dir.path().join("config.toml"), SCHEMA).unwrap();
        Self { dir }
    }

    fn store_dir(&self) -> PathBuf {
        self.dir.path().join("store")
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A command bound to this store.
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("cstore").unwrap();
        cmd.arg("--store")
            .arg(self.store_dir())
            .arg("--config")
            .arg(self.config())
            .env_remove("RUST_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) {
        self.cmd().args(args).assert().success();
    }
}

// =============================================================================
// Basics
// =============================================================================

#[test]
fn version_flag_works() {
    Command::cargo_bin("cstore")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("cstore"));
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("cstore")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("commit").and(predicate::str::contains("discard")));
}

#[test]
fn completion_generates_script() {
    Command::cargo_bin("cstore")
        .unwrap()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cstore"));
}

#[test]
fn fresh_store_has_no_session() {
    let store = TestStore::new();
    store
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No edit session"));
}

// =============================================================================
// Edit / commit cycle
// =============================================================================

#[test]
fn set_then_commit() {
    let store = TestStore::new();
    store.run(&["set", "interfaces", "ethernet", "eth0", "description", "uplink"]);

    store
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Edit session"));

    store
        .cmd()
        .args(["show", "--active"])
        .assert()
        .success()
        .stdout(predicate::str::contains("eth0").not());

    store
        .cmd()
        .arg("compare")
        .assert()
        .success()
        .stdout(predicate::str::contains("+ interfaces/ethernet/eth0/description uplink"));

    store
        .cmd()
        .arg("commit")
        .assert()
        .success()
        .stdout(predicate::str::contains("Committed 4 change(s)"));

    store
        .cmd()
        .args(["show", "--active"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ethernet eth0 {"))
        .stdout(predicate::str::contains("description uplink"));

    store
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No edit session"));
}

#[test]
fn commit_without_changes() {
    let store = TestStore::new();
    store
        .cmd()
        .arg("commit")
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes to commit"));
}

#[test]
fn discard_restores_active() {
    let store = TestStore::new();
    store.run(&["set", "system", "host-name", "r1"]);
    store.run(&["commit"]);
    store.run(&["set", "system", "host-name", "r2"]);
    store.run(&["delete", "system", "host-name"]);

    store
        .cmd()
        .arg("discard")
        .assert()
        .success()
        .stdout(predicate::str::contains("Changes discarded"));

    store
        .cmd()
        .args(["show", "system", "host-name"])
        .assert()
        .success()
        .stdout("r1\n");

    store
        .cmd()
        .arg("discard")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no edit session is open"));
}

#[test]
fn multi_values_append() {
    let store = TestStore::new();
    store.run(&["set", "system", "name-server", "10.0.0.1"]);
    store.run(&["set", "system", "name-server", "10.0.0.2"]);
    store
        .cmd()
        .args(["show", "system", "name-server"])
        .assert()
        .success()
        .stdout("10.0.0.1\n10.0.0.2\n");

    store.run(&["delete", "system", "name-server", "--value", "10.0.0.1"]);
    store
        .cmd()
        .args(["show", "system", "name-server"])
        .assert()
        .success()
        .stdout("10.0.0.2\n");
}

#[test]
fn explicit_value_with_spaces() {
    let store = TestStore::new();
    store.run(&["set", "banner", "--value", "hello world"]);
    store
        .cmd()
        .args(["show", "banner"])
        .assert()
        .success()
        .stdout("'hello world'\n");
}

// =============================================================================
// Structural commands
// =============================================================================

#[test]
fn rename_to_existing_fails() {
    let store = TestStore::new();
    store.run(&["set", "service", "http"]);
    store.run(&["set", "service", "webserver"]);

    store
        .cmd()
        .args(["rename", "service", "http", "to", "webserver"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Rename 'service/http' failed"))
        .stderr(predicate::str::contains("already exists"));

    store
        .cmd()
        .args(["show", "service"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http"));
}

#[test]
fn rename_copy_move() {
    let store = TestStore::new();
    store.run(&["set", "firewall", "rule", "10", "action", "accept"]);
    store.run(&["copy", "firewall", "rule", "10", "to", "firewall", "rule", "20"]);
    store.run(&["rename", "firewall", "rule", "20", "to", "30"]);
    store.run(&["set", "archive"]);
    store.run(&["move", "firewall", "rule", "10", "to", "archive"]);

    store
        .cmd()
        .args(["show", "--json", "archive", "10", "action"])
        .assert()
        .success()
        .stdout(predicate::str::contains("accept"));

    store
        .cmd()
        .args(["show", "firewall"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rule 30 {"))
        .stdout(predicate::str::contains("rule 10").not());
}

#[test]
fn rename_needs_single_name() {
    let store = TestStore::new();
    store.run(&["set", "a", "b"]);
    store
        .cmd()
        .args(["rename", "a", "b", "to", "c", "d"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("single new name"));
}

#[test]
fn deactivate_twice_fails() {
    let store = TestStore::new();
    store.run(&["set", "firewall", "rule", "10"]);
    store.run(&["deactivate", "firewall", "rule", "10"]);

    store
        .cmd()
        .args(["deactivate", "firewall", "rule", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already deactivated"));

    store
        .cmd()
        .args(["show", "--effective", "firewall"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10").not());

    store.run(&["activate", "firewall", "rule", "10"]);
    store
        .cmd()
        .args(["show", "--effective", "firewall"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rule 10"));
}

#[test]
fn comment_is_shown() {
    let store = TestStore::new();
    store.run(&["set", "system", "host-name", "r1"]);
    store.run(&["comment", "system", "--text", "core router"]);
    store
        .cmd()
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("/* core router */"));
}

#[test]
fn delete_missing_path_fails() {
    let store = TestStore::new();
    store
        .cmd()
        .args(["delete", "nothing", "here"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Delete 'nothing here' failed"));

    // A failed first edit does not open a session.
    store
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No edit session"));
}

#[test]
fn overly_deep_path_is_rejected() {
    let store = TestStore::new();
    let words: Vec<String> = (0..=cstore::core::path::MAX_DEPTH)
        .map(|i| format!("c{i}"))
        .collect();
    store
        .cmd()
        .arg("set")
        .args(&words)
        .assert()
        .failure()
        .stderr(predicate::str::contains("path too deep"));

    // The store stays loadable.
    store
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("No edit session"));
}

#[test]
fn show_missing_path_fails() {
    let store = TestStore::new();
    store
        .cmd()
        .args(["show", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

// =============================================================================
// Batch
// =============================================================================

#[test]
fn batch_set_and_delete() {
    let store = TestStore::new();
    let file = store.path().join("set.txt");
    std::fs::write(
        &file,
        "# interfaces\ninterfaces ethernet eth0 description 'to core'\n\nsystem host-name r1\n",
    )
    .unwrap();

    store
        .cmd()
        .args(["batch", "set"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied 2 line(s)"));

    store
        .cmd()
        .args(["show", "interfaces", "ethernet", "eth0", "description"])
        .assert()
        .success()
        .stdout("'to core'\n");

    let file = store.path().join("delete.txt");
    std::fs::write(&file, "system host-name\nmissing path\n").unwrap();
    store
        .cmd()
        .args(["batch", "delete"])
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Delete 'missing path' failed"))
        .stdout(predicate::str::contains("Applied 1 line(s)"))
        .stderr(predicate::str::contains("Error in delete"));

    // The good line was still applied.
    store
        .cmd()
        .args(["show", "system", "host-name"])
        .assert()
        .failure();
}

#[test]
fn batch_missing_file() {
    let store = TestStore::new();
    store
        .cmd()
        .args(["batch", "set", "/nonexistent/batch.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read batch file"));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn unknown_config_key_rejected() {
    let store = TestStore::new();
    std::fs::write(store.config(), "bogus = 1\n").unwrap();
    store
        .cmd()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn quiet_suppresses_messages() {
    let store = TestStore::new();
    store.run(&["set", "a"]);
    store
        .cmd()
        .args(["-q", "discard"])
        .assert()
        .success()
        .stdout("");
}
