//! Integration tests for the rolo scripting commands

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command as AssertCommand;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Isolated config and database in a temp dir
struct TestEnv {
    _temp_dir: TempDir,
    config_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        Self::with_config("")
    }

    /// `extra` is appended to a config that already points at the temp db
    fn with_config(extra: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let db_path = temp_dir.path().join("contacts.db");
        let content = format!(
            "db_path = {:?}\n{}",
            db_path.to_str().unwrap(),
            extra
        );
        fs::write(&config_path, content).unwrap();

        Self {
            _temp_dir: temp_dir,
            config_path,
        }
    }

    /// Run rolo with this test env's config
    fn rolo(&self) -> AssertCommand {
        let mut cmd = rolo_cmd();
        cmd.env_remove("ROLO_LOG").env_remove("RUST_LOG");
        cmd.args(["--config", self.config_path.to_str().unwrap()]);
        cmd
    }

    /// Create a contact and return its id
    fn create(&self, first: &str, last: &str) -> String {
        let output = self.rolo().arg("new").output().unwrap();
        assert!(output.status.success());
        let href = String::from_utf8(output.stdout).unwrap();
        let id = href
            .trim()
            .strip_prefix("/contacts/")
            .and_then(|rest| rest.strip_suffix("/edit"))
            .unwrap()
            .to_string();

        if !first.is_empty() || !last.is_empty() {
            self.rolo()
                .args(["edit", &id, "--first", first, "--last", last])
                .assert()
                .success();
        }
        id
    }

    fn list(&self, args: &[&str]) -> String {
        let output = self.rolo().arg("list").args(args).output().unwrap();
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap()
    }
}

/// Get the rolo binary command
fn rolo_cmd() -> AssertCommand {
    AssertCommand::cargo_bin("rolo").unwrap()
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_empty_store_shows_marker() {
    let env = TestEnv::new();
    env.rolo()
        .arg("list")
        .assert()
        .success()
        .stdout("No contacts\n");
}

#[test]
fn test_new_prints_edit_location() {
    let env = TestEnv::new();
    env.rolo()
        .arg("new")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"^/contacts/[0-9a-f]{8}/edit\n$").unwrap());
}

#[test]
fn test_new_contact_is_listed_without_name() {
    let env = TestEnv::new();
    let id = env.create("", "");
    assert_eq!(env.list(&[]), format!("{}\tNo Name\n", id));
}

#[test]
fn test_filter_matches_names() {
    let env = TestEnv::new();
    let alice = env.create("Alice", "Arnold");
    let alina = env.create("Alina", "Baker");
    env.create("Bob", "Cole");

    let filtered = env.list(&["ali"]);
    assert_eq!(
        filtered,
        format!("{}\tAlice Arnold\n{}\tAlina Baker\n", alice, alina)
    );

    // full-name matches span first and last
    assert!(env.list(&["bob cole"]).contains("Bob Cole"));
    assert_eq!(env.list(&["zz"]), "No contacts\n");
    // a blank filter lists everything
    assert_eq!(env.list(&["  "]).lines().count(), 3);
}

#[test]
fn test_list_json() {
    let env = TestEnv::new();
    let id = env.create("Émile", "Zola");
    let stdout = env.list(&["emile", "--json"]);
    let contacts: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(contacts[0]["id"], id.as_str());
    assert_eq!(contacts[0]["first"], "Émile");
    assert_eq!(contacts[0]["favorite"], false);
}

#[test]
fn test_edit_and_show() {
    let env = TestEnv::new();
    let id = env.create("Ada", "Lovelace");

    env.rolo()
        .args(["edit", &id, "--twitter", "@ada", "--favorite", "true"])
        .assert()
        .success()
        .stdout(format!("/contacts/{}\n", id));

    env.rolo()
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("name:     Ada Lovelace"))
        .stdout(predicate::str::contains("twitter:  @ada"))
        .stdout(predicate::str::contains("favorite: ★"));

    assert_eq!(env.list(&[]), format!("{}\tAda Lovelace ★\n", id));
}

#[test]
fn test_delete() {
    let env = TestEnv::new();
    let id = env.create("Tom", "Thumb");

    env.rolo()
        .args(["delete", &id])
        .assert()
        .success()
        .stdout("/\n");
    assert_eq!(env.list(&[]), "No contacts\n");

    env.rolo()
        .args(["delete", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no contact with id"));
}

#[test]
fn test_show_unknown_contact_fails() {
    let env = TestEnv::new();
    env.rolo()
        .args(["show", "deadbeef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no contact with id deadbeef"));
}

#[test]
fn test_custom_labels() {
    let env = TestEnv::with_config("[ui.labels]\nno_name = \"(unnamed)\"\nempty = \"nobody\"\n");
    env.rolo().arg("list").assert().success().stdout("nobody\n");
    let id = env.create("", "");
    assert_eq!(env.list(&[]), format!("{}\t(unnamed)\n", id));
}

#[test]
fn test_missing_explicit_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    rolo_cmd()
        .args([
            "--config",
            temp_dir.path().join("nope.toml").to_str().unwrap(),
            "list",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn test_key_binding_collision_fails() {
    let env = TestEnv::with_config("[keys.list]\nopen = \"n\"\n");
    env.rolo()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("key binding collision"));
}

#[test]
fn test_db_flag_overrides_config() {
    let env = TestEnv::new();
    let other = TempDir::new().unwrap();
    let other_db = other.path().join("other.db");

    env.rolo()
        .args(["--db", other_db.to_str().unwrap(), "new"])
        .assert()
        .success();
    assert_eq!(env.list(&[]), "No contacts\n");
    assert!(other_db.exists());
}
