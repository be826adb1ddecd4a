mod common;

use common::TestProject;
use predicates::prelude::*;

const PUBLIC_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIBootlooseTestKey user@host\n";

#[test]
fn test_key_add_get_remove() {
    let project = TestProject::new();
    let key_file = project.write_file("node.pub", PUBLIC_KEY);
    let store = project.key_store();
    let store = store.to_str().unwrap();

    project
        .command()
        .args(["--key-store", store, "key", "add", "node-key"])
        .arg(&key_file)
        .assert()
        .success();

    project
        .command()
        .args(["--key-store", store, "key", "get", "node-key"])
        .assert()
        .success()
        .stdout(PUBLIC_KEY);

    project
        .command()
        .args(["--key-store", store, "key", "remove", "node-key"])
        .assert()
        .success();

    project
        .command()
        .args(["--key-store", store, "key", "get", "node-key"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("node-key"));
}

#[test]
fn test_key_add_conflict() {
    let project = TestProject::new();
    let key_file = project.write_file("node.pub", PUBLIC_KEY);
    let store = project.key_store();

    project
        .command()
        .env("BOOTLOOSE_KEY_STORE", &store)
        .args(["key", "add", "dup"])
        .arg(&key_file)
        .assert()
        .success();

    project
        .command()
        .env("BOOTLOOSE_KEY_STORE", &store)
        .args(["key", "add", "dup"])
        .arg(&key_file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("既に存在します"));
}

#[test]
fn test_key_add_missing_file() {
    let project = TestProject::new();
    let store = project.key_store();

    project
        .command()
        .args(["--key-store", store.to_str().unwrap(), "key", "add", "ghost"])
        .arg(project.path().join("missing.pub"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.pub"));
}
