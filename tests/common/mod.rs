//! Shared test helpers for integration tests

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use tempfile::TempDir;

pub const TEST_USER: &str = "ana";

/// A labtrack command acting as the test user
pub fn labtrack() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("labtrack"));
    cmd.env("LABTRACK_USER", TEST_USER)
        .env_remove("LABTRACK_AUTHOR")
        .env_remove("LABTRACK_LOG")
        .env("NO_COLOR", "1");
    cmd
}

/// labtrack command run inside the project
pub fn in_project(tmp: &TempDir) -> Command {
    let mut cmd = labtrack();
    cmd.current_dir(tmp.path());
    cmd
}

/// Create a test project in a temp directory
pub fn setup_test_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    labtrack().current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

/// Run a command with `--format id` and return the printed ID
pub fn created_id(tmp: &TempDir, args: &[&str]) -> String {
    let output = in_project(tmp)
        .args(args)
        .args(["--format", "id"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "command {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Create a wear-part inventory item
pub fn create_wear_part(tmp: &TempDir, name: &str, unit: &str, lifespan: &str, quantity: &str) -> String {
    created_id(
        tmp,
        &[
            "inv", "new", "--name", name, "--kind", "wear-part", "--unit", unit, "--lifespan", lifespan,
            "--quantity", quantity, "--min", "1", "--cost", "20",
        ],
    )
}

pub fn create_machine(tmp: &TempDir, name: &str) -> String {
    created_id(tmp, &["mach", "new", "--name", name, "--model", "X-1"])
}

/// Install `item` on `machine`, taking it from stock
pub fn install(tmp: &TempDir, machine: &str, item: &str) -> String {
    created_id(tmp, &["mach", "install", machine, item])
}

/// Machine with one 100-hour seal installed; returns (machine, item, part)
pub fn machine_with_seal(tmp: &TempDir) -> (String, String, String) {
    let item = create_wear_part(tmp, "Rotor seal", "hours", "100", "3");
    let machine = create_machine(tmp, "Centrifuge");
    let part = install(tmp, &machine, &item);
    (machine, item, part)
}
