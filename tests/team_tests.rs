//! Team roster and role-based permission tests

mod common;

use common::{in_project, labtrack, machine_with_seal, setup_test_project};
use predicates::prelude::*;
use tempfile::TempDir;

fn project_with_roster() -> TempDir {
    let tmp = TempDir::new().unwrap();
    labtrack()
        .current_dir(tmp.path())
        .args(["init", "--team"])
        .assert()
        .success();
    tmp
}

fn as_admin(tmp: &TempDir) -> assert_cmd::Command {
    let mut cmd = in_project(tmp);
    cmd.args(["--user", "admin"]);
    cmd
}

#[test]
fn test_without_roster_everything_is_allowed() {
    let tmp = setup_test_project();
    in_project(&tmp)
        .args(["team", "whoami"])
        .assert()
        .success()
        .stdout(predicate::str::contains("every action is allowed"));
    machine_with_seal(&tmp);
}

#[test]
fn test_unknown_user_is_denied() {
    let tmp = project_with_roster();
    in_project(&tmp)
        .args(["mach", "new", "--name", "Centrifuge"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ana is not allowed to manage machines"));
}

#[test]
fn test_admin_adds_operator_with_limited_rights() {
    let tmp = project_with_roster();
    as_admin(&tmp)
        .args(["team", "add", "--name", "Ana Lima", "--username", "ana", "--roles", "operator"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added Ana Lima (ana) as operator"));

    // Setup done by the admin
    as_admin(&tmp)
        .args([
            "inv", "new", "--name", "Seal", "--kind", "wear-part", "--unit", "hours", "--lifespan", "100",
            "--quantity", "2",
        ])
        .assert()
        .success();
    as_admin(&tmp)
        .args(["mach", "new", "--name", "Centrifuge"])
        .assert()
        .success();
    as_admin(&tmp)
        .args(["mach", "install", "MACH@1", "INV@1"])
        .assert()
        .success();

    // The operator may record usage but not perform maintenance
    in_project(&tmp)
        .args(["usage", "record", "MACH@1", "INV@1", "10", "--unit", "hours"])
        .assert()
        .success();
    in_project(&tmp)
        .args(["maint", "reset", "MACH@1", "INV@1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not allowed to perform maintenance"));
}

#[test]
fn test_team_list_and_whoami() {
    let tmp = project_with_roster();
    as_admin(&tmp)
        .args(["team", "add", "--name", "Ben Ortiz", "--username", "ben", "--roles", "technician,manager"])
        .assert()
        .success();

    in_project(&tmp)
        .args(["team", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Lab Admin"))
        .stdout(predicate::str::contains("technician, manager"));

    in_project(&tmp)
        .args(["--user", "ben", "team", "whoami"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ben Ortiz"))
        .stdout(predicate::str::contains("perform maintenance"));
}

#[test]
fn test_team_add_duplicate_fails() {
    let tmp = project_with_roster();
    as_admin(&tmp)
        .args(["team", "add", "--name", "Other Admin", "--username", "admin", "--roles", "admin"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_non_admin_cannot_edit_team() {
    let tmp = project_with_roster();
    as_admin(&tmp)
        .args(["team", "add", "--name", "Ana Lima", "--username", "ana", "--roles", "manager"])
        .assert()
        .success();

    in_project(&tmp)
        .args(["team", "remove", "admin", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not allowed to manage the team"));
}
