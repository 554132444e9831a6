use std::fs;

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains as str_contains;
use tempfile::TempDir;

#[allow(deprecated)]
fn sectio() -> Command {
    let mut cmd = Command::cargo_bin("sectio").expect("sectio binary");
    // Keep the user's ~/.sectio/config.toml out of the way
    cmd.env("HOME", env!("CARGO_TARGET_TMPDIR"));
    cmd.env_remove("RUST_LOG");
    cmd
}

const UNBALANCED: &str = r#"{
    "sections": [
        { "nom": "A", "type": "primaire", "unite_oeuvre": "Heure", "quantite": 10 },
        { "nom": "B", "type": "primaire", "unite_oeuvre": "Heure", "quantite": 10 }
    ],
    "charges_indirectes": [{ "nature": "Loyer", "montant": 1000, "type": "Fix" }],
    "repartition_primaire": [{ "charge_nature": "Loyer", "repartition": [
        { "section_nom": "A", "pourcentage": 60 },
        { "section_nom": "B", "pourcentage": 39 }
    ] }]
}"#;

#[test]
fn demo_prints_tutorial_unit_costs() {
    sectio()
        .args(["demo", "--scenario", "tutorial"])
        .assert()
        .success()
        .stdout(str_contains("TUTORIAL"))
        .stdout(str_contains("48.00"))
        .stdout(str_contains("8466.67"))
        .stdout(str_contains("14533.33"));
}

#[test]
fn demo_json_is_parseable() {
    let assert = sectio().args(["demo", "--format", "json"]).assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON on stdout");

    assert_eq!(json["couts_unitaires_sections"][0]["nom"], "Atelier 1");
    assert_eq!(json["couts_unitaires_produits"].as_array().map(Vec::len), Some(2));
}

#[test]
fn init_then_calc_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("atelier.sct");

    sectio()
        .arg("init")
        .arg(&path)
        .assert()
        .success()
        .stdout(str_contains("written to"));
    assert!(path.exists());
    assert!(!dir.path().join("atelier.sct.lock").exists());

    sectio()
        .arg("calc")
        .arg(&path)
        .assert()
        .success()
        .stdout(str_contains("ATELIER"))
        .stdout(str_contains("209.84"))
        .stdout(str_contains("215.08"));
}

#[test]
fn init_refuses_to_overwrite() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("existing.sct");
    fs::write(&path, "{}").unwrap();

    sectio()
        .arg("init")
        .arg(&path)
        .assert()
        .failure()
        .stderr(str_contains("already exists"));

    sectio().arg("init").arg(&path).arg("--force").assert().success();
}

#[test]
fn validate_reports_unbalanced_key() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("unbalanced.json");
    fs::write(&path, UNBALANCED).unwrap();

    sectio()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stdout(str_contains("primary key of charge \"Loyer\""))
        .stdout(str_contains("99.00%"))
        .stdout(str_contains("INVALID"));
}

#[test]
fn calc_refuses_invalid_project() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("unbalanced.json");
    fs::write(&path, UNBALANCED).unwrap();

    sectio()
        .arg("calc")
        .arg(&path)
        .assert()
        .failure()
        .stderr(str_contains("Loyer"))
        .stdout(str_contains("Product unit costs").not());
}

#[test]
fn tolerance_flag_accepts_small_gap() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("unbalanced.json");
    fs::write(&path, UNBALANCED).unwrap();

    sectio()
        .args(["--tolerance", "1", "validate"])
        .arg(&path)
        .assert()
        .success()
        .stdout(str_contains("VALID"));
}

#[test]
fn tolerance_flag_out_of_range_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("unbalanced.json");
    fs::write(&path, UNBALANCED).unwrap();

    sectio()
        .args(["--tolerance", "1000000000", "calc"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(str_contains("key tolerance must be between 0 and 1 points"))
        .stdout(str_contains("Product unit costs").not());
}

#[test]
fn huge_decimals_in_project_fail_cleanly() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("decimals.sct");
    let mut project: serde_json::Value = serde_json::from_str(UNBALANCED).unwrap();
    project["repartition_primaire"][0]["repartition"][1]["pourcentage"] = 40.into();
    project["parametres"] = serde_json::json!({ "decimales": 70000 });
    fs::write(&path, project.to_string()).unwrap();

    sectio()
        .arg("calc")
        .arg(&path)
        .assert()
        .failure()
        .stderr(str_contains("display decimals must be at most 10"))
        .stderr(str_contains("panicked").not());
}

#[test]
fn calc_missing_file_fails() {
    sectio()
        .args(["calc", "/nonexistent/project.sct"])
        .assert()
        .failure()
        .stderr(str_contains("Failed to load project"));
}
