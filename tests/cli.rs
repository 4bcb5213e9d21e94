use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

fn write_json(dir: &Path, name: &str, value: serde_json::Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();
    path
}

fn profiles(dir: &Path) -> PathBuf {
    write_json(
        dir,
        "profiles.json",
        json!([
            {
                "static": { "country": "Chile", "iso3": "CHL", "json_country": "Chile",
                            "region": "Americas", "subregion": "South America" },
                "ts": { "years": ["2001-01-01", "2000-01-01"],
                        "morphine": [2.0, 1.0], "codeine": [null, 0.5] }
            },
            {
                "static": { "country": "Peru", "iso3": "PER", "json_country": "Peru",
                            "region": "Americas", "subregion": "South America" },
                "ts": { "years": ["2000-01-01", "2001-01-01"],
                        "morphine": [0.1, 0.2], "codeine": [0.3, 0.4] }
            }
        ]),
    )
}

fn cognostics(dir: &Path) -> PathBuf {
    let row = |q: &str, drug: &str, country: &str, value: f64| {
        json!({ "q": q, "rank": 1, "drug": drug, "value": value, "L1": "mean",
                "region": "Americas", "country": country, "json_country": country })
    };
    write_json(
        dir,
        "cognostics.json",
        json!([
            [row("[0,1)", "morphine", "Chile", 0.9), row("[0,1)", "codeine", "Chile", 0.1)],
            [row("[0,1)", "morphine", "Peru", 0.4)]
        ]),
    )
}

fn incb() -> Command {
    Command::cargo_bin("incb").unwrap()
}

#[test]
fn cli_shows_help() {
    incb()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("incb"))
        .stdout(predicate::str::contains("scene"));
}

#[test]
fn reshape_prints_sorted_csv() {
    let dir = tempdir().unwrap();
    let input = profiles(dir.path());
    incb()
        .args(["reshape", "--input"])
        .arg(&input)
        .args(["--country", "Chile", "--drugs", "morphine"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "country,iso3,json_country,region,subregion,drug,year,value",
        ))
        .stdout(predicate::str::contains(
            "Chile,CHL,Chile,Americas,South America,morphine,2000,1.0",
        ))
        .stdout(predicate::str::contains("Peru").not());
}

#[test]
fn reshape_saves_json_by_extension() {
    let dir = tempdir().unwrap();
    let input = profiles(dir.path());
    let out = dir.path().join("flat.json");
    incb()
        .args(["reshape", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("Saved 7 rows"));
    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(v.as_array().unwrap().len(), 7);
}

#[test]
fn reshape_rejects_mismatched_arrays() {
    let dir = tempdir().unwrap();
    let input = write_json(
        dir.path(),
        "bad.json",
        json!([{
            "static": { "country": "Chile", "iso3": "CHL", "json_country": "Chile" },
            "ts": { "years": [2000, 2001], "morphine": [1.0] }
        }]),
    );
    incb()
        .args(["reshape", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Chile/morphine"));
}

#[test]
fn ranks_are_listed_per_bin() {
    let dir = tempdir().unwrap();
    let input = cognostics(dir.path());
    incb()
        .args(["ranks", "--input"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("mean\t[0,1)\t2\tmorphine\tChile\t0.9"))
        .stdout(predicate::str::contains("mean\t[0,1)\t0\tcodeine\tChile\t0.1"))
        .stdout(predicate::str::contains("mean\t[0,1)\t1\tmorphine\tPeru\t0.4"));
}

#[test]
fn scene_snapshot_of_the_map() {
    let dir = tempdir().unwrap();
    let input = profiles(dir.path());
    let out = dir.path().join("scene.json");
    incb()
        .args(["scene", "--chart", "map", "--drug", "morphine", "--year", "2001"])
        .arg("--profiles")
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();
    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let nodes = v["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 2);
    assert!(nodes.iter().all(|n| n["kind"] == "region"));
}

#[test]
fn scene_histogram_to_stdout() {
    let dir = tempdir().unwrap();
    let input = cognostics(dir.path());
    incb()
        .args(["scene", "--chart", "histogram", "--cognostic", "mean"])
        .arg("--cognostics")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"morphine_Peru\""))
        .stdout(predicate::str::contains("\"circle\""));
}

#[test]
fn histogram_axis_uses_bins_of_the_chosen_cognostic() {
    let dir = tempdir().unwrap();
    let row = |q: &str, cog: &str, drug: &str, country: &str, value: f64| {
        json!({ "q": q, "drug": drug, "value": value, "L1": cog,
                "region": "Americas", "country": country, "json_country": country })
    };
    let input = write_json(
        dir.path(),
        "two_cognostics.json",
        json!([
            [row("[0,1)", "mean", "morphine", "Chile", 0.5),
             row("[1,2)", "slope", "codeine", "Peru", 1.5)],
            [row("[2,3)", "mean", "morphine", "Peru", 2.5),
             row("[3,4)", "mean", "codeine", "Chile", 3.5)]
        ]),
    );
    let output = incb()
        .args(["scene", "--chart", "histogram", "--cognostic", "mean"])
        .arg("--cognostics")
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let nodes = v["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 3);
    let peru = nodes
        .iter()
        .find(|n| n["name"] == "morphine_Peru")
        .expect("morphine_Peru is drawn");
    // three mean bins: [2,3) is the middle slot
    assert_eq!(peru["attrs"]["y"], 200.0);
}

#[test]
fn scene_requires_chart_inputs() {
    incb()
        .args(["scene", "--chart", "country"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--profiles"));
}
