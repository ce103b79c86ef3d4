mod server;

use assert_cmd::cargo;
use predicates::prelude::*;
use server::get_test_server_url;
use tempfile::TempDir;

fn webpulse(dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cargo::cargo_bin_cmd!("webpulse");
    // Keep config discovery away from the developer's own files
    cmd.current_dir(dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .env("HOME", dir.path())
        .env_remove("PAGESPEED_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    let expected_pattern = if cfg!(windows) {
        "Usage: webpulse.exe [OPTIONS]"
    } else {
        "Usage: webpulse [OPTIONS]"
    };

    webpulse(&dir)
        .arg("--help")
        .assert()
        .success()
        .stderr(predicate::str::is_empty())
        .stdout(predicate::str::contains(expected_pattern))
        .stdout(predicate::str::contains("--serve"))
        .stdout(predicate::str::contains("--pagespeed-key"));
}

#[test]
fn test_cli_requires_url_without_serve() {
    let dir = TempDir::new().unwrap();

    webpulse(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("<URL>"));
}

#[test]
fn test_cli_rejects_invalid_url() {
    let dir = TempDir::new().unwrap();

    webpulse(&dir)
        .args(["-o", "json", "http://"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid URL"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_json_output_and_save() {
    let base_url = get_test_server_url().await;
    let dir = TempDir::new().unwrap();
    let report = dir.path().join("report.json");

    let assert = webpulse(&dir)
        .args(["-o", "json", "--save"])
        .arg(&report)
        .arg(format!("{}/messy", base_url))
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let json_end = stdout.rfind('}').expect("JSON output") + 1;
    let printed: serde_json::Value = serde_json::from_str(&stdout[..json_end]).unwrap();
    assert_eq!(printed["website"]["httpStatusCode"], 200);
    assert_eq!(printed["seo"]["language"], "fr");
    assert!(stdout.contains("Report saved to:"));

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(saved["seo"]["indexable"], false);
    assert_eq!(saved["website"]["url"], printed["website"]["url"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cli_text_report() {
    let base_url = get_test_server_url().await;
    let dir = TempDir::new().unwrap();

    webpulse(&dir)
        .arg(format!("{}/not-found", base_url))
        .assert()
        .success()
        .stdout(predicate::str::contains("Health Report"))
        .stdout(predicate::str::contains("DEGRADED"))
        .stdout(predicate::str::contains("404"));
}

#[test]
fn test_cli_reads_config_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("custom.toml");
    std::fs::write(&config, "output = \"json\"\ndeadline = 1\n").unwrap();

    // An invalid URL fails before any config-driven probing happens
    webpulse(&dir)
        .arg("--config")
        .arg(&config)
        .arg("http://")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid URL"));

    webpulse(&dir)
        .args(["--config", "missing.toml", "example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.toml"));
}
