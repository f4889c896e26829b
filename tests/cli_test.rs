//! CLI smoke tests; none of these reach a real server

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Binary isolated from the user's config, session and environment
fn pims(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pims-dashboard").unwrap();
    cmd.current_dir(home.path())
        .env("PIMS_DATA_DIR", home.path().join("data"))
        .env("PIMS_LOG_DIR", home.path().join("logs"))
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("PIMS_API_URL", "http://127.0.0.1:9")
        .env("PIMS_API_TIMEOUT_SECS", "2")
        .env("LOG_OUTPUT", "console")
        .env("NO_COLOR", "1")
        .env_remove("PIMS_TOKEN")
        .env_remove("PIMS_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    pims(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("last-updated"));
}

#[test]
fn test_report_requires_login() {
    let home = TempDir::new().unwrap();
    pims(&home)
        .arg("report")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_json_errors_go_to_stdout() {
    let home = TempDir::new().unwrap();
    pims(&home)
        .args(["last-updated", "--json"])
        .assert()
        .failure()
        .stdout(predicate::str::contains(r#""error""#))
        .stdout(predicate::str::contains("Not logged in"));
}

#[test]
fn test_login_validation_happens_locally() {
    let home = TempDir::new().unwrap();
    pims(&home)
        .args(["login", "--username", "   ", "--password", "secret"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Username is required"));

    pims(&home)
        .args(["login", "--username", "jdoe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Password is required"));
}

#[test]
fn test_token_flag_seeds_session() {
    let home = TempDir::new().unwrap();
    pims(&home)
        .args(["--token", "tok-1", "whoami"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no cached profile"));

    // Nothing was persisted
    assert!(!home.path().join("data").join("session.json").exists());
}

#[test]
fn test_account_validation_happens_locally() {
    let home = TempDir::new().unwrap();
    pims(&home)
        .env("PIMS_TOKEN", "tok-1")
        .args(["account", "--username", "jdoe", "--new-password", "abcdef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Current password is required to set a new password",
        ));
}

#[test]
fn test_unreachable_server_reports_fallback() {
    let home = TempDir::new().unwrap();
    pims(&home)
        .args(["--token", "tok-1", "report"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to fetch analytics"));
}

#[test]
fn test_logout_without_session() {
    let home = TempDir::new().unwrap();
    pims(&home)
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}

#[test]
fn test_invalid_config_env_fails() {
    let home = TempDir::new().unwrap();
    pims(&home)
        .env("PIMS_REFRESH_SECS", "often")
        .arg("logout")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_invalid_timestamp_format_is_rejected_at_startup() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join("pims-dashboard.toml"),
        "[output]\ntimestamp_format = \"%Y-%Q\"\n",
    )
    .unwrap();

    pims(&home)
        .arg("logout")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timestamp format"));
}
