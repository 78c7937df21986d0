use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn sample_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("samples")
        .join(name)
}

/// The binary with an empty config home, so no user file leaks into a test
fn iproute(home: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("iproute");
    cmd.env("XDG_CONFIG_HOME", home.path()).env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("iproute.toml");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn show_prints_normalized_table() {
    let home = TempDir::new().unwrap();
    iproute(&home)
        .arg("show")
        .arg("--file")
        .arg(sample_path("ipv4_main.txt"))
        .assert()
        .success()
        .stdout(
            predicate::str::starts_with("default via 216.244.91.33 dev eth0\n")
                .and(predicate::str::contains(
                    "10.65.1.0/25 dev tun0 proto kernel scope link src 10.65.1.6\n",
                )),
        );
}

#[test]
fn show_reads_stdin() {
    let home = TempDir::new().unwrap();
    iproute(&home)
        .args(["show", "--file", "-", "--format", "treeviz"])
        .write_stdin("10.0.0.0/8 dev eth0\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("└─ route: 10.0.0.0/8"));
}

#[test]
fn show_as_json() {
    let home = TempDir::new().unwrap();
    let output = iproute(&home)
        .arg("show")
        .arg("--file")
        .arg(sample_path("typed_routes.txt"))
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["node_type"], "table");
    assert_eq!(value["attributes"]["routes"], "6");
    assert_eq!(value["children"][0]["children"][0]["attributes"]["type"], "unreachable");
}

#[test]
fn get_by_default_alias() {
    let home = TempDir::new().unwrap();
    iproute(&home)
        .arg("get")
        .arg("default")
        .arg("--file")
        .arg(sample_path("ipv4_main.txt"))
        .assert()
        .success()
        .stdout("default via 216.244.91.33 dev eth0\n");
}

#[test]
fn get_single_field() {
    let home = TempDir::new().unwrap();
    iproute(&home)
        .args(["get", "10.64.0.0/16", "--field", "metric", "--file"])
        .arg(sample_path("ipv4_main.txt"))
        .assert()
        .success()
        .stdout("101\n");
}

#[test]
fn get_ambiguous_address_fails() {
    let home = TempDir::new().unwrap();
    iproute(&home)
        .args(["get", "10.65.1.0", "--file"])
        .arg(sample_path("ipv4_main.txt"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "address 10.65.1.0 matches several routes: 10.65.1.0/25, 10.65.1.0/24",
        ));
}

#[test]
fn get_unknown_field_fails() {
    let home = TempDir::new().unwrap();
    iproute(&home)
        .args(["get", "default", "--field", "gateway", "--file"])
        .arg(sample_path("ipv4_main.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("route has no field or child named `gateway`"));
}

#[test]
fn parse_single_line_as_treeviz() {
    let home = TempDir::new().unwrap();
    iproute(&home)
        .args([
            "parse",
            "10.0.0.0/24 via 10.0.0.1 dev eth0 metric 5",
            "--format",
            "treeviz",
        ])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("└─ route: 10.0.0.0/24")
                .and(predicate::str::contains("├─ info: via 10.0.0.1 dev eth0"))
                .and(predicate::str::contains("└─ attribute: metric = 5")),
        );
}

#[test]
fn parse_error_exits_with_status_one() {
    let home = TempDir::new().unwrap();
    iproute(&home)
        .args(["parse", "10.0.0.0/24 dev"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "info: expected interface name after `dev`, found end of line",
        ));
}

#[test]
fn duplicates_policy_from_config() {
    let home = TempDir::new().unwrap();
    let config = write_config(home.path(), "[table]\nduplicates = \"reject\"\n");

    iproute(&home)
        .arg("show")
        .arg("--config")
        .arg(&config)
        .arg("--file")
        .arg(sample_path("duplicates.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "destination 0.0.0.0/0 is already defined on line 1",
        ));

    // Without the override the later default wins
    iproute(&home)
        .args(["get", "default", "--field", "dev", "--file"])
        .arg(sample_path("duplicates.txt"))
        .assert()
        .success()
        .stdout("wlan0\n");
}

#[test]
fn output_format_from_config() {
    let home = TempDir::new().unwrap();
    let config = write_config(home.path(), "[output]\nformat = \"yaml\"\n");

    iproute(&home)
        .arg("--config")
        .arg(&config)
        .args(["parse", "default via 10.0.0.1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("node_type: route")
                .and(predicate::str::contains("node_type: destination")),
        );
}

#[test]
fn user_config_file_is_picked_up() {
    let home = TempDir::new().unwrap();
    fs::create_dir_all(home.path().join("iproute")).unwrap();
    fs::write(
        home.path().join("iproute").join("config.toml"),
        "[table]\nfamily = \"inet6\"\n",
    )
    .unwrap();

    iproute(&home)
        .args(["parse", "default via fe80::1 dev eth0", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"label\": \"::/0\""));
}

#[cfg(unix)]
#[test]
fn show_runs_configured_command() {
    let home = TempDir::new().unwrap();
    let config = write_config(
        home.path(),
        "[command]\nprogram = \"echo\"\nargs = [\"10.0.0.0/8\", \"dev\", \"eth0\", \"proto\", \"static\"]\n",
    );

    iproute(&home)
        .arg("--config")
        .arg(&config)
        .arg("show")
        .assert()
        .success()
        .stdout("10.0.0.0/8 dev eth0 proto static\n");
}

#[cfg(unix)]
#[test]
fn failing_command_reports_stderr() {
    let home = TempDir::new().unwrap();
    let config = write_config(
        home.path(),
        "[command]\nprogram = \"sh\"\nargs = [\"-c\", \"echo 'Cannot find device' >&2; exit 2\"]\n",
    );

    iproute(&home)
        .arg("--config")
        .arg(&config)
        .arg("show")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("exited with status 2: Cannot find device"));
}

#[test]
fn missing_file_is_reported() {
    let home = TempDir::new().unwrap();
    iproute(&home)
        .args(["show", "--file", "/nonexistent/routes.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("reading /nonexistent/routes.txt"));
}

#[test]
fn unknown_format_is_rejected_by_clap() {
    let home = TempDir::new().unwrap();
    iproute(&home)
        .args(["parse", "default", "--format", "xml"])
        .assert()
        .failure();
}
