#![cfg(all(target_os = "linux", feature = "cli"))]

use std::process::Command;

#[test]
fn version_reports_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_hciport"))
        .arg("version")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout should be utf-8");
    assert_eq!(stdout.trim(), format!("hciport {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn extended_version_lists_provenance() {
    let output = Command::new(env!("CARGO_BIN_EXE_hciport"))
        .args(["version", "--extended"])
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout should be utf-8");
    assert!(stdout.contains("name: hciport"));
    assert!(stdout.contains("target_os: linux"));
}

#[test]
fn bad_flag_exits_with_usage_code() {
    let output = Command::new(env!("CARGO_BIN_EXE_hciport"))
        .arg("--no-such-flag")
        .output()
        .expect("binary should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn unwritable_log_file_fails_before_serving() {
    let output = Command::new(env!("CARGO_BIN_EXE_hciport"))
        .args(["--log-file", "/nonexistent-dir/hciport.log", "version"])
        .output()
        .expect("binary should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("open log file"), "stderr: {stderr}");
}

#[test]
fn devices_either_lists_or_reports_failure() {
    let output = Command::new(env!("CARGO_BIN_EXE_hciport"))
        .args(["devices", "--format", "json"])
        .output()
        .expect("devices should run");

    match output.status.code() {
        Some(0) => {
            let listed: serde_json::Value =
                serde_json::from_slice(&output.stdout).expect("stdout should be json");
            assert!(listed.is_array());
        }
        Some(1) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            assert!(stderr.contains("list devices"), "stderr: {stderr}");
        }
        other => panic!("unexpected exit {other:?}"),
    }
}
