use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

/// Binary with the environment isolated from the developer's config.
fn tunelight(config_home: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tunelight").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path())
        .env_remove("TUNELIGHT_CONFIG")
        .env_remove("TUNELIGHT_HOSTNAME")
        .env_remove("TUNELIGHT_MIN_KELVIN")
        .env_remove("TUNELIGHT_MAX_KELVIN")
        .env_remove("TUNELIGHT_POLARITY")
        .env_remove("TUNELIGHT_PWM_CHIP")
        .env_remove("MQTT_HOST")
        .env_remove("MQTT_PORT");
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_mix_coolest() {
    let home = tempfile::tempdir().unwrap();
    let output = tunelight(&home)
        .args(["mix", "--kelvin", "6535"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["output"]["cool"], 255);
    assert_eq!(json["output"]["warm"], 0);
    assert_eq!(json["drive"]["polarity"], "active-low");
    assert_eq!(json["drive"]["cool"], 0);
    assert_eq!(json["drive"]["warm"], 255);
}

#[test]
fn test_mix_clamps_kelvin_and_honours_polarity() {
    let home = tempfile::tempdir().unwrap();
    let output = tunelight(&home)
        .args(["mix", "--kelvin", "1000", "--polarity", "active-high"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["state"]["kelvin"], 2000);
    assert_eq!(json["drive"]["cool"], 0);
    assert_eq!(json["drive"]["warm"], 255);
}

#[test]
fn test_mix_off_table() {
    let home = tempfile::tempdir().unwrap();
    tunelight(&home)
        .args(["mix", "--off", "--table"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CHANNEL"))
        .stdout(predicate::str::contains("cool"))
        .stdout(predicate::str::contains("warm"));
}

#[test]
fn test_discovery_for_hostname() {
    let home = tempfile::tempdir().unwrap();
    let output = tunelight(&home)
        .args(["discovery", "--hostname", "desk"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["topic"], "homeassistant/light/desk/config");
    assert_eq!(json["discovery"]["unique_id"], "desk");
    assert_eq!(
        json["discovery"]["command_topic"],
        "homeassistant/light/desk/set"
    );
    assert_eq!(json["discovery"]["schema"], "json");
}

#[test]
fn test_decode_off_command() {
    let home = tempfile::tempdir().unwrap();
    let output = tunelight(&home)
        .args(["decode", r#"{"state":"OFF"}"#])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(
        json["published"],
        serde_json::json!({"state": "OFF", "brightness": 255, "color_temp": 234})
    );
    assert_eq!(json["output"]["cool"], 0);
    assert_eq!(json["output"]["warm"], 0);
}

#[test]
fn test_decode_rejects_malformed_payload() {
    let home = tempfile::tempdir().unwrap();
    tunelight(&home)
        .args(["decode", "not json"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("\"error\": \"decode\""));
}

#[test]
fn test_invalid_range_is_a_config_error() {
    let home = tempfile::tempdir().unwrap();
    tunelight(&home)
        .args(["mix", "--min-kelvin", "7000"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("min_kelvin"));
}

#[test]
fn test_config_file_is_used_and_flags_win() {
    let home = tempfile::tempdir().unwrap();
    let path = home.path().join("light.json");
    fs::write(
        &path,
        r#"{"hostname":"from_file","temperature":{"min_kelvin":2700,"max_kelvin":6500}}"#,
    )
    .unwrap();

    let output = tunelight(&home)
        .args(["discovery", "--config"])
        .arg(&path)
        .output()
        .unwrap();
    assert_eq!(stdout_json(&output)["discovery"]["name"], "from_file");

    let output = tunelight(&home)
        .args(["discovery", "--hostname", "flag", "--config"])
        .arg(&path)
        .output()
        .unwrap();
    assert_eq!(stdout_json(&output)["discovery"]["name"], "flag");

    let output = tunelight(&home)
        .args(["decode", "{}", "--config"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    // Midpoint of the file's range.
    assert_eq!(stdout_json(&output)["state"]["kelvin"], 4600);
}

#[test]
#[cfg(target_os = "linux")]
fn test_default_config_location() {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join("tunelight");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.json"), r#"{"hostname":"kitchen"}"#).unwrap();

    let output = tunelight(&home).arg("discovery").output().unwrap();
    assert_eq!(stdout_json(&output)["discovery"]["name"], "kitchen");
}
