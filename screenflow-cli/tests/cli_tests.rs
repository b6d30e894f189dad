use std::process::Command;

fn run_screenflow(args: &[&str]) -> Result<String, String> {
    let output = Command::new(env!("CARGO_BIN_EXE_screenflow"))
        .args(args)
        .output()
        .map_err(|e| format!("Failed to run screenflow: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("Command failed: {}", stderr));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn config_args<'a>(command: &'a str, path: &'a str) -> Vec<&'a str> {
    vec!["--log-level", "error", "config", command, "--path", path]
}

#[test]
fn test_help_lists_commands() {
    let help = run_screenflow(&["--help"]).unwrap();
    assert!(help.contains("demo"));
    assert!(help.contains("config"));
}

#[test]
fn test_demo_succeeds() {
    let output = run_screenflow(&["--log-level", "error", "demo", "--timeout", "3"]).unwrap();
    assert!(output.contains("process_started"));
    assert!(output.contains("COOKIES"));
    assert!(output.contains("Outcome:      success"));
    assert!(!output.contains("correct-horse"));
}

#[test]
fn test_demo_json_with_wrong_password() {
    let output = run_screenflow(&[
        "--log-level",
        "error",
        "demo",
        "--fail-password",
        "--json",
        "--timeout",
        "3",
    ])
    .unwrap();
    let report: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(report["outcome"], "failure");
    assert_eq!(report["final_state"], "login_failed");
    let events = report["events"].as_array().unwrap();
    assert_eq!(events.first().unwrap()["event"]["event"], "process_started");
    assert_eq!(events.last().unwrap()["event"]["event"], "process_failed");
    assert!(!output.contains("wrong-password"));
}

#[test]
fn test_demo_rejects_out_of_range_timeout() {
    let result = run_screenflow(&[
        "--log-level",
        "error",
        "demo",
        "--timeout",
        "18446744073709551615",
    ]);
    let error = result.unwrap_err();
    assert!(error.contains("detection_timeout_seconds cannot exceed 3600"));
}

#[test]
fn test_config_init_show_validate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let path = path.to_str().unwrap();

    run_screenflow(&config_args("init", path)).unwrap();
    assert!(run_screenflow(&config_args("init", path)).is_err());

    let mut show = config_args("show", path);
    show.push("--json");
    let report: serde_json::Value = serde_json::from_str(&run_screenflow(&show).unwrap()).unwrap();
    assert_eq!(report["exists"], true);
    assert_eq!(report["config"]["detection_timeout_seconds"], 10);

    let output = run_screenflow(&config_args("validate", path)).unwrap();
    assert!(output.contains("is valid"));
}

#[test]
fn test_config_validate_rejects_bad_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "detection_timeout_seconds = 0\npoll_interval_ms = 1\n").unwrap();

    let result = run_screenflow(&config_args("validate", path.to_str().unwrap()));
    assert!(result.is_err());
}
