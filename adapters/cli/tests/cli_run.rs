use std::process::Command;

#[test]
fn cli_runs_bundled_scenario() {
    let output = Command::new(env!("CARGO_BIN_EXE_devour"))
        .args(["--ticks", "120", "--dt-ms", "50", "--seed", "7"])
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to launch devour binary");

    assert!(output.status.success(), "devour exited with {:?}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("120 ticks:"), "unexpected output: {stdout}");
}

#[test]
fn cli_rejects_missing_scenario_file() {
    let output = Command::new(env!("CARGO_BIN_EXE_devour"))
        .args(["--config", "/nonexistent/devour.toml", "--ticks", "1"])
        .output()
        .expect("failed to launch devour binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read scenario"), "unexpected stderr: {stderr}");
}

#[test]
fn cli_rejects_zero_frame_length() {
    let output = Command::new(env!("CARGO_BIN_EXE_devour"))
        .args(["--dt-ms", "0", "--ticks", "1"])
        .output()
        .expect("failed to launch devour binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--dt-ms must be greater than zero"), "unexpected stderr: {stderr}");
}
