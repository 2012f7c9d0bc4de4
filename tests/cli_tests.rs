mod common;

use common::{run_clipcoach, TestEnv};

#[test]
fn clipcoach_help_shows_usage() {
    let output = run_clipcoach(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        output.status.success(),
        "--help should succeed\nstdout:\n{}\nstderr:\n{}",
        stdout,
        stderr
    );
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("Commands:"));
    for command in ["upload", "gallery", "feedback", "chat", "tui", "doctor"] {
        assert!(stdout.contains(command), "help should list {}", command);
    }
}

#[test]
fn clipcoach_version_shows_version() {
    let output = run_clipcoach(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("clipcoach "));
}

#[test]
fn completions_bash_outputs_script() {
    let output = run_clipcoach(&["completions", "bash"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        output.status.success(),
        "completions bash should succeed\nstdout:\n{}\nstderr:\n{}",
        stdout,
        stderr
    );
    assert!(
        stdout.contains("clipcoach"),
        "expected completion output to reference command name\nstdout:\n{}",
        stdout
    );
}

#[test]
fn config_show_reports_server_override() {
    let output = run_clipcoach(&["config", "show"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        output.status.success(),
        "config show should succeed\nstdout:\n{}\nstderr:\n{}",
        stdout,
        stderr
    );
    assert!(stdout.contains("[server]"));
    assert!(stdout.contains("[gallery]"));
    assert!(stdout.contains("debounce_scope = \"per_video\""));
    assert!(stdout.contains(common::UNREACHABLE_SERVER));
}

#[test]
fn config_init_refuses_to_overwrite_without_force() {
    let env = TestEnv::new();

    let first = env.run(&["config", "init"]);
    assert!(
        first.status.success(),
        "first init should succeed\nstderr:\n{}",
        String::from_utf8_lossy(&first.stderr)
    );
    assert!(env.config_path().exists());

    let second = env.run(&["config", "init"]);
    assert!(!second.status.success());
    assert!(String::from_utf8_lossy(&second.stderr).contains("--force"));

    let forced = env.run(&["config", "init", "--force"]);
    assert!(forced.status.success());
}

#[test]
fn malformed_config_is_reported() {
    let env = TestEnv::new();
    env.write_config("[server\nbase_url = 1");

    let output = env.run(&["gallery"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(
        stderr.contains("Failed to parse config file"),
        "stderr:\n{}",
        stderr
    );
}

#[test]
fn upload_without_input_fails_before_network() {
    let output = run_clipcoach(&["upload"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(
        stderr.contains("Please select a file or enter a URL"),
        "stderr:\n{}",
        stderr
    );
    assert!(!stderr.contains("Uploading"));
}

#[test]
fn upload_with_blank_url_counts_as_missing() {
    let output = run_clipcoach(&["upload", "--url", "   "]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("Please select a file or enter a URL"));
}

#[test]
fn upload_with_file_and_url_is_ambiguous() {
    let output = run_clipcoach(&[
        "upload",
        "--file",
        "clip.mp4",
        "--url",
        "https://example.com/clip.mp4",
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("Choose either a file or a URL"), "stderr:\n{}", stderr);
}

#[test]
fn gallery_reports_unreachable_service() {
    let output = run_clipcoach(&["gallery"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(
        stderr.contains("Failed to load videos. Please try again later."),
        "stderr:\n{}",
        stderr
    );
}

#[test]
fn doctor_reports_failed_service_without_failing() {
    let output = run_clipcoach(&["doctor", "--json"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(
        output.status.success(),
        "doctor should run successfully\nstdout:\n{}\nstderr:\n{}",
        stdout,
        String::from_utf8_lossy(&output.stderr)
    );

    let report: serde_json::Value = serde_json::from_str(&stdout).expect("doctor json");
    assert_eq!(report["server"], common::UNREACHABLE_SERVER);
    let checks = report["checks"].as_array().expect("checks array");
    assert!(checks
        .iter()
        .any(|c| c["name"] == "service" && c["status"] == "failed"));
}
