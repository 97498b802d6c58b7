use std::{fs, process::Command};

fn runner() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_poly-defence"));
    let _ = command.env("RUST_LOG", "warn");
    command
}

#[test]
fn runner_prints_a_summary_line() {
    let output = runner()
        .args(["--seed", "8", "--waves", "1"])
        .output()
        .expect("failed to invoke poly-defence binary");

    assert!(output.status.success(), "poly-defence should exit cleanly");
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    assert!(stdout.starts_with("seed=8 difficulty=Easy waves=1"), "unexpected summary: {stdout}");
}

#[test]
fn runner_reads_a_run_file() {
    let path = std::env::temp_dir().join(format!("poly-defence-run-{}.toml", std::process::id()));
    fs::write(&path, "seed = 3\ndifficulty = \"medium\"\nwaves = 1\n").expect("write run file");

    let output = runner()
        .arg("--config")
        .arg(&path)
        .output()
        .expect("failed to invoke poly-defence binary");
    let _ = fs::remove_file(&path);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf-8 output");
    assert!(stdout.starts_with("seed=3 difficulty=Medium waves=1"), "unexpected summary: {stdout}");
}

#[test]
fn configuration_errors_fail_the_run() {
    let status = runner()
        .args(["--config", "/nonexistent/poly-defence.toml"])
        .status()
        .expect("failed to invoke poly-defence binary");
    assert!(!status.success());

    let status = runner()
        .args(["--tick-hz", "0"])
        .status()
        .expect("failed to invoke poly-defence binary");
    assert!(!status.success());
}
