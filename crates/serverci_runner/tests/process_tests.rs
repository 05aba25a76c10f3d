//! Integration tests for the system process runner.
//!
//! These run small shell scripts, so they only build on Unix.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serverci_runner::{
    CommandSpec, Deadline, ProcessRunner, RunnerError, SystemRunner, SystemRunnerOptions,
};

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn sh(script: &Path) -> CommandSpec {
    CommandSpec::new("/bin/sh").arg(script)
}

/// Test that stdout and stderr end up in one blob.
#[tokio::test]
async fn test_captures_combined_output() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "both.sh", "echo to-stdout\necho to-stderr >&2");

    let runner = SystemRunner::default();
    let result = runner
        .run(&sh(&script), &Deadline::after_secs(10))
        .await
        .unwrap();

    assert!(result.output.contains("to-stdout\n"));
    assert!(result.output.contains("to-stderr\n"));
    assert!(result.finished_at >= result.started_at);
}

/// Test the working directory is honoured.
#[tokio::test]
async fn test_runs_in_workdir() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "touch.sh", "echo done > marker.txt");
    let work = tempfile::tempdir().unwrap();

    let runner = SystemRunner::default();
    runner
        .run(&sh(&script).workdir(work.path()), &Deadline::after_secs(10))
        .await
        .unwrap();

    assert!(work.path().join("marker.txt").exists());
}

/// Test that a non-zero exit carries the exit code and output.
#[tokio::test]
async fn test_non_zero_exit() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "fail.sh", "echo '! LaTeX Error: broken'\nexit 3");

    let runner = SystemRunner::default();
    let err = runner
        .run(&sh(&script), &Deadline::after_secs(10))
        .await
        .unwrap_err();

    match err {
        RunnerError::NonZeroExit {
            program,
            code,
            output,
        } => {
            assert_eq!(program, "sh");
            assert_eq!(code, 3);
            assert!(output.contains("LaTeX Error"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

/// Test that the deadline terminates a hanging program.
#[tokio::test]
async fn test_deadline_terminates_program() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(dir.path(), "hang.sh", "echo started\nexec sleep 30");

    let runner = SystemRunner::default();
    let started = Instant::now();
    let err = runner
        .run(&sh(&script), &Deadline::after(Duration::from_millis(500)))
        .await
        .unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(10));
    match err {
        RunnerError::Timeout { output, .. } => assert!(output.contains("started")),
        other => panic!("unexpected error {other:?}"),
    }
}

/// Test that helpers spawned by the program are killed with it.
#[tokio::test]
async fn test_deadline_kills_process_group() {
    let dir = tempfile::tempdir().unwrap();
    // The background sleep keeps the pipes open; only a group kill closes them.
    let script = write_script(dir.path(), "spawn.sh", "sleep 30 &\nwait");

    let runner = SystemRunner::default();
    let started = Instant::now();
    let err = runner
        .run(&sh(&script), &Deadline::after(Duration::from_millis(500)))
        .await
        .unwrap_err();

    assert!(err.is_timeout());
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[cfg(target_os = "linux")]
fn is_running(pid: &str) -> bool {
    // A killed orphan may linger as a zombie until something reaps it.
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => !stat
            .rsplit(')')
            .next()
            .is_some_and(|rest| rest.trim_start().starts_with('Z')),
        Err(_) => false,
    }
}

/// Test that a grandchild left running by the script dies with the group.
#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_deadline_kills_grandchildren() {
    let dir = tempfile::tempdir().unwrap();
    let script = write_script(
        dir.path(),
        "orphan.sh",
        "sleep 30 &\necho $! > sleeper.pid\nwait",
    );

    let runner = SystemRunner::default();
    let spec = sh(&script).workdir(dir.path());
    let err = runner
        .run(&spec, &Deadline::after(Duration::from_millis(500)))
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    let pid = std::fs::read_to_string(dir.path().join("sleeper.pid")).unwrap();
    let pid = pid.trim();
    let gone_by = Instant::now() + Duration::from_secs(5);
    while is_running(pid) && Instant::now() < gone_by {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(!is_running(pid), "sleep {pid} survived the deadline");
}

/// Test program lookup on an override search path.
#[test]
fn test_locate_on_search_path() {
    let dir = tempfile::tempdir().unwrap();
    write_script(dir.path(), "pdflatex", "exit 0");

    let runner = SystemRunner::new(SystemRunnerOptions::new().search_path(dir.path()));

    assert_eq!(runner.locate("pdflatex"), Some(dir.path().join("pdflatex")));
    assert!(runner.locate("latexmk").is_none());
}
