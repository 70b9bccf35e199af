use indoc::indoc;

mod common;
use common::{create_test_project_with_files, run_rtest, stderr_of, stdout_of};

/// Project with an ini file, so the rootdir never leaks above the temp dir.
fn project(files: &[(&str, &str)]) -> (tempfile::TempDir, std::path::PathBuf) {
    let mut all = vec![("rtest.toml", "")];
    all.extend_from_slice(files);
    create_test_project_with_files(&all)
}

#[test]
fn test_single_passing_script() {
    let (_temp_dir, project_path) = project(&[("test_ok.sh", "exit 0\n")]);

    let output = run_rtest(&project_path, &["test_ok.sh"]);

    assert_eq!(output.status.code(), Some(0), "Test should pass");
    let stdout = stdout_of(&output);
    assert!(stdout.contains("test session starts"));
    assert!(stdout.contains("collected 1 item"));
    assert!(stdout.contains("1 passed"));
}

#[test]
fn test_single_failing_script() {
    let (_temp_dir, project_path) = project(&[(
        "test_bad.sh",
        indoc! {r#"
            echo "expected failure"
            exit 1
        "#},
    )]);

    let output = run_rtest(&project_path, &[]);

    assert_eq!(output.status.code(), Some(1), "Test should fail");
    let stdout = stdout_of(&output);
    assert!(stdout.contains("FAILURES"));
    assert!(stdout.contains("expected failure"));
    assert!(stdout.contains("1 failed"));
}

#[test]
fn test_exitfirst_stops_early() {
    let (_temp_dir, project_path) = project(&[
        ("test_a.sh", "exit 1\n"),
        ("test_b.sh", "exit 0\n"),
    ]);

    let output = run_rtest(&project_path, &["-x"]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("1 failed"));
    assert!(!stdout.contains("passed"));
}

#[test]
fn test_collect_only_lists_items() {
    let (_temp_dir, project_path) = project(&[
        ("test_a.sh", "exit 1\n"),
        ("sub/test_b.sh", "exit 1\n"),
    ]);

    let output = run_rtest(&project_path, &["--collect-only"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("collected 2 items"));
    assert!(stdout.contains("  test_a.sh"));
    assert!(stdout.contains("  sub/test_b.sh"));
    assert!(stdout.contains("no tests ran"));
}

#[test]
fn test_verbose_reports_each_test() {
    let (_temp_dir, project_path) = project(&[("test_ok.sh", "exit 0\n")]);

    let output = run_rtest(&project_path, &["-v"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout_of(&output).contains("test_ok.sh \x1b[32mPASSED"));
}

#[test]
fn test_deselect() {
    let (_temp_dir, project_path) = project(&[
        ("test_a.sh", "exit 0\n"),
        ("test_b.sh", "exit 1\n"),
    ]);

    let output = run_rtest(&project_path, &["--deselect", "test_b.sh"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("1 deselected"));
    assert!(stdout.contains("1 passed"));
}

#[test]
fn test_missing_file_is_a_usage_error() {
    let (_temp_dir, project_path) = project(&[]);

    let output = run_rtest(&project_path, &["nope.sh"]);

    assert_eq!(output.status.code(), Some(4));
    assert!(stderr_of(&output).contains("ERROR: file or directory not found: nope.sh"));
}

#[test]
fn test_unknown_flag_is_a_usage_error() {
    let (_temp_dir, project_path) = project(&[]);

    let output = run_rtest(&project_path, &["--no-such-flag"]);

    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_help_exits_cleanly() {
    let (_temp_dir, project_path) = project(&[]);

    let output = run_rtest(&project_path, &["--help"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout_of(&output).contains("--basetemp"));
}

#[test]
fn test_invalid_ini_is_a_usage_error() {
    let (_temp_dir, project_path) = create_test_project_with_files(&[
        ("rtest.toml", "not_a_key = true\n"),
        ("test_ok.sh", "exit 0\n"),
    ]);

    let output = run_rtest(&project_path, &[]);

    assert_eq!(output.status.code(), Some(4));
    assert!(stderr_of(&output).contains("ERROR:"));
}

#[test]
fn test_basetemp_rejects_cwd_and_parents() {
    let (_temp_dir, project_path) = project(&[("test_ok.sh", "exit 0\n")]);

    for value in [".", "..", "", "missing/..", "missing/../.."] {
        let output = run_rtest(&project_path, &["--basetemp", value]);
        assert_eq!(output.status.code(), Some(4), "--basetemp {value:?}");
        assert!(stderr_of(&output).contains(
            "basetemp must not be empty, the current working directory or any parent directory of it"
        ));
    }
}

#[test]
fn test_basetemp_is_created_and_exported() {
    let (_temp_dir, project_path) = project(&[(
        "test_tmp.sh",
        indoc! {r#"
            test -d "$RTEST_BASETEMP" || exit 1
            touch "$RTEST_BASETEMP/marker"
        "#},
    )]);

    let output = run_rtest(&project_path, &["--basetemp", "scratch"]);

    assert_eq!(output.status.code(), Some(0), "{}", stdout_of(&output));
    assert!(project_path.join("scratch").join("marker").exists());
}

#[test]
fn test_env_and_runner_options() {
    let (_temp_dir, project_path) = project(&[(
        "test_env.sh",
        indoc! {r#"
            test "$GREETING" = "hello"
        "#},
    )]);

    let output = run_rtest(&project_path, &["--runner", "sh -e", "-e", "GREETING=hello"]);
    assert_eq!(output.status.code(), Some(0), "{}", stdout_of(&output));

    let output = run_rtest(&project_path, &["-e", "GREETING=bye"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_invalid_env_is_a_usage_error() {
    let (_temp_dir, project_path) = project(&[("test_ok.sh", "exit 0\n")]);

    let output = run_rtest(&project_path, &["-e", "NOEQUALS"]);

    assert_eq!(output.status.code(), Some(4));
    assert!(stderr_of(&output).contains("NOEQUALS"));
}

#[test]
fn test_collection_error_interrupts() {
    let (_temp_dir, project_path) = project(&[
        ("test_ok.sh", "exit 0\n"),
        ("bad/conftest.toml", "collect_ignore = 3\n"),
    ]);

    let output = run_rtest(&project_path, &[]);

    assert_eq!(output.status.code(), Some(2));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("ERROR collecting bad"));
    assert!(stdout.contains("Interrupted: 1 error during collection"));
    assert!(stdout.contains("1 error in"));
}
