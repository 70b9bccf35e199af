//! Common test utilities and helpers.

use rtest_session::builtin::default_plugin_manager;
use rtest_session::collection::CollectReport;
use rtest_session::collection::Item;
use rtest_session::runner::TestReport;
use rtest_session::{Config, ExitStatus, Options, Plugin, SessionError, SessionResult};
use rtest_session::{ExitRequest, Session};
use std::cell::RefCell;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::rc::Rc;
use tempfile::TempDir;

/// Creates a temporary project holding the given files.
///
/// The project lives in a subdirectory so its name doesn't start with a dot
/// and trip the default `norecursedirs`.
#[allow(dead_code)]
pub fn create_test_project_with_files(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let project_path = temp_dir.path().join("test_project");
    fs::create_dir_all(&project_path).expect("Failed to create project directory");

    for (file_path, content) in files {
        let full_path = project_path.join(file_path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file {file_path}: {e}"));
    }

    (temp_dir, project_path)
}

/// Creates a test project with a single file.
#[allow(dead_code)]
pub fn create_test_file(filename: &str, content: &str) -> (TempDir, PathBuf) {
    create_test_project_with_files(&[(filename, content)])
}

/// Path to the built binary.
#[allow(dead_code)]
pub fn get_rtest_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_rtest-session"))
}

/// Runs the binary from `project_path` with `args`.
#[allow(dead_code)]
pub fn run_rtest(project_path: &Path, args: &[&str]) -> Output {
    Command::new(get_rtest_binary())
        .args(args)
        .current_dir(project_path)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute rtest-session")
}

#[allow(dead_code)]
pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[allow(dead_code)]
pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Builds a config rooted at `project_path` with the built-in plugins plus
/// `extra`.
///
/// The invocation directory stays the process cwd, so restoring it at the
/// end of a session never moves other tests running in parallel.
#[allow(dead_code)]
pub fn config_for(project_path: &Path, option: Options, extra: Vec<Rc<dyn Plugin>>) -> Rc<Config> {
    let mut pm = default_plugin_manager();
    for plugin in extra {
        pm.register(plugin);
    }
    let option = Options {
        rootdir: Some(project_path.to_path_buf()),
        ..option
    };
    let invocation_dir = env::current_dir().expect("Failed to get current directory");
    Rc::new(Config::new(option, pm, invocation_dir).expect("Failed to build config"))
}

/// Absolute paths of `names` below `project_path`, as command line args.
#[allow(dead_code)]
pub fn args_for(project_path: &Path, names: &[&str]) -> Vec<String> {
    names
        .iter()
        .map(|name| project_path.join(name).display().to_string())
        .collect()
}

/// Plugin recording every hook it sees, in order.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingPlugin {
    pub events: RefCell<Vec<String>>,
    pub fail_configure: Option<SessionError>,
    pub fail_session_start: bool,
}

#[allow(dead_code)]
impl RecordingPlugin {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn events(&self) -> Vec<String> {
        self.events.borrow().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.as_str() == event)
            .count()
    }

    fn push(&self, event: String) {
        self.events.borrow_mut().push(event);
    }
}

impl Plugin for RecordingPlugin {
    fn name(&self) -> &str {
        "recording"
    }

    fn configure(&self, _config: &Config) -> SessionResult<()> {
        self.push("configure".into());
        match &self.fail_configure {
            Some(SessionError::Usage(e)) => Err(e.clone().into()),
            Some(SessionError::KeyboardInterrupt) => Err(SessionError::KeyboardInterrupt),
            Some(e) => Err(SessionError::Internal(e.to_string())),
            None => Ok(()),
        }
    }

    fn unconfigure(&self, _config: &Config) {
        self.push("unconfigure".into());
    }

    fn session_start(&self, _session: &mut Session) -> SessionResult<()> {
        self.push("session_start".into());
        if self.fail_session_start {
            return Err(SessionError::Interrupted("start aborted".into()));
        }
        Ok(())
    }

    fn session_finish(&self, _session: &mut Session, exitstatus: ExitStatus) -> Result<(), ExitRequest> {
        self.push(format!("session_finish {}", exitstatus.code()));
        Ok(())
    }

    fn collectreport(&self, report: &CollectReport) {
        let outcome = if report.is_failed() { "failed" } else { "passed" };
        self.push(format!("collectreport {} {outcome}", report.nodeid));
    }

    fn deselected(&self, items: &[Item]) {
        let nodeids: Vec<_> = items.iter().map(|item| item.nodeid.as_str()).collect();
        self.push(format!("deselected {}", nodeids.join(",")));
    }

    fn collection_finish(&self, session: &Session) {
        self.push(format!("collection_finish {}", session.testscollected));
    }

    fn runtest_logreport(&self, report: &TestReport) {
        let outcome = if report.is_failed() { "failed" } else { "passed" };
        self.push(format!("logreport {} {outcome}", report.nodeid));
    }

    fn keyboard_interrupt(&self, error: &SessionError) {
        self.push(format!("keyboard_interrupt {}", error.kind()));
    }
}
