//! Built-in collaborator that collects script files and runs each one as a
//! test in its own process.

use crate::collection::error::CollectionResult;
use crate::collection::filter::fnmatch;
use crate::collection::nodes::{FileNode, Item};
use crate::config::Config;
use crate::error::{SessionResult, UsageError};
use crate::hooks::Plugin;
use crate::pathutil::absolutepath;
use crate::session::Session;
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Environment variable pointing scripts at the base temporary directory.
pub const BASETEMP_ENV: &str = "RTEST_BASETEMP";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed,
}

/// Result of running a single test
#[derive(Debug, Clone)]
pub struct TestReport {
    pub nodeid: String,
    pub outcome: TestOutcome,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl TestReport {
    pub fn is_failed(&self) -> bool {
        self.outcome == TestOutcome::Failed
    }
}

/// Program, leading arguments and environment used to run one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerCommand {
    pub program: String,
    pub initial_args: Vec<String>,
    pub env_vars: Vec<(String, String)>,
}

impl RunnerCommand {
    /// Built from `--runner` (or the `runner` ini value) and `--env`.
    pub fn from_config(config: &Config) -> Result<Self, UsageError> {
        let mut words: Vec<String> = match &config.option.runner {
            Some(runner) => runner.split_whitespace().map(String::from).collect(),
            None => config.ini().runner.clone(),
        };
        if words.is_empty() {
            return Err(UsageError::new("runner command must not be empty"));
        }
        let program = words.remove(0);

        let mut env_vars = config
            .option
            .env
            .iter()
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
                _ => Err(UsageError::new(format!(
                    "invalid --env value {pair:?}, expected KEY=VALUE"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(basetemp) = &config.option.basetemp {
            let basetemp = absolutepath(config.invocation_dir(), basetemp);
            env_vars.push((BASETEMP_ENV.to_string(), basetemp.display().to_string()));
        }

        Ok(Self {
            program,
            initial_args: words,
            env_vars,
        })
    }

    /// Run `script` from `workdir` and wait for it.
    pub fn run(&self, nodeid: &str, script: &Path, workdir: &Path) -> TestReport {
        let start = Instant::now();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.initial_args)
            .arg(script)
            .envs(self.env_vars.iter().map(|(key, value)| (key, value)))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .current_dir(workdir);

        let (exit_code, stdout, stderr) = match cmd.output() {
            Ok(output) => (
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stdout).into_owned(),
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ),
            Err(e) => (-1, String::new(), format!("Failed to execute command: {e}")),
        };

        TestReport {
            nodeid: nodeid.to_string(),
            outcome: if exit_code == 0 {
                TestOutcome::Passed
            } else {
                TestOutcome::Failed
            },
            exit_code,
            stdout,
            stderr,
            duration: start.elapsed(),
        }
    }
}

/// Collects files matching `script_files` and runs them with the configured
/// runner command.
#[derive(Debug, Default)]
pub struct ScriptRunner {
    command: RefCell<Option<RunnerCommand>>,
}

impl ScriptRunner {
    pub const NAME: &'static str = "runner";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(&self) -> Option<RunnerCommand> {
        self.command.borrow().clone()
    }
}

impl Plugin for ScriptRunner {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn configure(&self, config: &Config) -> SessionResult<()> {
        let command = RunnerCommand::from_config(config)?;
        log::info!(
            "runner command: {} {}",
            command.program,
            command.initial_args.join(" ")
        );

        if let Some(basetemp) = &config.option.basetemp {
            let basetemp = absolutepath(config.invocation_dir(), basetemp);
            if basetemp.exists() {
                fs::remove_dir_all(&basetemp)?;
            }
            fs::create_dir_all(&basetemp)?;
        }

        *self.command.borrow_mut() = Some(command);
        Ok(())
    }

    fn unconfigure(&self, _config: &Config) {
        self.command.borrow_mut().take();
    }

    fn collect_file(&self, file: &FileNode, config: &Config) -> CollectionResult<Vec<Item>> {
        let matches = config
            .ini()
            .script_files
            .iter()
            .any(|pattern| fnmatch(file.name(), pattern));
        Ok(if matches {
            vec![Item::for_file(file)]
        } else {
            Vec::new()
        })
    }

    fn runtest_protocol(
        &self,
        session: &mut Session,
        item: &Item,
        _nextitem: Option<&Item>,
    ) -> SessionResult<Option<bool>> {
        let command = match self.command() {
            Some(command) => command,
            None => RunnerCommand::from_config(session.config())?,
        };

        log::debug!("running {}", item.nodeid);
        let report = command.run(&item.nodeid, &item.path, session.config().rootpath());
        session.record_report(&report);
        Ok(Some(true))
    }
}
