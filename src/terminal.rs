//! Terminal output in pytest's layout.

use crate::collection::nodes::Item;
use crate::collection::report::CollectReport;
use crate::config::Config;
use crate::error::{ExitRequest, SessionError, SessionResult};
use crate::exit_code::ExitStatus;
use crate::hooks::Plugin;
use crate::runner::{TestOutcome, TestReport};
use crate::session::Session;
use std::cell::{Cell, RefCell};
use std::time::{Duration, Instant};

// ANSI color codes
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const BOLD_RED: &str = "\x1b[1;31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

const LINE_WIDTH: usize = 80;

/// Counters shown in the final summary line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub deselected: usize,
}

/// Prints collection results, per-test lines and the session summary.
#[derive(Debug, Default)]
pub struct TerminalReporter {
    verbose: Cell<u8>,
    collectonly: Cell<bool>,
    started: Cell<Option<Instant>>,
    stats: Cell<Stats>,
    collect_errors: RefCell<Vec<(String, String)>>,
    failures: RefCell<Vec<TestReport>>,
    interrupted: RefCell<Option<String>>,
}

impl TerminalReporter {
    pub const NAME: &'static str = "terminalreporter";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> Stats {
        self.stats.get()
    }

    fn update(&self, f: impl FnOnce(&mut Stats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    fn print_errors(&self) {
        let errors = self.collect_errors.borrow();
        if errors.is_empty() {
            return;
        }
        println!("{}", sep('=', "ERRORS"));
        for (nodeid, longrepr) in errors.iter() {
            println!("{BOLD_RED}{}{RESET}", sep('_', &format!("ERROR collecting {nodeid}")));
            for line in longrepr.lines() {
                println!("{RED}E   {line}{RESET}");
            }
        }
    }

    fn print_failures(&self) {
        let failures = self.failures.borrow();
        if failures.is_empty() {
            return;
        }
        println!("{}", sep('=', "FAILURES"));
        for report in failures.iter() {
            println!("{BOLD_RED}{}{RESET}", sep('_', &report.nodeid));
            println!("exit code {}", report.exit_code);
            if !report.stdout.is_empty() {
                println!("{}", sep('-', "Captured stdout"));
                print!("{}", with_newline(&report.stdout));
            }
            if !report.stderr.is_empty() {
                println!("{}", sep('-', "Captured stderr"));
                print!("{}", with_newline(&report.stderr));
            }
        }
    }
}

impl Plugin for TerminalReporter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn configure(&self, config: &Config) -> SessionResult<()> {
        self.verbose.set(config.option.verbose);
        self.collectonly.set(config.option.collectonly);
        Ok(())
    }

    fn session_start(&self, session: &mut Session) -> SessionResult<()> {
        self.started.set(Some(Instant::now()));
        let config = session.config();
        println!("{}", sep('=', "test session starts"));
        match config.inipath() {
            Some(inipath) => println!(
                "rootdir: {}, configfile: {}",
                config.rootpath().display(),
                session.bestrelpath(inipath)
            ),
            None => println!("rootdir: {}", config.rootpath().display()),
        }
        Ok(())
    }

    fn collectreport(&self, report: &CollectReport) {
        if report.is_failed() {
            self.update(|stats| stats.errors += 1);
            self.collect_errors.borrow_mut().push((
                report.nodeid.clone(),
                report.longrepr.clone().unwrap_or_default(),
            ));
        }
    }

    fn deselected(&self, items: &[Item]) {
        self.update(|stats| stats.deselected += items.len());
    }

    fn collection_finish(&self, session: &Session) {
        let stats = self.stats();
        let mut parts = vec![format!(
            "collected {} item{}",
            session.testscollected + stats.deselected,
            plural(session.testscollected + stats.deselected)
        )];
        if stats.errors > 0 {
            parts.push(format!("{} error{}", stats.errors, plural(stats.errors)));
        }
        if stats.deselected > 0 {
            parts.push(format!("{} deselected", stats.deselected));
        }
        println!("{}", parts.join(" / "));

        if self.collectonly.get() || self.verbose.get() > 1 {
            println!();
            for item in &session.items {
                println!("  {}", item.nodeid);
            }
        }
        println!();
    }

    fn runtest_logreport(&self, report: &TestReport) {
        match report.outcome {
            TestOutcome::Passed => self.update(|stats| stats.passed += 1),
            TestOutcome::Failed => {
                self.update(|stats| stats.failed += 1);
                self.failures.borrow_mut().push(report.clone());
            }
        }

        if self.verbose.get() > 0 {
            let (color, word) = match report.outcome {
                TestOutcome::Passed => (GREEN, "PASSED"),
                TestOutcome::Failed => (RED, "FAILED"),
            };
            println!("{} {color}{word}{RESET}", report.nodeid);
        } else {
            match report.outcome {
                TestOutcome::Passed => println!("{}: {GREEN}.{RESET}", report.nodeid),
                TestOutcome::Failed => println!("{}: {RED}F{RESET}", report.nodeid),
            }
        }
    }

    fn keyboard_interrupt(&self, error: &SessionError) {
        *self.interrupted.borrow_mut() = Some(format!("{}: {error}", error.kind()));
    }

    fn session_finish(
        &self,
        _session: &mut Session,
        exitstatus: ExitStatus,
    ) -> Result<(), ExitRequest> {
        println!();
        self.print_errors();
        self.print_failures();

        if let Some(reason) = self.interrupted.borrow().as_ref() {
            println!("{YELLOW}{}{RESET}", sep('!', reason));
        }

        let elapsed = self
            .started
            .get()
            .map(|started| started.elapsed())
            .unwrap_or_default();
        let color = if exitstatus.code() == 0 { GREEN } else { RED };
        println!("{color}{}{RESET}", sep('=', &summary_line(&self.stats(), elapsed)));
        Ok(())
    }
}

/// `"1 failed, 2 passed, 1 deselected in 0.12s"`, or `"no tests ran in
/// 0.00s"` when every counter is zero.
pub fn summary_line(stats: &Stats, elapsed: Duration) -> String {
    let mut parts = Vec::new();
    if stats.failed > 0 {
        parts.push(format!("{} failed", stats.failed));
    }
    if stats.passed > 0 {
        parts.push(format!("{} passed", stats.passed));
    }
    if stats.deselected > 0 {
        parts.push(format!("{} deselected", stats.deselected));
    }
    if stats.errors > 0 {
        parts.push(format!("{} error{}", stats.errors, plural(stats.errors)));
    }
    if parts.is_empty() {
        parts.push("no tests ran".to_string());
    }
    format!("{} in {:.2}s", parts.join(", "), elapsed.as_secs_f64())
}

/// `title` centered in a line of `fill`.
fn sep(fill: char, title: &str) -> String {
    let title = format!(" {title} ");
    let width = title.chars().count();
    if width >= LINE_WIDTH {
        return title.trim().to_string();
    }
    let left = (LINE_WIDTH - width) / 2;
    let right = LINE_WIDTH - width - left;
    format!(
        "{}{title}{}",
        fill.to_string().repeat(left),
        fill.to_string().repeat(right)
    )
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn with_newline(text: &str) -> String {
    if text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{text}\n")
    }
}
