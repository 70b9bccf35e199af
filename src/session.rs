//! Run state for one session: collected items, failure counters and the
//! cooperative stop/fail flags.

use crate::collection::nodes::{Collector, Dir, FileNode, Item};
use crate::collection::report::{collect_one_node, CollectReport};
use crate::config::Config;
use crate::error::{SessionError, SessionResult, UsageError};
use crate::exit_code::ExitStatus;
use crate::hooks::{FsHookProxy, PluginId};
use crate::pathutil::{absolutepath, BestRelpathCache};
use crate::runner::TestReport;
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug)]
pub struct Session {
    config: Rc<Config>,
    /// Items to run, in execution order.
    pub items: Vec<Item>,
    pub testscollected: usize,
    pub exitstatus: ExitStatus,
    testsfailed: usize,
    shouldstop: Option<String>,
    shouldfail: Option<String>,
    startpath: PathBuf,
    root: Dir,
    bestrelpathcache: RefCell<BestRelpathCache>,
}

impl Session {
    pub fn from_config(config: Rc<Config>) -> Self {
        let root = Dir::root(config.rootpath());
        let bestrelpathcache = RefCell::new(BestRelpathCache::new(config.rootpath()));
        Self {
            startpath: config.invocation_dir().to_path_buf(),
            config,
            items: Vec::new(),
            testscollected: 0,
            exitstatus: ExitStatus::default(),
            testsfailed: 0,
            shouldstop: None,
            shouldfail: None,
            root,
            bestrelpathcache,
        }
    }

    pub fn config(&self) -> &Rc<Config> {
        &self.config
    }

    /// Directory the run was started from.
    pub fn startpath(&self) -> &Path {
        &self.startpath
    }

    pub fn root(&self) -> &Dir {
        &self.root
    }

    /// Collection errors plus failed tests so far.
    pub fn testsfailed(&self) -> usize {
        self.testsfailed
    }

    pub fn count_failure(&mut self) {
        self.testsfailed += 1;
    }

    pub fn shouldstop(&self) -> Option<&str> {
        self.shouldstop.as_deref()
    }

    pub fn shouldfail(&self) -> Option<&str> {
        self.shouldfail.as_deref()
    }

    /// Ask the run to stop after the current item. Once set, the first
    /// reason is kept for the rest of the run.
    pub fn set_shouldstop(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        if self.shouldstop.is_none() {
            self.shouldstop = Some(reason);
        } else {
            log::debug!("shouldstop already set, ignoring {reason}");
        }
    }

    /// Ask the run to stop and count as failed after the current item.
    pub fn set_shouldfail(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        if self.shouldfail.is_none() {
            self.shouldfail = Some(reason);
        } else {
            log::debug!("shouldfail already set, ignoring {reason}");
        }
    }

    /// Path relative to the rootdir, for display.
    pub fn bestrelpath(&self, path: &Path) -> String {
        self.bestrelpathcache.borrow_mut().get(path)
    }

    /// Hook relay for `fspath`, leaving out directory-scoped plugins that do
    /// not apply to it.
    pub fn gethookproxy(&self, fspath: &Path) -> Rc<FsHookProxy> {
        let pm = self.config.pluginmanager();
        let remove: HashSet<PluginId> = pm
            .plugins()
            .filter(|(_, plugin)| plugin.scope().is_some_and(|dir| !fspath.starts_with(dir)))
            .map(|(id, _)| id)
            .collect();

        if remove.is_empty() {
            Rc::clone(&self.config.hook)
        } else {
            Rc::new(FsHookProxy::new(Rc::clone(pm), remove))
        }
    }

    /// Collect every item below the initial paths into `self.items`.
    pub fn perform_collect(&mut self) -> SessionResult<()> {
        let config = Rc::clone(&self.config);
        let initialpaths = self.initialpaths()?;
        log::info!("collecting from {} path(s)", initialpaths.len());

        let mut items = Vec::new();
        for path in initialpaths {
            let node = if path.is_dir() {
                let ihook = self.gethookproxy(path.parent().unwrap_or(&path));
                match ihook.collect_directory(&path, &self.root) {
                    Some(dir) => Collector::Directory(dir),
                    None => continue,
                }
            } else {
                let parent = match path.parent() {
                    Some(parent) => Dir::from_parent(&self.root, parent),
                    None => self.root.clone(),
                };
                Collector::File(FileNode::from_parent(&parent, &path))
            };
            self.genitems(&node, &mut items)?;
        }

        config.hook.collection_modifyitems(&config, &mut items);
        self.testscollected = items.len();
        self.items = items;
        config.hook.collection_finish(self);
        Ok(())
    }

    fn genitems(&mut self, node: &Collector, items: &mut Vec<Item>) -> SessionResult<()> {
        if let Collector::Item(item) = node {
            items.push(item.clone());
            return Ok(());
        }

        let report = collect_one_node(node, self)?;
        self.collectreport(&report);
        for child in &report.result {
            self.genitems(child, items)?;
        }
        Ok(())
    }

    /// Command line paths, else `testpaths` globbed below the rootdir, else
    /// the invocation directory.
    fn initialpaths(&self) -> SessionResult<Vec<PathBuf>> {
        let config = &self.config;
        if !config.option.args.is_empty() {
            return config
                .option
                .args
                .iter()
                .map(|arg| {
                    let path = absolutepath(config.invocation_dir(), arg);
                    if path.exists() {
                        Ok(path)
                    } else {
                        Err(SessionError::from(UsageError::new(format!(
                            "file or directory not found: {arg}"
                        ))))
                    }
                })
                .collect();
        }

        if !config.ini().testpaths.is_empty() {
            let mut paths = Vec::new();
            for testpath in &config.ini().testpaths {
                let pattern = absolutepath(config.rootpath(), testpath);
                let mut matched: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
                    .map_err(|e| UsageError::new(format!("invalid testpaths entry {testpath}: {e}")))?
                    .filter_map(Result::ok)
                    .collect();
                matched.sort();
                paths.extend(matched);
            }
            if !paths.is_empty() {
                return Ok(paths);
            }
            log::warn!("no testpaths matched, collecting from the invocation directory");
        }

        Ok(vec![config.invocation_dir().to_path_buf()])
    }

    /// Account for a collection report and pass it on to plugins.
    pub fn collectreport(&mut self, report: &CollectReport) {
        if report.is_failed() {
            self.count_failure();
            let maxfail = self.config.option.maxfail;
            if maxfail > 0 && self.testsfailed >= maxfail {
                self.set_shouldstop(format!("stopping after {} failures", self.testsfailed));
            }
        }
        self.config.hook.collectreport(report);
    }

    /// Account for a test report and pass it on to plugins.
    pub fn record_report(&mut self, report: &TestReport) {
        if report.is_failed() {
            self.count_failure();
            let maxfail = self.config.option.maxfail;
            if maxfail > 0 && self.testsfailed >= maxfail {
                self.set_shouldfail(format!("stopping after {} failures", self.testsfailed));
            }
        }
        self.config.hook.runtest_logreport(report);
    }
}
