//! Plugin registry and hook dispatch.
//!
//! Every extension point is a method on [`Plugin`] with a no-op default.
//! A [`PluginManager`] keeps plugins in registration order and an
//! [`FsHookProxy`] hands out memoized [`HookCaller`]s for one hook name,
//! leaving out the plugins excluded when the proxy was built.

use crate::collection::error::CollectionResult;
use crate::collection::nodes::{Dir, FileNode, Item};
use crate::collection::report::CollectReport;
use crate::config::Config;
use crate::error::{ExitRequest, SessionError, SessionResult};
use crate::exit_code::ExitStatus;
use crate::runner::TestReport;
use crate::session::Session;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

/// Names of the extension points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookName {
    Configure,
    Unconfigure,
    SessionStart,
    SessionFinish,
    Collection,
    IgnoreCollect,
    CollectDirectory,
    CollectFile,
    CollectReport,
    CollectionModifyItems,
    Deselected,
    CollectionFinish,
    RuntestLoop,
    RuntestProtocol,
    RuntestLogReport,
    KeyboardInterrupt,
    InternalError,
}

impl HookName {
    pub fn as_str(self) -> &'static str {
        match self {
            HookName::Configure => "configure",
            HookName::Unconfigure => "unconfigure",
            HookName::SessionStart => "session_start",
            HookName::SessionFinish => "session_finish",
            HookName::Collection => "collection",
            HookName::IgnoreCollect => "ignore_collect",
            HookName::CollectDirectory => "collect_directory",
            HookName::CollectFile => "collect_file",
            HookName::CollectReport => "collectreport",
            HookName::CollectionModifyItems => "collection_modifyitems",
            HookName::Deselected => "deselected",
            HookName::CollectionFinish => "collection_finish",
            HookName::RuntestLoop => "runtestloop",
            HookName::RuntestProtocol => "runtest_protocol",
            HookName::RuntestLogReport => "runtest_logreport",
            HookName::KeyboardInterrupt => "keyboard_interrupt",
            HookName::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for HookName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A collaborator taking part in a session.
///
/// Hooks returning `Option` are "first result" hooks: dispatch stops at the
/// first plugin returning `Some`.
#[allow(unused_variables)]
pub trait Plugin {
    fn name(&self) -> &str;

    /// Whether this plugin takes part in `hook`.
    fn implements(&self, hook: HookName) -> bool {
        true
    }

    /// Directory this plugin applies to. `None` means everywhere.
    fn scope(&self) -> Option<&Path> {
        None
    }

    fn configure(&self, config: &Config) -> SessionResult<()> {
        Ok(())
    }

    fn unconfigure(&self, config: &Config) {}

    fn session_start(&self, session: &mut Session) -> SessionResult<()> {
        Ok(())
    }

    fn session_finish(
        &self,
        session: &mut Session,
        exitstatus: ExitStatus,
    ) -> Result<(), ExitRequest> {
        Ok(())
    }

    fn collection(&self, session: &mut Session) -> SessionResult<Option<()>> {
        Ok(None)
    }

    /// `Some(true)` ignores the path, `None` leaves the decision to others.
    fn ignore_collect(&self, path: &Path, config: &Config) -> CollectionResult<Option<bool>> {
        Ok(None)
    }

    fn collect_directory(&self, path: &Path, parent: &Dir) -> Option<Dir> {
        None
    }

    fn collect_file(&self, file: &FileNode, config: &Config) -> CollectionResult<Vec<Item>> {
        Ok(Vec::new())
    }

    fn collectreport(&self, report: &CollectReport) {}

    fn collection_modifyitems(&self, config: &Config, items: &mut Vec<Item>) {}

    fn deselected(&self, items: &[Item]) {}

    fn collection_finish(&self, session: &Session) {}

    fn runtestloop(&self, session: &mut Session) -> SessionResult<Option<bool>> {
        Ok(None)
    }

    fn runtest_protocol(
        &self,
        session: &mut Session,
        item: &Item,
        nextitem: Option<&Item>,
    ) -> SessionResult<Option<bool>> {
        Ok(None)
    }

    fn runtest_logreport(&self, report: &TestReport) {}

    fn keyboard_interrupt(&self, error: &SessionError) {}

    /// Returns `true` when the error was reported.
    fn internal_error(&self, error: &SessionError) -> Result<bool, ExitRequest> {
        Ok(false)
    }
}

pub type PluginId = usize;

/// Registered plugins, in registration order.
#[derive(Default)]
pub struct PluginManager {
    plugins: Vec<Rc<dyn Plugin>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Rc<dyn Plugin>) -> PluginId {
        log::debug!("registering plugin {}", plugin.name());
        self.plugins.push(plugin);
        self.plugins.len() - 1
    }

    pub fn plugins(&self) -> impl Iterator<Item = (PluginId, &Rc<dyn Plugin>)> {
        self.plugins.iter().enumerate()
    }

    /// Caller for `name` over every plugin except those in `remove`.
    pub fn subset_hook_caller(&self, name: HookName, remove: &HashSet<PluginId>) -> HookCaller {
        let impls = self
            .plugins()
            .filter(|(id, plugin)| !remove.contains(id) && plugin.implements(name))
            .map(|(_, plugin)| Rc::clone(plugin))
            .collect();
        HookCaller { name, impls }
    }
}

impl fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|plugin| plugin.name()))
            .finish()
    }
}

/// Invokes one hook on a fixed list of plugins.
pub struct HookCaller {
    name: HookName,
    impls: Vec<Rc<dyn Plugin>>,
}

impl HookCaller {
    pub fn plugin_names(&self) -> Vec<&str> {
        self.impls.iter().map(|plugin| plugin.name()).collect()
    }

    /// Call every implementation, stopping at the first error.
    pub fn call<R, E>(&self, mut f: impl FnMut(&dyn Plugin) -> Result<R, E>) -> Result<Vec<R>, E> {
        self.impls.iter().map(|plugin| f(plugin.as_ref())).collect()
    }

    /// Call implementations until one returns `Some`.
    pub fn call_firstresult<R, E>(
        &self,
        mut f: impl FnMut(&dyn Plugin) -> Result<Option<R>, E>,
    ) -> Result<Option<R>, E> {
        for plugin in &self.impls {
            if let Some(result) = f(plugin.as_ref())? {
                return Ok(Some(result));
            }
        }
        Ok(None)
    }

    /// Broadcast to every implementation.
    pub fn notify(&self, mut f: impl FnMut(&dyn Plugin)) {
        for plugin in &self.impls {
            f(plugin.as_ref());
        }
    }
}

impl fmt::Debug for HookCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookCaller")
            .field("name", &self.name)
            .field("impls", &self.plugin_names())
            .finish()
    }
}

/// Hook relay with a fixed set of plugins left out.
///
/// Callers are built on first use and cached; the exclusion set cannot
/// change afterwards.
pub struct FsHookProxy {
    pm: Rc<PluginManager>,
    remove: HashSet<PluginId>,
    callers: RefCell<HashMap<HookName, Rc<HookCaller>>>,
}

impl FsHookProxy {
    pub fn new(pm: Rc<PluginManager>, remove: HashSet<PluginId>) -> Self {
        Self {
            pm,
            remove,
            callers: RefCell::new(HashMap::new()),
        }
    }

    pub fn caller(&self, name: HookName) -> Rc<HookCaller> {
        let cached = self.callers.borrow().get(&name).cloned();
        if let Some(caller) = cached {
            return caller;
        }
        let caller = Rc::new(self.pm.subset_hook_caller(name, &self.remove));
        self.callers.borrow_mut().insert(name, Rc::clone(&caller));
        caller
    }

    pub fn configure(&self, config: &Config) -> SessionResult<()> {
        self.caller(HookName::Configure)
            .call(|plugin| plugin.configure(config))
            .map(drop)
    }

    pub fn unconfigure(&self, config: &Config) {
        self.caller(HookName::Unconfigure)
            .notify(|plugin| plugin.unconfigure(config));
    }

    pub fn session_start(&self, session: &mut Session) -> SessionResult<()> {
        self.caller(HookName::SessionStart)
            .call(|plugin| plugin.session_start(session))
            .map(drop)
    }

    pub fn session_finish(
        &self,
        session: &mut Session,
        exitstatus: ExitStatus,
    ) -> Result<(), ExitRequest> {
        self.caller(HookName::SessionFinish)
            .call(|plugin| plugin.session_finish(session, exitstatus))
            .map(drop)
    }

    pub fn collection(&self, session: &mut Session) -> SessionResult<Option<()>> {
        self.caller(HookName::Collection)
            .call_firstresult(|plugin| plugin.collection(session))
    }

    pub fn ignore_collect(&self, path: &Path, config: &Config) -> CollectionResult<Option<bool>> {
        self.caller(HookName::IgnoreCollect)
            .call_firstresult(|plugin| plugin.ignore_collect(path, config))
    }

    pub fn collect_directory(&self, path: &Path, parent: &Dir) -> Option<Dir> {
        self.caller(HookName::CollectDirectory)
            .call_firstresult(|plugin| Ok::<_, Infallible>(plugin.collect_directory(path, parent)))
            .ok()
            .flatten()
    }

    pub fn collect_file(&self, file: &FileNode, config: &Config) -> CollectionResult<Vec<Item>> {
        let results = self
            .caller(HookName::CollectFile)
            .call(|plugin| plugin.collect_file(file, config))?;
        Ok(results.into_iter().flatten().collect())
    }

    pub fn collectreport(&self, report: &CollectReport) {
        self.caller(HookName::CollectReport)
            .notify(|plugin| plugin.collectreport(report));
    }

    pub fn collection_modifyitems(&self, config: &Config, items: &mut Vec<Item>) {
        self.caller(HookName::CollectionModifyItems)
            .notify(|plugin| plugin.collection_modifyitems(config, items));
    }

    pub fn deselected(&self, items: &[Item]) {
        self.caller(HookName::Deselected)
            .notify(|plugin| plugin.deselected(items));
    }

    pub fn collection_finish(&self, session: &Session) {
        self.caller(HookName::CollectionFinish)
            .notify(|plugin| plugin.collection_finish(session));
    }

    pub fn runtestloop(&self, session: &mut Session) -> SessionResult<Option<bool>> {
        self.caller(HookName::RuntestLoop)
            .call_firstresult(|plugin| plugin.runtestloop(session))
    }

    pub fn runtest_protocol(
        &self,
        session: &mut Session,
        item: &Item,
        nextitem: Option<&Item>,
    ) -> SessionResult<Option<bool>> {
        self.caller(HookName::RuntestProtocol)
            .call_firstresult(|plugin| plugin.runtest_protocol(session, item, nextitem))
    }

    pub fn runtest_logreport(&self, report: &TestReport) {
        self.caller(HookName::RuntestLogReport)
            .notify(|plugin| plugin.runtest_logreport(report));
    }

    pub fn keyboard_interrupt(&self, error: &SessionError) {
        self.caller(HookName::KeyboardInterrupt)
            .notify(|plugin| plugin.keyboard_interrupt(error));
    }

    pub fn internal_error(&self, error: &SessionError) -> Result<bool, ExitRequest> {
        let handled = self
            .caller(HookName::InternalError)
            .call(|plugin| plugin.internal_error(error))?;
        Ok(handled.into_iter().any(|reported| reported))
    }
}

impl fmt::Debug for FsHookProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FsHookProxy")
            .field("plugins", &self.pm)
            .field("remove", &self.remove)
            .finish()
    }
}
