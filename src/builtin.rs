//! Plugins registered for every run.

use crate::collection::error::CollectionResult;
use crate::collection::filter;
use crate::collection::nodes::{Dir, Item};
use crate::config::Config;
use crate::deselect::deselect_by_prefix;
use crate::error::SessionResult;
use crate::hooks::{Plugin, PluginManager};
use crate::pathutil::absolutepath;
use crate::runner::ScriptRunner;
use crate::runtestloop;
use crate::session::Session;
use crate::terminal::TerminalReporter;
use std::path::Path;
use std::rc::Rc;

/// Default collection and run loop.
#[derive(Debug, Default)]
pub struct MainPlugin;

impl MainPlugin {
    pub const NAME: &'static str = "main";
}

impl Plugin for MainPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn collection(&self, session: &mut Session) -> SessionResult<Option<()>> {
        session.perform_collect()?;
        Ok(Some(()))
    }

    fn runtestloop(&self, session: &mut Session) -> SessionResult<Option<bool>> {
        runtestloop::runtestloop(session).map(Some)
    }

    fn ignore_collect(&self, path: &Path, config: &Config) -> CollectionResult<Option<bool>> {
        // Paths named on the command line are always collected.
        let is_initpath = config
            .option
            .args
            .iter()
            .any(|arg| absolutepath(config.invocation_dir(), arg) == path);
        if is_initpath {
            return Ok(None);
        }
        filter::ignore_collect(path, config)
    }

    fn collect_directory(&self, path: &Path, parent: &Dir) -> Option<Dir> {
        Some(Dir::from_parent(parent, path))
    }

    fn collection_modifyitems(&self, config: &Config, items: &mut Vec<Item>) {
        deselect_by_prefix(items, config);
    }
}

/// Plugin manager holding the built-in plugins, in dispatch order.
pub fn default_plugin_manager() -> PluginManager {
    let mut pm = PluginManager::new();
    pm.register(Rc::new(MainPlugin));
    pm.register(Rc::new(ScriptRunner::new()));
    pm.register(Rc::new(TerminalReporter::new()));
    pm
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_plugins_in_order() {
        let pm = default_plugin_manager();
        let names: Vec<_> = pm.plugins().map(|(_, plugin)| plugin.name().to_string()).collect();
        assert_eq!(names, vec!["main", "runner", "terminalreporter"]);
    }

    #[test]
    fn test_explicit_argument_is_never_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let build = temp_dir.path().join("build");
        fs::create_dir_all(&build).unwrap();

        let option = Options {
            rootdir: Some(temp_dir.path().to_path_buf()),
            ..Options::default()
        };
        let config = Config::new(option, PluginManager::new(), temp_dir.path().to_path_buf())
            .unwrap();
        assert_eq!(MainPlugin.ignore_collect(&build, &config).unwrap(), Some(true));

        let option = Options {
            args: vec!["build".into()],
            rootdir: Some(temp_dir.path().to_path_buf()),
            ..Options::default()
        };
        let config = Config::new(option, PluginManager::new(), temp_dir.path().to_path_buf())
            .unwrap();
        assert_eq!(MainPlugin.ignore_collect(&build, &config).unwrap(), None);
    }

    #[test]
    fn test_collect_directory_builds_child() {
        let root = Dir::root(Path::new("/proj"));
        let child = MainPlugin
            .collect_directory(Path::new("/proj/tests"), &root)
            .unwrap();
        assert_eq!(child.nodeid, "tests");
    }
}
