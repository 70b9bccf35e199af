//! Run configuration: command line options, ini values and directory-local
//! path lists.
//!
//! Ini values come from `rtest.toml` (top-level keys) or the `[tool.rtest]`
//! table of `pyproject.toml` in the rootdir. Any directory below the rootdir
//! may carry a `conftest.toml` with `collect_ignore` and
//! `collect_ignore_glob` lists, resolved relative to that directory.

use crate::collection::error::{CollectionError, CollectionResult};
use crate::error::{ExitRequest, SessionError, SessionResult, UsageError};
use crate::hooks::{FsHookProxy, PluginManager};
use crate::pathutil::absolutepath;
use serde::Deserialize;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

pub const INI_FILE: &str = "rtest.toml";
pub const PYPROJECT_FILE: &str = "pyproject.toml";
pub const LOCAL_CONFIG_FILE: &str = "conftest.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl From<ConfigError> for UsageError {
    fn from(err: ConfigError) -> Self {
        UsageError(err.to_string())
    }
}

/// Parsed command line options.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Files or directories given on the command line.
    pub args: Vec<String>,
    pub ignore: Vec<PathBuf>,
    pub ignore_glob: Vec<String>,
    pub deselect: Vec<String>,
    pub collectonly: bool,
    pub continue_on_collection_errors: bool,
    pub collect_in_virtualenv: bool,
    /// Stop after this many failures; 0 never stops.
    pub maxfail: usize,
    pub basetemp: Option<String>,
    pub rootdir: Option<PathBuf>,
    /// Overrides the `runner` ini value, split on whitespace.
    pub runner: Option<String>,
    /// `KEY=VALUE` pairs exported to every test process.
    pub env: Vec<String>,
    pub verbose: u8,
}

/// Values from the ini file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IniConfig {
    pub testpaths: Vec<String>,
    pub norecursedirs: Vec<String>,
    pub script_files: Vec<String>,
    pub runner: Vec<String>,
}

impl Default for IniConfig {
    fn default() -> Self {
        Self {
            testpaths: Vec::new(),
            norecursedirs: [
                "*.egg", ".*", "_darcs", "build", "CVS", "dist", "node_modules", "venv", "{arch}",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            script_files: vec!["test_*.sh".into()],
            runner: vec!["sh".into()],
        }
    }
}

#[derive(Debug, Deserialize)]
struct PyProject {
    tool: Option<PyProjectTool>,
}

#[derive(Debug, Deserialize)]
struct PyProjectTool {
    rtest: Option<IniConfig>,
}

/// Path lists a `conftest.toml` may define.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathList {
    CollectIgnore,
    CollectIgnoreGlob,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LocalConfig {
    collect_ignore: Option<Vec<String>>,
    collect_ignore_glob: Option<Vec<String>>,
}

impl LocalConfig {
    fn get(&self, name: PathList) -> Option<&[String]> {
        match name {
            PathList::CollectIgnore => self.collect_ignore.as_deref(),
            PathList::CollectIgnoreGlob => self.collect_ignore_glob.as_deref(),
        }
    }
}

type Cleanup = Box<dyn FnOnce()>;

/// Configuration shared by everything taking part in a run.
pub struct Config {
    pub option: Options,
    ini: IniConfig,
    inipath: Option<PathBuf>,
    rootpath: PathBuf,
    invocation_dir: PathBuf,
    pluginmanager: Rc<PluginManager>,
    pub hook: Rc<FsHookProxy>,
    configured: Cell<bool>,
    cleanup: RefCell<Vec<Cleanup>>,
    local_configs: RefCell<HashMap<PathBuf, Option<Rc<LocalConfig>>>>,
}

impl Config {
    /// Build the configuration, locating the rootdir and reading its ini file.
    pub fn new(
        option: Options,
        pluginmanager: PluginManager,
        invocation_dir: PathBuf,
    ) -> Result<Self, ConfigError> {
        let (rootpath, inipath, ini) = determine_setup(&option, &invocation_dir)?;
        log::debug!("rootdir: {}", rootpath.display());
        if let Some(inipath) = &inipath {
            log::debug!("inifile: {}", inipath.display());
        }

        let pluginmanager = Rc::new(pluginmanager);
        let hook = Rc::new(FsHookProxy::new(Rc::clone(&pluginmanager), HashSet::new()));

        Ok(Self {
            option,
            ini,
            inipath,
            rootpath,
            invocation_dir,
            pluginmanager,
            hook,
            configured: Cell::new(false),
            cleanup: RefCell::new(Vec::new()),
            local_configs: RefCell::new(HashMap::new()),
        })
    }

    pub fn ini(&self) -> &IniConfig {
        &self.ini
    }

    pub fn inipath(&self) -> Option<&Path> {
        self.inipath.as_deref()
    }

    pub fn rootpath(&self) -> &Path {
        &self.rootpath
    }

    pub fn invocation_dir(&self) -> &Path {
        &self.invocation_dir
    }

    pub fn pluginmanager(&self) -> &Rc<PluginManager> {
        &self.pluginmanager
    }

    pub fn is_configured(&self) -> bool {
        self.configured.get()
    }

    /// Mark the config as configured and run the `configure` hooks.
    pub fn do_configure(&self) -> SessionResult<()> {
        self.configured.set(true);
        self.hook.configure(self)
    }

    /// Run `unconfigure` hooks if configured, then every cleanup callback in
    /// reverse registration order. Safe to call more than once.
    pub fn ensure_unconfigure(&self) {
        if self.configured.replace(false) {
            self.hook.unconfigure(self);
        }
        loop {
            let next = self.cleanup.borrow_mut().pop();
            match next {
                Some(cleanup) => cleanup(),
                None => break,
            }
        }
    }

    pub fn add_cleanup(&self, func: impl FnOnce() + 'static) {
        self.cleanup.borrow_mut().push(Box::new(func));
    }

    /// Report an unexpected error through the `internal_error` hooks,
    /// falling back to stderr when no plugin reported it.
    pub fn notify_exception(&self, error: &SessionError) -> Result<(), ExitRequest> {
        log::error!("internal error: {error}");
        if !self.hook.internal_error(error)? {
            for line in format!("{}: {error}", error.kind()).lines() {
                eprintln!("INTERNALERROR> {line}");
            }
        }
        Ok(())
    }

    /// The `name` list of the nearest `conftest.toml` at or above `path`
    /// that defines it, with entries made absolute against that file's
    /// directory. `None` when no such file defines it.
    pub fn getconftest_pathlist(
        &self,
        name: PathList,
        path: &Path,
    ) -> CollectionResult<Option<Vec<PathBuf>>> {
        for dir in path.ancestors() {
            if !dir.starts_with(&self.rootpath) {
                break;
            }
            let Some(local) = self.local_config(dir)? else {
                continue;
            };
            if let Some(values) = local.get(name) {
                return Ok(Some(values.iter().map(|v| absolutepath(dir, v)).collect()));
            }
        }
        Ok(None)
    }

    fn local_config(&self, dir: &Path) -> CollectionResult<Option<Rc<LocalConfig>>> {
        if let Some(cached) = self.local_configs.borrow().get(dir) {
            return Ok(cached.clone());
        }

        let path = dir.join(LOCAL_CONFIG_FILE);
        let loaded = match fs::read_to_string(&path) {
            Ok(content) => {
                let local: LocalConfig =
                    toml::from_str(&content).map_err(|e| CollectionError::InvalidLocalConfig {
                        path: path.clone(),
                        msg: e.to_string(),
                    })?;
                log::debug!("loaded {}", path.display());
                Some(Rc::new(local))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(source) => return Err(CollectionError::Io { path, source }),
        };

        self.local_configs
            .borrow_mut()
            .insert(dir.to_path_buf(), loaded.clone());
        Ok(loaded)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("option", &self.option)
            .field("ini", &self.ini)
            .field("rootpath", &self.rootpath)
            .field("invocation_dir", &self.invocation_dir)
            .field("plugins", &self.pluginmanager)
            .finish()
    }
}

/// Rootdir, ini file path and ini values for a run.
fn determine_setup(
    option: &Options,
    invocation_dir: &Path,
) -> Result<(PathBuf, Option<PathBuf>, IniConfig), ConfigError> {
    if let Some(rootdir) = &option.rootdir {
        let rootpath = absolutepath(invocation_dir, rootdir);
        let (inipath, ini) = match load_ini(&rootpath)? {
            Some((inipath, ini)) => (Some(inipath), ini),
            None => (None, IniConfig::default()),
        };
        return Ok((rootpath, inipath, ini));
    }

    for dir in invocation_dir.ancestors() {
        if let Some((inipath, ini)) = load_ini(dir)? {
            return Ok((dir.to_path_buf(), Some(inipath), ini));
        }
    }
    Ok((invocation_dir.to_path_buf(), None, IniConfig::default()))
}

/// Read the ini values defined in `dir`, if any.
fn load_ini(dir: &Path) -> Result<Option<(PathBuf, IniConfig)>, ConfigError> {
    let ini_path = dir.join(INI_FILE);
    if let Some(content) = read_optional(&ini_path)? {
        let ini = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: ini_path.clone(),
            source,
        })?;
        return Ok(Some((ini_path, ini)));
    }

    let pyproject_path = dir.join(PYPROJECT_FILE);
    if let Some(content) = read_optional(&pyproject_path)? {
        let pyproject: PyProject = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: pyproject_path.clone(),
            source,
        })?;
        if let Some(ini) = pyproject.tool.and_then(|tool| tool.rtest) {
            return Ok(Some((pyproject_path, ini)));
        }
    }
    Ok(None)
}

fn read_optional(path: &Path) -> Result<Option<String>, ConfigError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
