//! Collection tree nodes.
//!
//! Directories and files are collectors; items are the executable leaves.
//! Nodes never filter: by the time a node exists, the paths it was built
//! from have already passed `ignore_collect`.

use crate::error::SessionResult;
use crate::session::Session;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::error::CollectionError;

/// A node of the collection tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collector {
    Directory(Dir),
    File(FileNode),
    Item(Item),
}

impl Collector {
    pub fn nodeid(&self) -> &str {
        match self {
            Collector::Directory(dir) => &dir.nodeid,
            Collector::File(file) => &file.nodeid,
            Collector::Item(item) => &item.nodeid,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Collector::Directory(dir) => &dir.path,
            Collector::File(file) => &file.path,
            Collector::Item(item) => &item.path,
        }
    }

    pub fn is_item(&self) -> bool {
        matches!(self, Collector::Item(_))
    }

    /// Children of this node. Items have none.
    pub fn collect(&self, session: &Session) -> SessionResult<Vec<Collector>> {
        match self {
            Collector::Directory(dir) => dir.collect(session),
            Collector::File(file) => file.collect(session),
            Collector::Item(_) => Ok(Vec::new()),
        }
    }
}

/// Collector for the entries of a filesystem directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dir {
    pub path: PathBuf,
    pub nodeid: String,
    pub parent: Option<String>,
}

impl Dir {
    /// The session root; its nodeid is empty.
    pub fn root(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            nodeid: String::new(),
            parent: None,
        }
    }

    pub fn from_parent(parent: &Dir, path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            nodeid: child_nodeid(parent, path),
            parent: Some(parent.nodeid.clone()),
        }
    }

    /// Entries of this directory, sorted by name, minus ignored paths.
    fn collect(&self, session: &Session) -> SessionResult<Vec<Collector>> {
        let config = session.config();
        let ihook = session.gethookproxy(&self.path);
        let mut children = Vec::new();

        let entries = WalkDir::new(&self.path)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.io_error().map(io::Error::kind) == Some(io::ErrorKind::PermissionDenied) => {
                    log::debug!("skipping unreadable entry: {err}");
                    continue;
                }
                // Broken symlinks and the like; only the directory itself is fatal.
                Err(err) if err.depth() > 0 => {
                    log::warn!("skipping {err}");
                    continue;
                }
                Err(err) => {
                    return Err(CollectionError::Io {
                        path: err.path().unwrap_or(&self.path).to_path_buf(),
                        source: err.into(),
                    }
                    .into())
                }
            };

            let path = entry.path();
            if ihook.ignore_collect(path, config)? == Some(true) {
                log::debug!("ignoring {}", path.display());
                continue;
            }

            if entry.file_type().is_dir() {
                if let Some(dir) = ihook.collect_directory(path, self) {
                    children.push(Collector::Directory(dir));
                }
            } else if entry.file_type().is_file() {
                children.push(Collector::File(FileNode::from_parent(self, path)));
            }
        }

        Ok(children)
    }
}

/// Collector for one file; plugins turn it into items through `collect_file`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub path: PathBuf,
    pub nodeid: String,
    pub parent: Option<String>,
}

impl FileNode {
    pub fn from_parent(parent: &Dir, path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            nodeid: child_nodeid(parent, path),
            parent: Some(parent.nodeid.clone()),
        }
    }

    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("")
    }

    fn collect(&self, session: &Session) -> SessionResult<Vec<Collector>> {
        let ihook = session.gethookproxy(&self.path);
        let items = ihook.collect_file(self, session.config())?;
        Ok(items.into_iter().map(Collector::Item).collect())
    }
}

/// An executable test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub nodeid: String,
    pub path: PathBuf,
    pub name: String,
}

impl Item {
    /// The item standing for a whole file; shares the file's nodeid.
    pub fn for_file(file: &FileNode) -> Self {
        Self {
            nodeid: file.nodeid.clone(),
            path: file.path.clone(),
            name: file.name().to_string(),
        }
    }

    pub fn from_parent(file: &FileNode, name: &str) -> Self {
        Self {
            nodeid: format!("{}::{name}", file.nodeid),
            path: file.path.clone(),
            name: name.to_string(),
        }
    }
}

/// Nodeid of `path` below `parent`, `/`-separated on every platform.
fn child_nodeid(parent: &Dir, path: &Path) -> String {
    let Ok(relative) = path.strip_prefix(&parent.path) else {
        return path.to_string_lossy().into_owned();
    };
    let relative = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");

    match (parent.nodeid.is_empty(), relative.is_empty()) {
        (_, true) => parent.nodeid.clone(),
        (true, false) => relative,
        (false, false) => format!("{}/{relative}", parent.nodeid),
    }
}
