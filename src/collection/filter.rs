//! Deciding which paths take part in collection.

use crate::config::{Config, PathList};
use crate::pathutil::absolutepath;
use glob::Pattern;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, MAIN_SEPARATOR};

use super::error::CollectionResult;

/// Bytecode cache directories never hold tests.
pub const BYTECODE_CACHE_DIR: &str = "__pycache__";

/// `Some(true)` when `collection_path` must not be collected, `None` when
/// this filter has no opinion. Checks run in a fixed order and the first
/// match wins.
pub fn ignore_collect(collection_path: &Path, config: &Config) -> CollectionResult<Option<bool>> {
    if collection_path.file_name() == Some(OsStr::new(BYTECODE_CACHE_DIR)) {
        return Ok(Some(true));
    }

    let parent = collection_path.parent().unwrap_or(collection_path);

    let mut ignore_paths = config
        .getconftest_pathlist(PathList::CollectIgnore, parent)?
        .unwrap_or_default();
    ignore_paths.extend(
        config
            .option
            .ignore
            .iter()
            .map(|path| absolutepath(config.invocation_dir(), path)),
    );
    if ignore_paths.iter().any(|path| path == collection_path) {
        return Ok(Some(true));
    }

    let mut ignore_globs = config
        .getconftest_pathlist(PathList::CollectIgnoreGlob, parent)?
        .unwrap_or_default();
    ignore_globs.extend(
        config
            .option
            .ignore_glob
            .iter()
            .map(|glob| absolutepath(config.invocation_dir(), glob)),
    );
    let path_str = collection_path.to_string_lossy();
    if ignore_globs
        .iter()
        .any(|glob| fnmatch(&path_str, &glob.to_string_lossy()))
    {
        return Ok(Some(true));
    }

    if !config.option.collect_in_virtualenv && in_venv(collection_path) {
        return Ok(Some(true));
    }

    if collection_path.is_dir()
        && config
            .ini()
            .norecursedirs
            .iter()
            .any(|pattern| fnmatch_ex(pattern, collection_path))
    {
        return Ok(Some(true));
    }

    Ok(None)
}

/// Whether `path` is the root of a virtual environment.
pub fn in_venv(path: &Path) -> bool {
    is_file(&path.join("pyvenv.cfg")) || is_file(&path.join("conda-meta").join("history"))
}

fn is_file(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file(),
        Err(err) => {
            log::trace!("{}: {err}", path.display());
            false
        }
    }
}

/// Shell-style match where `*` also matches path separators.
///
/// An invalid pattern only matches itself literally.
pub fn fnmatch(name: &str, pattern: &str) -> bool {
    match Pattern::new(pattern) {
        Ok(compiled) => compiled.matches(name),
        Err(_) => name == pattern,
    }
}

/// Match `pattern` against `path`.
///
/// Patterns without a path separator match the final component only.
/// Otherwise the full path is matched, and a relative pattern may match
/// anywhere below the root of an absolute path.
pub fn fnmatch_ex(pattern: &str, path: &Path) -> bool {
    let mut pattern = pattern.to_string();
    if cfg!(windows) && !pattern.contains(MAIN_SEPARATOR) && pattern.contains('/') {
        pattern = pattern.replace('/', &MAIN_SEPARATOR.to_string());
    }

    if !pattern.contains(MAIN_SEPARATOR) {
        let name = path.file_name().map(OsStr::to_string_lossy).unwrap_or_default();
        return fnmatch(&name, &pattern);
    }

    if path.is_absolute() && !Path::new(&pattern).is_absolute() {
        pattern = format!("*{MAIN_SEPARATOR}{pattern}");
    }
    fnmatch(&path.to_string_lossy(), &pattern)
}
