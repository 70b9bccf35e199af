//! Command-line arguments and their mapping onto [`Options`].

use crate::basetemp::validate_basetemp;
use crate::config::Options;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Files or directories to collect tests from
    pub files: Vec<String>,

    /// Ignore a path during collection (may be repeated)
    #[arg(long, value_name = "PATH")]
    pub ignore: Vec<PathBuf>,

    /// Ignore paths matching a glob during collection (may be repeated)
    #[arg(long = "ignore-glob", value_name = "PATTERN")]
    pub ignore_glob: Vec<String>,

    /// Deselect items by node id prefix (may be repeated)
    #[arg(long, value_name = "NODEID_PREFIX")]
    pub deselect: Vec<String>,

    /// Only collect tests, don't execute them
    #[arg(long = "collect-only")]
    pub collect_only: bool,

    /// Run tests even if there are collection errors
    #[arg(long = "continue-on-collection-errors")]
    pub continue_on_collection_errors: bool,

    /// Don't ignore virtual environment roots during collection
    #[arg(long = "collect-in-virtualenv")]
    pub collect_in_virtualenv: bool,

    /// Exit instantly on the first error or failed test
    #[arg(short = 'x', long)]
    pub exitfirst: bool,

    /// Exit after the first N failures or errors
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub maxfail: usize,

    /// Base temporary directory for this run, wiped before use
    #[arg(long, value_name = "DIR", value_parser = validate_basetemp)]
    pub basetemp: Option<String>,

    /// Directory to use as the rootdir
    #[arg(long, value_name = "DIR")]
    pub rootdir: Option<PathBuf>,

    /// Command used to run each test file (e.g., 'bash -e')
    #[arg(long, value_name = "COMMAND")]
    pub runner: Option<String>,

    /// Environment variables to set for tests (e.g., 'KEY=VALUE')
    #[arg(long, short)]
    pub env: Vec<String>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl From<Args> for Options {
    fn from(args: Args) -> Self {
        Options {
            args: args.files,
            ignore: args.ignore,
            ignore_glob: args.ignore_glob,
            deselect: args.deselect,
            collectonly: args.collect_only,
            continue_on_collection_errors: args.continue_on_collection_errors,
            collect_in_virtualenv: args.collect_in_virtualenv,
            maxfail: if args.exitfirst { 1 } else { args.maxfail },
            basetemp: args.basetemp,
            rootdir: args.rootdir,
            runner: args.runner,
            env: args.env,
            verbose: args.verbose,
        }
    }
}
