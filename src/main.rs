//! Main entry point for the rtest-session binary.

use clap::error::ErrorKind;
use clap::Parser;
use rtest_session::builtin::default_plugin_manager;
use rtest_session::cli::Args;
use rtest_session::config::{Config, Options};
use rtest_session::exit_code::ExitCode;
use rtest_session::logging;
use rtest_session::wrap::cmdline_main;
use std::env;
use std::process;
use std::rc::Rc;

fn main() {
    logging::init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            process::exit(ExitCode::UsageError as i32);
        }
    };

    let invocation_dir = match env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("ERROR: cannot determine the current directory: {e}");
            process::exit(ExitCode::UsageError as i32);
        }
    };

    let config = match Config::new(Options::from(args), default_plugin_manager(), invocation_dir) {
        Ok(config) => Rc::new(config),
        Err(e) => {
            eprintln!("ERROR: {e}");
            process::exit(ExitCode::UsageError as i32);
        }
    };

    match cmdline_main(&config) {
        Ok(status) => process::exit(status.code()),
        Err(e) => {
            eprintln!("ERROR: {e}");
            process::exit(ExitCode::UsageError as i32);
        }
    }
}
